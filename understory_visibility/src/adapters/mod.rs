// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signal sources for hosts without a native intersection observer.
//!
//! Enabled via feature flags to keep the core small and `no_std` by default.

#[cfg(feature = "rect_source")]
pub mod rect;
