// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The boundary with the host's intersection-observation primitive.
//!
//! The core never computes intersections. A [`SignalSource`] does, and it
//! reports each crossing of a requested threshold as a
//! [`Signal`](crate::types::Signal): rising crossings as
//! [`Appeared`](crate::types::SignalKind::Appeared), full disappearance as
//! [`Disappeared`](crate::types::SignalKind::Disappeared) with ratio `0`.
//! Coalescing rapid changes is the source's job.
//!
//! Implementations wrap whatever the host offers: a browser
//! `IntersectionObserver`, a compositor callback, or the headless
//! [`RectSource`](crate::adapters::rect::RectSource).

use crate::error::SetupError;
use crate::types::SubscriptionId;

/// Parameters for one subscription.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubscribeRequest<'a> {
    /// How to find the element in the rendered tree; opaque to the core.
    pub locator: &'a str,
    /// Bounding-box margin, passed through verbatim (see [`crate::margin`]).
    pub margin: &'a str,
    /// Ratios at which crossings must be reported.
    pub thresholds: &'a [f64],
}

/// A host-provided intersection-observation primitive.
pub trait SignalSource {
    /// Begin observing the element named by `request.locator`.
    ///
    /// Returns [`SetupError::ElementNotFound`] when the element is not
    /// present, for example because it was unmounted before setup ran.
    fn subscribe(&mut self, request: &SubscribeRequest<'_>) -> Result<SubscriptionId, SetupError>;

    /// Stop observing. Must be safe to call for an already stopped or unknown handle.
    fn unsubscribe(&mut self, subscription: SubscriptionId);
}

impl<S: SignalSource + ?Sized> SignalSource for &mut S {
    fn subscribe(&mut self, request: &SubscribeRequest<'_>) -> Result<SubscriptionId, SetupError> {
        (**self).subscribe(request)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        (**self).unsubscribe(subscription);
    }
}
