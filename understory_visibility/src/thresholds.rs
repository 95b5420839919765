// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Threshold lists: which intersection ratios a signal source reports.
//!
//! ## Derivation
//!
//! - [`Thresholds::Explicit`] is used verbatim. Keeping it ascending and in
//!   `[0, 1]` is up to the caller.
//! - [`Thresholds::Interval`] generates `0, step, 2·step, …` for every value
//!   that is `≤ 1`. Values are produced by integer step counting so the final
//!   boundary is never skipped to floating-point drift: when `1 / step` is
//!   (within epsilon of) an integer `k`, the `i`-th value is `i / k` and the
//!   last one is exactly `1.0`.
//! - At most [`MAX_GENERATED_THRESHOLDS`] values are generated. A smaller
//!   step is widened to `1 / (MAX_GENERATED_THRESHOLDS - 1)`, so the list
//!   still ends at `1.0`.
//!
//! ```
//! use understory_visibility::thresholds::Thresholds;
//!
//! let t = Thresholds::default().resolve();
//! assert_eq!(t.len(), 11);
//! assert_eq!(t[0], 0.0);
//! assert_eq!(t[3], 0.3);
//! assert_eq!(t[10], 1.0);
//!
//! let quarters = Thresholds::Interval(0.25).resolve();
//! assert_eq!(quarters, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
//! ```

use alloc::vec;
use alloc::vec::Vec;

/// Default step between generated thresholds (every 10%).
pub const DEFAULT_THRESHOLD_INTERVAL: f64 = 0.1;

/// Upper bound on generated values; a tiny step cannot allocate without limit.
pub const MAX_GENERATED_THRESHOLDS: usize = 10_001;

const EPSILON: f64 = 1e-9;

/// Threshold configuration for an observer.
#[derive(Clone, Debug, PartialEq)]
pub enum Thresholds {
    /// Generate thresholds every `step`, starting at `0`.
    Interval(f64),
    /// Use this list as is.
    Explicit(Vec<f64>),
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::Interval(DEFAULT_THRESHOLD_INTERVAL)
    }
}

impl From<Vec<f64>> for Thresholds {
    fn from(list: Vec<f64>) -> Self {
        Self::Explicit(list)
    }
}

impl Thresholds {
    /// Produce the concrete threshold list.
    ///
    /// A non-finite or non-positive interval yields `[0.0]`, which still
    /// reports every appear/disappear transition.
    pub fn resolve(&self) -> Vec<f64> {
        match self {
            Self::Explicit(list) => list.clone(),
            Self::Interval(step) => interval(*step),
        }
    }
}

fn near(a: f64, b: f64) -> bool {
    a - b < EPSILON && b - a < EPSILON
}

fn interval(step: f64) -> Vec<f64> {
    if !step.is_finite() || step <= 0.0 {
        return vec![0.0];
    }

    // Count whole steps that fit in [0, 1], tolerating drift at the boundary.
    let mut steps: usize = 0;
    while steps + 1 < MAX_GENERATED_THRESHOLDS && (steps + 1) as f64 * step <= 1.0 + EPSILON {
        steps += 1;
    }

    // The cap cut the list short of 1: widen the step to 1 / (cap - 1).
    let capped =
        steps + 1 == MAX_GENERATED_THRESHOLDS && (steps + 1) as f64 * step <= 1.0 + EPSILON;
    let per_unit = 1.0 / step;
    let exact = capped || (steps > 0 && near(per_unit, steps as f64));

    let mut out = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let value = if exact {
            i as f64 / steps as f64
        } else {
            i as f64 * step
        };
        out.push(value.min(1.0));
    }
    out
}
