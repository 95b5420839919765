// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding-box margin: the CSS `rootMargin` shorthand.
//!
//! Observers pass the margin string through to their signal source
//! untouched. Sources that compute intersections themselves (such as
//! [`RectSource`](crate::adapters::rect::RectSource)) parse it with
//! [`Margin::parse`].
//!
//! Accepted syntax is one to four whitespace-separated lengths, each
//! `<number>px`, `<number>%`, or a bare `0`. They expand like CSS margins:
//! `a` → all sides, `a b` → vertical and horizontal, `a b c` → top,
//! horizontal, bottom, and `a b c d` → top, right, bottom, left.
//! Positive values grow the detection region, negative values shrink it.
//! Non-finite numbers (`NaN`, `inf`) are rejected.
//!
//! ```
//! use understory_visibility::margin::{Length, Margin};
//!
//! let m = Margin::parse("10px 5%").unwrap();
//! assert_eq!(m.top, Length::Px(10.0));
//! assert_eq!(m.left, Length::Percent(5.0));
//! assert_eq!(m.resolve(200.0, 100.0), (10.0, 10.0, 10.0, 10.0));
//! ```

use alloc::string::ToString;
use alloc::vec::Vec;

use crate::error::MarginError;

/// Default margin used by observers.
pub const DEFAULT_MARGIN: &str = "0px";

/// One side of a margin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Length {
    /// Absolute length in pixels.
    Px(f64),
    /// Percentage of the root's width (left/right) or height (top/bottom).
    Percent(f64),
}

impl Length {
    fn parse(token: &str) -> Result<Self, MarginError> {
        let invalid = || MarginError::InvalidLength(token.to_string());
        let finite = |number: &str| match number.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid()),
        };
        if let Some(number) = token.strip_suffix("px") {
            finite(number).map(Self::Px)
        } else if let Some(number) = token.strip_suffix('%') {
            finite(number).map(Self::Percent)
        } else {
            match token.parse::<f64>() {
                Ok(v) if v == 0.0 => Ok(Self::Px(0.0)),
                _ => Err(invalid()),
            }
        }
    }

    /// Resolve to pixels against the root extent along this side's axis.
    pub fn to_px(self, extent: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => extent * p / 100.0,
        }
    }
}

/// A parsed four-sided margin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Margin {
    /// Top side.
    pub top: Length,
    /// Right side.
    pub right: Length,
    /// Bottom side.
    pub bottom: Length,
    /// Left side.
    pub left: Length,
}

impl Default for Margin {
    fn default() -> Self {
        Self::uniform(Length::Px(0.0))
    }
}

impl Margin {
    /// The same length on every side.
    pub const fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Parse a `rootMargin`-style shorthand. An empty or blank string is a zero margin.
    pub fn parse(s: &str) -> Result<Self, MarginError> {
        let values = s
            .split_whitespace()
            .map(Length::parse)
            .collect::<Result<Vec<_>, _>>()?;
        match values[..] {
            [] => Ok(Self::default()),
            [a] => Ok(Self::uniform(a)),
            [v, h] => Ok(Self {
                top: v,
                right: h,
                bottom: v,
                left: h,
            }),
            [t, h, b] => Ok(Self {
                top: t,
                right: h,
                bottom: b,
                left: h,
            }),
            [t, r, b, l] => Ok(Self {
                top: t,
                right: r,
                bottom: b,
                left: l,
            }),
            _ => Err(MarginError::TooManyValues(values.len())),
        }
    }

    /// Resolve to pixel amounts `(top, right, bottom, left)` for a root of the given size.
    pub fn resolve(&self, width: f64, height: f64) -> (f64, f64, f64, f64) {
        (
            self.top.to_px(height),
            self.right.to_px(width),
            self.bottom.to_px(height),
            self.left.to_px(width),
        )
    }
}
