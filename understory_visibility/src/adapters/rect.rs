// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless signal source over Kurbo rectangles.
//!
//! ## Feature
//!
//! Enable with `rect_source` (on by default).
//!
//! ## Notes
//!
//! [`RectSource`] does no layout. The host supplies world-space rectangles
//! for the viewport and for each element (for example from a box tree after
//! commit). [`RectSource::poll`] then reports crossings the way a browser
//! `IntersectionObserver` does:
//!
//! - The first poll after subscribing reports the current state.
//! - Later polls report a subscription only when its intersecting state or
//!   the number of crossed thresholds changed.
//! - An intersecting element reports `Appeared` with its ratio. Otherwise
//!   it reports `Disappeared` with ratio `0`.
//! - Edge-adjacent rectangles count as intersecting. A zero-area element
//!   inside the root has ratio `1`.
//!
//! ```
//! use kurbo::{Rect, Vec2};
//! use understory_visibility::adapters::rect::RectSource;
//! use understory_visibility::observer::{Observer, ObserverOptions};
//!
//! let mut source = RectSource::new(Rect::new(0.0, 0.0, 100.0, 100.0));
//! source.set_element("#footer", Rect::new(0.0, 150.0, 100.0, 200.0));
//!
//! let mut footer: Observer = Observer::new(ObserverOptions::default());
//! assert!(footer.start_observing("#footer", &mut source));
//!
//! // Initial state: below the fold.
//! for s in source.poll() {
//!     footer.handle_signal(&s);
//! }
//! assert!(!footer.is_visible());
//!
//! // Scroll halfway into the footer.
//! source.scroll_by(Vec2::new(0.0, 75.0));
//! for s in source.poll() {
//!     footer.handle_signal(&s);
//! }
//! assert!(footer.is_visible());
//! assert_eq!(footer.current_threshold(), 0.5);
//! ```

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::{Insets, Rect, Vec2};

use crate::error::SetupError;
use crate::margin::Margin;
use crate::source::{SignalSource, SubscribeRequest};
use crate::types::{Signal, SignalKind, SubscriptionId, clamp_ratio};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Observed {
    intersecting: bool,
    crossed: usize,
}

#[derive(Clone, Debug)]
struct Subscription {
    id: SubscriptionId,
    locator: String,
    margin: Margin,
    thresholds: Vec<f64>,
    last: Option<Observed>,
}

/// A [`SignalSource`] driven by host-supplied rectangles.
#[derive(Clone, Debug)]
pub struct RectSource {
    viewport: Rect,
    elements: BTreeMap<String, Rect>,
    subscriptions: Vec<Subscription>,
    next_id: u32,
}

impl RectSource {
    /// Create a source with the given viewport and no elements.
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            elements: BTreeMap::new(),
            subscriptions: Vec::new(),
            next_id: 0,
        }
    }

    /// Current viewport.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Replace the viewport.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Move the viewport by `delta`.
    pub fn scroll_by(&mut self, delta: Vec2) {
        self.viewport = self.viewport + delta;
    }

    /// Insert or move an element.
    pub fn set_element(&mut self, locator: impl Into<String>, rect: Rect) {
        self.elements.insert(locator.into(), rect);
    }

    /// Remove an element; subscriptions to it report as not intersecting.
    pub fn remove_element(&mut self, locator: &str) -> Option<Rect> {
        self.elements.remove(locator)
    }

    /// Whether `subscription` is live.
    pub fn is_subscribed(&self, subscription: SubscriptionId) -> bool {
        self.subscriptions.iter().any(|s| s.id == subscription)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Intersection state of `locator` against the viewport expanded by `margin`.
    ///
    /// Returns `(intersecting, ratio)`; a missing element is `(false, 0.0)`.
    pub fn measure(&self, locator: &str, margin: &Margin) -> (bool, f64) {
        let Some(element) = self.elements.get(locator) else {
            return (false, 0.0);
        };
        let (top, right, bottom, left) =
            margin.resolve(self.viewport.width(), self.viewport.height());
        let root = self.viewport + Insets::new(left, top, right, bottom);
        intersection(element.abs(), root)
    }

    /// Compute the current state of every subscription and report changes.
    pub fn poll(&mut self) -> Vec<Signal> {
        let mut out = Vec::new();
        for i in 0..self.subscriptions.len() {
            let (intersecting, ratio) = {
                let s = &self.subscriptions[i];
                self.measure(&s.locator, &s.margin)
            };
            let s = &mut self.subscriptions[i];
            let now = Observed {
                intersecting,
                crossed: s.thresholds.iter().filter(|t| ratio >= **t).count(),
            };
            if s.last == Some(now) {
                continue;
            }
            s.last = Some(now);
            out.push(if intersecting {
                Signal {
                    subscription: s.id,
                    kind: SignalKind::Appeared,
                    ratio,
                }
            } else {
                Signal {
                    subscription: s.id,
                    kind: SignalKind::Disappeared,
                    ratio: 0.0,
                }
            });
        }
        out
    }
}

fn intersection(element: Rect, root: Rect) -> (bool, f64) {
    let x0 = element.x0.max(root.x0);
    let y0 = element.y0.max(root.y0);
    let x1 = element.x1.min(root.x1);
    let y1 = element.y1.min(root.y1);
    if x0 > x1 || y0 > y1 {
        return (false, 0.0);
    }
    let area = element.area();
    let ratio = if area > 0.0 {
        (x1 - x0) * (y1 - y0) / area
    } else {
        1.0
    };
    (true, clamp_ratio(ratio))
}

impl SignalSource for RectSource {
    fn subscribe(&mut self, request: &SubscribeRequest<'_>) -> Result<SubscriptionId, SetupError> {
        if !self.elements.contains_key(request.locator) {
            return Err(SetupError::ElementNotFound {
                locator: request.locator.to_string(),
            });
        }
        let margin = Margin::parse(request.margin).map_err(|source| SetupError::InvalidMargin {
            margin: request.margin.to_string(),
            source,
        })?;
        self.next_id = self.next_id.wrapping_add(1);
        let id = SubscriptionId::new(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            locator: request.locator.to_string(),
            margin,
            thresholds: request.thresholds.to_vec(),
            last: None,
        });
        Ok(id)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.retain(|s| s.id != subscription);
    }
}
