// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: identifiers, signals, state flags, and events.
//!
//! ## Overview
//!
//! These types describe what flows between a signal source, an
//! [`Observer`](crate::observer::Observer), and a
//! [`Comparator`](crate::comparator::Comparator).

use core::sync::atomic::{AtomicU32, Ordering};

/// Identifier for an [`Observer`](crate::observer::Observer).
///
/// Allocated once per observer from a process-wide counter and never reused
/// while the process runs. The [comparator](crate::comparator::Comparator)
/// compares winners by this identity, not by locator or data.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ObserverId(u32);

static NEXT_OBSERVER_ID: AtomicU32 = AtomicU32::new(1);

impl ObserverId {
    pub(crate) fn next() -> Self {
        Self(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, useful for logging.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Handle returned by a [`SignalSource`](crate::source::SignalSource) for one subscription.
///
/// Sources mint these however they like; the core only stores and compares them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    /// Wrap a source-specific handle value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Direction of an intersection change reported by a signal source.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalKind {
    /// The element intersects the (margin-adjusted) viewport.
    Appeared,
    /// The element no longer intersects; the ratio is `0` by convention.
    Disappeared,
}

/// A single notification pushed by a signal source.
///
/// Route it to the owning observer with
/// [`Observer::handle_signal`](crate::observer::Observer::handle_signal).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Signal {
    /// Subscription the signal belongs to.
    pub subscription: SubscriptionId,
    /// Appeared or disappeared.
    pub kind: SignalKind,
    /// Intersection ratio in `[0, 1]`.
    pub ratio: f64,
}

bitflags::bitflags! {
    /// Visibility state of an observer.
    ///
    /// `HAS_APPEARED` and `IS_OR_WAS_VISIBLE` are monotonic: once set they are
    /// never cleared for the lifetime of the observer.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VisibilityFlags: u8 {
        /// The element currently satisfies the visibility predicate.
        const VISIBLE           = 0b0000_0001;
        /// The element has appeared at least once.
        const HAS_APPEARED      = 0b0000_0010;
        /// Set together with the first appearance.
        const IS_OR_WAS_VISIBLE = 0b0000_0100;
    }
}

bitflags::bitflags! {
    /// Selects which [`ObserverEvent`]s a listener receives.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventKinds: u8 {
        /// [`ObserverEvent::Initialized`].
        const INITIALIZED       = 0b0000_0001;
        /// [`ObserverEvent::FirstAppeared`].
        const FIRST_APPEARED    = 0b0000_0010;
        /// [`ObserverEvent::Appeared`].
        const APPEARED          = 0b0000_0100;
        /// [`ObserverEvent::Disappeared`].
        const DISAPPEARED       = 0b0000_1000;
        /// [`ObserverEvent::ThresholdReached`].
        const THRESHOLD_REACHED = 0b0001_0000;
    }
}

impl Default for EventKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// Events fired by an [`Observer`](crate::observer::Observer).
///
/// For an appearance the order is `FirstAppeared` (only the first time),
/// `Appeared`, then `ThresholdReached`. For a disappearance it is
/// `Disappeared`, then `ThresholdReached`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ObserverEvent {
    /// Observation has started with the signal source.
    Initialized,
    /// The element appeared for the first time. Fires at most once.
    FirstAppeared,
    /// The element appeared.
    Appeared,
    /// The element disappeared.
    Disappeared,
    /// A new intersection ratio was recorded.
    ThresholdReached(f64),
}

impl ObserverEvent {
    /// The [`EventKinds`] bit matching this event.
    pub const fn kind(&self) -> EventKinds {
        match self {
            Self::Initialized => EventKinds::INITIALIZED,
            Self::FirstAppeared => EventKinds::FIRST_APPEARED,
            Self::Appeared => EventKinds::APPEARED,
            Self::Disappeared => EventKinds::DISAPPEARED,
            Self::ThresholdReached(_) => EventKinds::THRESHOLD_REACHED,
        }
    }
}

/// A registered observer as seen by a [`Comparator`](crate::comparator::Comparator).
#[derive(Clone, Debug, PartialEq)]
pub struct Member<D = ()> {
    /// Observer identity.
    pub id: ObserverId,
    /// Last threshold the observer notified.
    pub threshold: f64,
    /// Opaque identification tag copied from the observer.
    pub data: D,
}

/// Events fired by a [`Comparator`](crate::comparator::Comparator).
#[derive(Clone, Debug, PartialEq)]
pub enum ComparatorEvent<D = ()> {
    /// Some member reported a threshold. Fires on every notification.
    ThresholdsReached,
    /// The most visible member changed; `None` when the registry is empty.
    MostVisibleChanged(Option<Member<D>>),
}

/// Clamp a reported ratio into `[0, 1]`, mapping NaN to `0`.
pub(crate) fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_ids_are_unique() {
        let a = ObserverId::next();
        let b = ObserverId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn event_kind_bits_match() {
        assert_eq!(ObserverEvent::Appeared.kind(), EventKinds::APPEARED);
        assert_eq!(
            ObserverEvent::ThresholdReached(0.4).kind(),
            EventKinds::THRESHOLD_REACHED
        );
        assert!(EventKinds::default().contains(EventKinds::INITIALIZED));
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(clamp_ratio(f64::NAN), 0.0);
        assert_eq!(clamp_ratio(-0.5), 0.0);
        assert_eq!(clamp_ratio(1.5), 1.0);
        assert_eq!(clamp_ratio(0.25), 0.25);
    }

    #[test]
    fn default_flags_are_empty() {
        let flags = VisibilityFlags::default();
        assert!(!flags.contains(VisibilityFlags::VISIBLE));
        assert!(!flags.contains(VisibilityFlags::HAS_APPEARED));
    }
}
