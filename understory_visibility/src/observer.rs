// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer: visibility state of a single element.
//!
//! ## Usage
//!
//! 1) Create an [`Observer`] with [`ObserverOptions`] and register callbacks.
//! 2) Once the element exists in the rendered output, call
//!    [`Observer::start_observing`] (or the asynchronous pair
//!    [`Observer::begin_observing`] / [`Observer::complete_observing`]).
//! 3) Route every [`Signal`] from the source to [`Observer::handle_signal`].
//! 4) Call [`Observer::dispose`] (or [`Observer::dispose_in`]) when the
//!    element unmounts.
//!
//! ## Event order
//!
//! For an appearance: `FirstAppeared` (first time only), `Appeared`,
//! `ThresholdReached(ratio)`, then the attached comparator is notified.
//! For a disappearance: `Disappeared`, `ThresholdReached(ratio)`, then the
//! comparator.
//!
//! ## Failure policy
//!
//! Nothing here returns an error to the caller. A missing element at setup
//! leaves the observer inert. Failing callbacks are dropped without
//! interrupting the rest of the event sequence. Signals that arrive after
//! disposal are ignored.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_visibility::observer::{Observer, ObserverOptions};
//! use understory_visibility::types::SignalKind;
//!
//! let firsts = Rc::new(Cell::new(0));
//! let mut obs: Observer = Observer::new(ObserverOptions::default());
//! let f = firsts.clone();
//! obs.on_first_appeared(move || {
//!     f.set(f.get() + 1);
//!     Ok(())
//! });
//!
//! obs.on_signal(SignalKind::Appeared, 0.3);
//! obs.on_signal(SignalKind::Appeared, 0.7);
//! assert!(obs.is_visible() && obs.has_appeared());
//! assert_eq!(obs.current_threshold(), 0.7);
//! assert_eq!(firsts.get(), 1);
//! ```

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::comparator::{Comparator, SharedComparator};
use crate::error::{CallbackResult, SetupError};
use crate::listeners::Listeners;
use crate::margin::DEFAULT_MARGIN;
use crate::source::{SignalSource, SubscribeRequest};
use crate::thresholds::Thresholds;
use crate::trace;
use crate::types::{
    EventKinds, ObserverEvent, ObserverId, Signal, SignalKind, SubscriptionId, VisibilityFlags,
    clamp_ratio,
};

/// Configuration for an [`Observer`].
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions<D = ()> {
    /// Margin applied to the detection region, passed to the source verbatim.
    /// Defaults to `"0px"`.
    pub bounding_box_margin: String,
    /// Ratios to report. Defaults to every 10%.
    pub thresholds: Thresholds,
    /// Opaque identification tag, copied into any comparator the observer joins.
    pub data: D,
}

impl<D: Default> Default for ObserverOptions<D> {
    fn default() -> Self {
        Self::with_data(D::default())
    }
}

impl<D> ObserverOptions<D> {
    /// Default margin and thresholds with the given data tag.
    pub fn with_data(data: D) -> Self {
        Self {
            bounding_box_margin: String::from(DEFAULT_MARGIN),
            thresholds: Thresholds::default(),
            data,
        }
    }

    /// Replace the bounding-box margin.
    #[must_use]
    pub fn with_margin(mut self, margin: impl Into<String>) -> Self {
        self.bounding_box_margin = margin.into();
        self
    }

    /// Replace the threshold configuration.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: impl Into<Thresholds>) -> Self {
        self.thresholds = thresholds.into();
        self
    }
}

/// Coarse lifecycle of an observer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Lifecycle {
    /// Not observing; either never started or setup failed.
    Idle,
    /// Setup handed to the source and not yet completed.
    Pending,
    /// Subscribed with the source.
    Observing,
    /// Disposed; terminal.
    Disposed,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Pending(u32),
    Observing(SubscriptionId),
    Disposed,
}

/// An in-flight setup, produced by [`Observer::begin_observing`].
///
/// Hand [`request`](Self::request) to the source, then pass the ticket and
/// the source's answer to [`Observer::complete_observing`].
#[derive(Debug)]
pub struct SetupTicket {
    observer: ObserverId,
    serial: u32,
    locator: String,
    margin: String,
    thresholds: Vec<f64>,
}

impl SetupTicket {
    /// The observer that issued this ticket.
    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    /// The subscription parameters to send to the source.
    pub fn request(&self) -> SubscribeRequest<'_> {
        SubscribeRequest {
            locator: &self.locator,
            margin: &self.margin,
            thresholds: &self.thresholds,
        }
    }
}

/// Result of [`Observer::complete_observing`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SetupOutcome {
    /// The observer now owns this subscription.
    Observing(SubscriptionId),
    /// Setup failed or the ticket was not the one in flight; nothing changed.
    Ignored,
    /// The observer was disposed (or the ticket superseded) while the setup
    /// was in flight. The caller must unsubscribe this handle.
    Stale(SubscriptionId),
}

/// Tracks the visibility of one element and fans out events.
///
/// Dropping an observer leaves its comparator but cannot reach the signal
/// source, so a live subscription stays registered there. Release it with
/// [`dispose_in`](Self::dispose_in), or [`dispose`](Self::dispose) and
/// unsubscribe the returned handle, before dropping. A drop while still
/// observing is logged as `visibility.dropped_while_observing`.
pub struct Observer<D = ()> {
    id: ObserverId,
    margin: String,
    thresholds: Vec<f64>,
    data: D,
    flags: VisibilityFlags,
    current_threshold: f64,
    phase: Phase,
    setup_attempted: bool,
    next_serial: u32,
    locator: Option<String>,
    listeners: Listeners<ObserverEvent>,
    comparator: Option<Weak<RefCell<Comparator<D>>>>,
}

impl<D: core::fmt::Debug> core::fmt::Debug for Observer<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("locator", &self.locator)
            .field("data", &self.data)
            .field("flags", &self.flags)
            .field("current_threshold", &self.current_threshold)
            .field("phase", &self.phase)
            .field("listeners", &self.listeners.len())
            .field("attached", &self.comparator.is_some())
            .finish_non_exhaustive()
    }
}

impl<D> Observer<D> {
    /// Identity used by comparators.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Locator of the observed element, once observation has started.
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// The bounding-box margin string.
    pub fn bounding_box_margin(&self) -> &str {
        &self.margin
    }

    /// The resolved threshold list.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// The identification tag.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// All visibility flags at once.
    pub fn flags(&self) -> VisibilityFlags {
        self.flags
    }

    /// Whether the element is currently visible.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(VisibilityFlags::VISIBLE)
    }

    /// Whether the element has appeared at least once.
    pub fn has_appeared(&self) -> bool {
        self.flags.contains(VisibilityFlags::HAS_APPEARED)
    }

    /// Whether the element is, or at some point was, visible.
    pub fn is_or_was_visible(&self) -> bool {
        self.flags.contains(VisibilityFlags::IS_OR_WAS_VISIBLE)
    }

    /// Ratio of the most recently processed signal; `0` before any signal.
    pub fn current_threshold(&self) -> f64 {
        self.current_threshold
    }

    /// Coarse lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        match self.phase {
            Phase::Idle => Lifecycle::Idle,
            Phase::Pending(_) => Lifecycle::Pending,
            Phase::Observing(_) => Lifecycle::Observing,
            Phase::Disposed => Lifecycle::Disposed,
        }
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.phase == Phase::Disposed
    }

    /// The live subscription, if observing.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        match self.phase {
            Phase::Observing(s) => Some(s),
            _ => None,
        }
    }

    /// The attached comparator, if any and still alive.
    pub fn comparator(&self) -> Option<SharedComparator<D>> {
        self.comparator.as_ref().and_then(Weak::upgrade)
    }

    /// Deregister from the attached comparator, if any. Returns whether a
    /// registration was removed.
    pub fn detach(&mut self) -> bool {
        let Some(shared) = self.comparator.take().and_then(|w| w.upgrade()) else {
            return false;
        };
        match shared.try_borrow_mut() {
            Ok(mut c) => c.deregister(self.id),
            Err(_) => {
                trace::comparator_busy(self.id);
                false
            }
        }
    }
}

impl<D: Clone + 'static> Observer<D> {
    /// Create an idle observer.
    pub fn new(options: ObserverOptions<D>) -> Self {
        Self {
            id: ObserverId::next(),
            thresholds: options.thresholds.resolve(),
            margin: options.bounding_box_margin,
            data: options.data,
            flags: VisibilityFlags::empty(),
            current_threshold: 0.0,
            phase: Phase::Idle,
            setup_attempted: false,
            next_serial: 0,
            locator: None,
            listeners: Listeners::new("observer"),
            comparator: None,
        }
    }

    /// Call `f` every time the element appears.
    pub fn on_appeared(&mut self, mut f: impl FnMut() -> CallbackResult + 'static) {
        self.listen(EventKinds::APPEARED, move |_| f());
    }

    /// Call `f` every time the element fully disappears.
    pub fn on_disappeared(&mut self, mut f: impl FnMut() -> CallbackResult + 'static) {
        self.listen(EventKinds::DISAPPEARED, move |_| f());
    }

    /// Call `f` the first time the element appears.
    pub fn on_first_appeared(&mut self, mut f: impl FnMut() -> CallbackResult + 'static) {
        self.listen(EventKinds::FIRST_APPEARED, move |_| f());
    }

    /// Call `f` once observation has started.
    pub fn on_initialized(&mut self, mut f: impl FnMut() -> CallbackResult + 'static) {
        self.listen(EventKinds::INITIALIZED, move |_| f());
    }

    /// Call `f` with each newly recorded ratio.
    pub fn on_threshold_reached(&mut self, mut f: impl FnMut(f64) -> CallbackResult + 'static) {
        self.listen(EventKinds::THRESHOLD_REACHED, move |e| match e {
            ObserverEvent::ThresholdReached(ratio) => f(*ratio),
            _ => Ok(()),
        });
    }

    /// Call `f` for every event whose kind is in `kinds`.
    pub fn listen(
        &mut self,
        kinds: EventKinds,
        mut f: impl FnMut(&ObserverEvent) -> CallbackResult + 'static,
    ) {
        self.listeners.push(move |e: &ObserverEvent| {
            if kinds.contains(e.kind()) {
                f(e)
            } else {
                Ok(())
            }
        });
    }

    /// Join `comparator`, leaving any previous one first.
    ///
    /// Registers with the current threshold and a clone of the data tag.
    /// Returns `false` when disposed, already attached to this comparator,
    /// or when the caller holds a borrow of the comparator.
    pub fn attach(&mut self, comparator: &SharedComparator<D>) -> bool {
        if self.is_disposed() {
            return false;
        }
        if let Some(current) = self.comparator()
            && Rc::ptr_eq(&current, comparator)
        {
            return false;
        }
        self.detach();
        match comparator.try_borrow_mut() {
            Ok(mut c) => {
                c.register(self.id, self.current_threshold, self.data.clone());
            }
            Err(_) => {
                trace::comparator_busy(self.id);
                return false;
            }
        }
        self.comparator = Some(Rc::downgrade(comparator));
        true
    }

    /// Start observing the element at `locator` with `source`.
    ///
    /// Runs at most once per observer: later calls, and calls after
    /// disposal, return `false` without touching the source. A failed
    /// subscribe (for example an element that was already torn down) is
    /// swallowed and leaves the observer idle.
    pub fn start_observing<S: SignalSource + ?Sized>(
        &mut self,
        locator: impl Into<String>,
        source: &mut S,
    ) -> bool {
        let Some(ticket) = self.begin_observing(locator) else {
            return false;
        };
        let result = source.subscribe(&ticket.request());
        match self.complete_observing(ticket, result) {
            SetupOutcome::Observing(_) => true,
            SetupOutcome::Stale(subscription) => {
                source.unsubscribe(subscription);
                false
            }
            SetupOutcome::Ignored => false,
        }
    }

    /// First half of an asynchronous setup.
    ///
    /// Returns `None` if setup was already attempted or the observer is disposed.
    pub fn begin_observing(&mut self, locator: impl Into<String>) -> Option<SetupTicket> {
        if self.setup_attempted || self.phase != Phase::Idle {
            return None;
        }
        self.setup_attempted = true;
        self.next_serial = self.next_serial.wrapping_add(1);
        self.phase = Phase::Pending(self.next_serial);
        Some(SetupTicket {
            observer: self.id,
            serial: self.next_serial,
            locator: locator.into(),
            margin: self.margin.clone(),
            thresholds: self.thresholds.clone(),
        })
    }

    /// Second half of an asynchronous setup.
    ///
    /// Checks that the observer is still waiting for this ticket before
    /// touching any state. On success fires
    /// [`Initialized`](ObserverEvent::Initialized).
    pub fn complete_observing(
        &mut self,
        ticket: SetupTicket,
        result: Result<SubscriptionId, SetupError>,
    ) -> SetupOutcome {
        let current = ticket.observer == self.id && self.phase == Phase::Pending(ticket.serial);
        match (current, result) {
            (true, Ok(subscription)) => {
                self.phase = Phase::Observing(subscription);
                self.locator = Some(ticket.locator);
                self.listeners.emit(&ObserverEvent::Initialized);
                SetupOutcome::Observing(subscription)
            }
            (true, Err(error)) => {
                trace::setup_ignored(self.id, &error);
                self.phase = Phase::Idle;
                SetupOutcome::Ignored
            }
            (false, Ok(subscription)) => {
                trace::setup_ignored(self.id, &SetupError::Disposed);
                SetupOutcome::Stale(subscription)
            }
            (false, Err(error)) => {
                trace::setup_ignored(self.id, &error);
                SetupOutcome::Ignored
            }
        }
    }

    /// Apply `signal` if it belongs to this observer's live subscription.
    ///
    /// Returns whether the signal was applied. Signals for other
    /// subscriptions, or arriving after disposal, are ignored.
    pub fn handle_signal(&mut self, signal: &Signal) -> bool {
        if self.subscription() != Some(signal.subscription) {
            trace::stale_signal(self.id, signal.subscription);
            return false;
        }
        self.on_signal(signal.kind, signal.ratio);
        true
    }

    /// Record an intersection change and fire events.
    ///
    /// `ratio` is clamped to `[0, 1]`; NaN counts as `0`. Ignored after disposal.
    pub fn on_signal(&mut self, kind: SignalKind, ratio: f64) {
        if self.is_disposed() {
            return;
        }
        let ratio = clamp_ratio(ratio);

        match kind {
            SignalKind::Appeared => {
                if !self.has_appeared() {
                    self.flags.insert(VisibilityFlags::IS_OR_WAS_VISIBLE);
                    self.listeners.emit(&ObserverEvent::FirstAppeared);
                }
                self.flags.insert(VisibilityFlags::VISIBLE | VisibilityFlags::HAS_APPEARED);
                self.listeners.emit(&ObserverEvent::Appeared);
            }
            SignalKind::Disappeared => {
                self.flags.remove(VisibilityFlags::VISIBLE);
                self.listeners.emit(&ObserverEvent::Disappeared);
            }
        }

        self.current_threshold = ratio;
        self.listeners.emit(&ObserverEvent::ThresholdReached(ratio));

        self.notify_comparator();
    }

    fn notify_comparator(&self) {
        if let Some(shared) = self.comparator() {
            Comparator::notify(&shared, self.id, self.current_threshold);
        }
    }

    /// Leave the comparator and stop reacting to signals. Idempotent.
    ///
    /// Returns the live subscription, which the caller should unsubscribe.
    pub fn dispose(&mut self) -> Option<SubscriptionId> {
        if self.is_disposed() {
            return None;
        }
        self.detach();
        let subscription = self.subscription();
        self.phase = Phase::Disposed;
        subscription
    }

    /// [`dispose`](Self::dispose) and unsubscribe from `source`.
    pub fn dispose_in<S: SignalSource + ?Sized>(&mut self, source: &mut S) {
        if let Some(subscription) = self.dispose() {
            source.unsubscribe(subscription);
        }
    }
}

impl<D> Drop for Observer<D> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription() {
            trace::dropped_while_observing(self.id, subscription);
        }
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::string::ToString;
    use alloc::vec;

    use crate::error::CallbackError;
    use crate::types::ComparatorEvent;

    #[derive(Default)]
    struct FakeSource {
        present: BTreeSet<String>,
        live: BTreeSet<u32>,
        next: u32,
        calls: u32,
    }

    impl FakeSource {
        fn with(locators: &[&str]) -> Self {
            Self {
                present: locators.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl SignalSource for FakeSource {
        fn subscribe(
            &mut self,
            request: &SubscribeRequest<'_>,
        ) -> Result<SubscriptionId, SetupError> {
            self.calls += 1;
            if !self.present.contains(request.locator) {
                return Err(SetupError::ElementNotFound {
                    locator: request.locator.to_string(),
                });
            }
            self.next += 1;
            self.live.insert(self.next);
            Ok(SubscriptionId::new(self.next))
        }

        fn unsubscribe(&mut self, subscription: SubscriptionId) {
            self.live.remove(&subscription.get());
        }
    }

    fn record(obs: &mut Observer<u8>) -> Rc<RefCell<Vec<ObserverEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        obs.listen(EventKinds::all(), move |e| {
            l.borrow_mut().push(*e);
            Ok(())
        });
        log
    }

    fn observer() -> Observer<u8> {
        Observer::new(ObserverOptions::default())
    }

    #[test]
    fn defaults() {
        let obs = observer();
        assert_eq!(obs.bounding_box_margin(), "0px");
        assert_eq!(obs.thresholds().len(), 11);
        assert_eq!(obs.lifecycle(), Lifecycle::Idle);
        assert_eq!(obs.current_threshold(), 0.0);
        assert!(!obs.is_visible() && !obs.has_appeared() && !obs.is_or_was_visible());
        assert!(obs.locator().is_none());
    }

    #[test]
    fn options_builders() {
        let obs: Observer<u8> = Observer::new(
            ObserverOptions::with_data(7)
                .with_margin("10px")
                .with_thresholds(vec![0.0, 1.0]),
        );
        assert_eq!(*obs.data(), 7);
        assert_eq!(obs.bounding_box_margin(), "10px");
        assert_eq!(obs.thresholds(), &[0.0, 1.0]);
    }

    // Appeared(0.3) then Appeared(0.7): first-appeared fires once, after the first signal.
    #[test]
    fn repeated_appearance_fires_first_once() {
        let mut obs = observer();
        let log = record(&mut obs);
        obs.on_signal(SignalKind::Appeared, 0.3);
        obs.on_signal(SignalKind::Appeared, 0.7);
        assert!(obs.has_appeared());
        assert!(obs.is_visible());
        assert!(obs.is_or_was_visible());
        assert_eq!(obs.current_threshold(), 0.7);
        assert_eq!(
            *log.borrow(),
            vec![
                ObserverEvent::FirstAppeared,
                ObserverEvent::Appeared,
                ObserverEvent::ThresholdReached(0.3),
                ObserverEvent::Appeared,
                ObserverEvent::ThresholdReached(0.7),
            ]
        );
    }

    // Disappeared(0.0) without a prior appearance.
    #[test]
    fn disappearance_before_appearance() {
        let mut obs = observer();
        let log = record(&mut obs);
        obs.on_signal(SignalKind::Disappeared, 0.0);
        assert!(!obs.is_visible());
        assert!(!obs.has_appeared());
        assert!(!obs.is_or_was_visible());
        assert_eq!(obs.current_threshold(), 0.0);
        assert_eq!(
            *log.borrow(),
            vec![
                ObserverEvent::Disappeared,
                ObserverEvent::ThresholdReached(0.0)
            ]
        );
    }

    #[test]
    fn appeared_flags_survive_disappearance() {
        let mut obs = observer();
        obs.on_signal(SignalKind::Appeared, 1.0);
        obs.on_signal(SignalKind::Disappeared, 0.0);
        assert!(!obs.is_visible());
        assert!(obs.has_appeared());
        assert!(obs.is_or_was_visible());
    }

    #[test]
    fn failing_callbacks_do_not_break_sequence() {
        let mut obs = observer();
        obs.on_appeared(|| Err(CallbackError::new("appeared handler failed")));
        obs.on_first_appeared(|| Err("first handler failed".into()));
        let ratios = Rc::new(RefCell::new(Vec::new()));
        let r = ratios.clone();
        obs.on_threshold_reached(move |ratio| {
            r.borrow_mut().push(ratio);
            Ok(())
        });
        obs.on_signal(SignalKind::Appeared, 0.5);
        assert_eq!(*ratios.borrow(), vec![0.5]);
        assert_eq!(obs.current_threshold(), 0.5);
        assert!(obs.is_visible());
    }

    #[test]
    fn ratio_is_clamped_before_recording() {
        let mut obs = observer();
        obs.on_signal(SignalKind::Appeared, 1.7);
        assert_eq!(obs.current_threshold(), 1.0);
        obs.on_signal(SignalKind::Disappeared, f64::NAN);
        assert_eq!(obs.current_threshold(), 0.0);
    }

    #[test]
    fn start_observing_is_idempotent() {
        let mut src = FakeSource::with(&["#a"]);
        let mut obs = observer();
        let log = record(&mut obs);
        assert!(obs.start_observing("#a", &mut src));
        assert_eq!(obs.lifecycle(), Lifecycle::Observing);
        assert_eq!(obs.locator(), Some("#a"));
        assert!(!obs.start_observing("#a", &mut src));
        assert_eq!(src.calls, 1);
        assert_eq!(*log.borrow(), vec![ObserverEvent::Initialized]);
    }

    #[test]
    fn missing_element_leaves_observer_inert() {
        let mut src = FakeSource::with(&[]);
        let mut obs = observer();
        let log = record(&mut obs);
        assert!(!obs.start_observing("#gone", &mut src));
        assert_eq!(obs.lifecycle(), Lifecycle::Idle);
        assert!(obs.subscription().is_none());
        assert!(log.borrow().is_empty());
        // Exactly one attempt.
        assert!(!obs.start_observing("#gone", &mut src));
        assert_eq!(src.calls, 1);
    }

    #[test]
    fn disposed_before_render_never_observes() {
        let mut src = FakeSource::with(&["#a"]);
        let mut obs = observer();
        assert_eq!(obs.dispose(), None);
        assert!(!obs.start_observing("#a", &mut src));
        assert_eq!(src.calls, 0);
    }

    #[test]
    fn dispose_during_async_setup_yields_stale() {
        let mut src = FakeSource::with(&["#a"]);
        let mut obs = observer();
        let log = record(&mut obs);
        let ticket = obs.begin_observing("#a").unwrap();
        assert_eq!(obs.lifecycle(), Lifecycle::Pending);
        assert!(obs.begin_observing("#a").is_none());

        let result = src.subscribe(&ticket.request());
        assert_eq!(obs.dispose(), None);
        let outcome = obs.complete_observing(ticket, result);
        let SetupOutcome::Stale(sub) = outcome else {
            panic!("expected stale outcome, got {outcome:?}");
        };
        src.unsubscribe(sub);
        assert!(src.live.is_empty());
        assert!(log.borrow().is_empty());
        assert_eq!(obs.lifecycle(), Lifecycle::Disposed);
    }

    #[test]
    fn foreign_ticket_is_rejected() {
        let mut a = observer();
        let mut b = observer();
        let ticket = a.begin_observing("#a").unwrap();
        let _ = b.begin_observing("#b").unwrap();
        let outcome = b.complete_observing(ticket, Ok(SubscriptionId::new(9)));
        assert_eq!(outcome, SetupOutcome::Stale(SubscriptionId::new(9)));
        assert_eq!(b.lifecycle(), Lifecycle::Pending);
    }

    #[test]
    fn handle_signal_routes_by_subscription() {
        let mut src = FakeSource::with(&["#a"]);
        let mut obs = observer();
        assert!(obs.start_observing("#a", &mut src));
        let sub = obs.subscription().unwrap();

        let other = Signal {
            subscription: SubscriptionId::new(sub.get() + 100),
            kind: SignalKind::Appeared,
            ratio: 1.0,
        };
        assert!(!obs.handle_signal(&other));
        assert!(!obs.has_appeared());

        let mine = Signal {
            subscription: sub,
            kind: SignalKind::Appeared,
            ratio: 0.4,
        };
        assert!(obs.handle_signal(&mine));
        assert_eq!(obs.current_threshold(), 0.4);

        obs.dispose_in(&mut src);
        assert!(src.live.is_empty());
        assert!(!obs.handle_signal(&mine));
        obs.on_signal(SignalKind::Disappeared, 0.0);
        assert!(obs.is_visible(), "disposed observer must not change state");
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut src = FakeSource::with(&["#a"]);
        let mut obs = observer();
        obs.start_observing("#a", &mut src);
        let first = obs.dispose();
        assert!(first.is_some());
        assert_eq!(obs.dispose(), None);
        assert_eq!(obs.lifecycle(), Lifecycle::Disposed);
    }

    #[test]
    fn notifies_attached_comparator() {
        let group: SharedComparator<u8> = Comparator::shared();
        let mut a: Observer<u8> = Observer::new(ObserverOptions::with_data(1));
        let mut b: Observer<u8> = Observer::new(ObserverOptions::with_data(2));
        assert!(a.attach(&group));
        assert!(!a.attach(&group));
        assert!(b.attach(&group));
        assert_eq!(group.borrow().len(), 2);

        a.on_signal(SignalKind::Appeared, 0.5);
        b.on_signal(SignalKind::Appeared, 0.8);
        assert_eq!(group.borrow().most_visible_id(), Some(b.id()));
        a.on_signal(SignalKind::Appeared, 0.9);
        assert_eq!(group.borrow().most_visible_id(), Some(a.id()));
    }

    #[test]
    fn dispose_and_drop_deregister() {
        let group: SharedComparator<u8> = Comparator::shared();
        let mut a = observer();
        a.attach(&group);
        {
            let mut b = observer();
            b.attach(&group);
            assert_eq!(group.borrow().len(), 2);
        }
        assert_eq!(group.borrow().len(), 1);
        a.dispose();
        assert!(group.borrow().is_empty());
        assert!(a.comparator().is_none());
        assert!(!a.attach(&group));
    }

    #[test]
    fn switching_comparators_moves_membership() {
        let first: SharedComparator<u8> = Comparator::shared();
        let second: SharedComparator<u8> = Comparator::shared();
        let mut a = observer();
        a.attach(&first);
        a.attach(&second);
        assert!(first.borrow().is_empty());
        assert!(second.borrow().contains(a.id()));
        assert!(a.detach());
        assert!(!a.detach());
    }

    #[test]
    fn dropped_comparator_is_tolerated() {
        let mut a = observer();
        {
            let group: SharedComparator<u8> = Comparator::shared();
            a.attach(&group);
        }
        a.on_signal(SignalKind::Appeared, 0.2);
        assert!(a.comparator().is_none());
        assert!(!a.detach());
    }

    // A comparator callback that drives another observer of the same comparator.
    #[test]
    fn nested_notification_reaches_comparator() {
        let group: SharedComparator<u8> = Comparator::shared();
        let inner = Rc::new(RefCell::new(observer()));
        inner.borrow_mut().attach(&group);
        let mut outer = observer();
        outer.attach(&group);

        let events = Rc::new(RefCell::new(0));
        let driven = Rc::new(RefCell::new(false));
        let (i, e, d) = (inner.clone(), events.clone(), driven.clone());
        group.borrow_mut().listen(move |ev| {
            if matches!(ev, ComparatorEvent::ThresholdsReached) {
                *e.borrow_mut() += 1;
                if !d.replace(true) {
                    i.borrow_mut().on_signal(SignalKind::Appeared, 1.0);
                }
            }
            Ok(())
        });

        outer.on_signal(SignalKind::Appeared, 0.5);
        let inner_id = inner.borrow().id();
        assert_eq!(*events.borrow(), 2);
        assert_eq!(group.borrow().most_visible_id(), Some(inner_id));
        let g = group.borrow();
        let member = g.members().iter().find(|m| m.id == inner_id);
        assert_eq!(member.map(|m| m.threshold), Some(1.0));
    }

    #[test]
    fn group_is_readable_from_listener() {
        let group: SharedComparator<u8> = Comparator::shared();
        let mut a: Observer<u8> = Observer::new(ObserverOptions::with_data(1));
        let mut b: Observer<u8> = Observer::new(ObserverOptions::with_data(2));
        a.attach(&group);
        b.attach(&group);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, g) = (seen.clone(), Rc::downgrade(&group));
        group.borrow_mut().on_thresholds_reached(move || {
            if let Some(g) = g.upgrade() {
                let g = g.borrow();
                s.borrow_mut().push((g.len(), g.most_visible().map(|m| m.data)));
            }
            Ok(())
        });

        a.on_signal(SignalKind::Appeared, 0.3);
        b.on_signal(SignalKind::Appeared, 0.6);
        assert_eq!(*seen.borrow(), vec![(2, Some(1)), (2, Some(2))]);
    }
}
