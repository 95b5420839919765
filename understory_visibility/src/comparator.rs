// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Comparator: pick the most visible observer of a group.
//!
//! ## Overview
//!
//! A [`Comparator`] keeps a registry of [`Member`]s, one per attached
//! [`Observer`](crate::observer::Observer). Observers register on attach,
//! deregister on detach/dispose/drop, and notify the comparator every time
//! their threshold changes.
//!
//! ## Selection
//!
//! - Membership changes alone never recompute the winner; only
//!   [`Comparator::notify_threshold_changed`] does.
//! - The winner is the member with the highest threshold.
//! - Ties keep the previous winner when it is among the tied maximum,
//!   otherwise the first tied member in registration order wins.
//! - With no members the winner is `None`.
//!
//! The result is a pure function of the previous winner and the ordered
//! member thresholds.
//!
//! ## Listeners
//!
//! Observers notify through [`Comparator::notify`], which releases the
//! shared borrow before any listener runs. Listeners may read the group,
//! attach or detach observers, and drive other observers of the same group.
//! A notification raised from inside a listener is applied at once; its
//! events are queued and delivered after the ones already pending.
//!
//! ```
//! use understory_visibility::comparator::Comparator;
//! use understory_visibility::observer::{Observer, ObserverOptions};
//! use understory_visibility::types::SignalKind;
//!
//! let group = Comparator::<&str>::shared();
//! let mut a = Observer::new(ObserverOptions::with_data("a"));
//! let mut b = Observer::new(ObserverOptions::with_data("b"));
//! a.attach(&group);
//! b.attach(&group);
//!
//! a.on_signal(SignalKind::Appeared, 0.4);
//! b.on_signal(SignalKind::Appeared, 0.9);
//! assert_eq!(group.borrow().most_visible().map(|m| m.data), Some("b"));
//! ```

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::error::CallbackResult;
use crate::listeners::Listeners;
use crate::trace;
use crate::types::{ComparatorEvent, Member, ObserverId, clamp_ratio};

/// A comparator shared between the owning scope and its observers.
///
/// Observers only keep a `Weak` to it.
pub type SharedComparator<D = ()> = Rc<RefCell<Comparator<D>>>;

/// Tracks a group of observers and the one currently most visible.
pub struct Comparator<D = ()> {
    members: Vec<Member<D>>,
    most_visible: Option<ObserverId>,
    listeners: Listeners<ComparatorEvent<D>>,
    pending: VecDeque<ComparatorEvent<D>>,
    dispatching: bool,
}

impl<D: core::fmt::Debug> core::fmt::Debug for Comparator<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Comparator")
            .field("members", &self.members)
            .field("most_visible", &self.most_visible)
            .field("listeners", &self.listeners)
            .field("pending", &self.pending.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}

impl<D> Default for Comparator<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Comparator<D> {
    /// Create an empty comparator.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            most_visible: None,
            listeners: Listeners::new("comparator"),
            pending: VecDeque::new(),
            dispatching: false,
        }
    }

    /// Create an empty comparator wrapped for sharing with observers.
    pub fn shared() -> SharedComparator<D> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Registered members in registration order.
    pub fn members(&self) -> &[Member<D>] {
        &self.members
    }

    /// Number of registered members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: ObserverId) -> bool {
        self.position(id).is_some()
    }

    /// The winner as of the last notification, if it is still registered.
    ///
    /// After the winner deregisters this returns `None` until the next
    /// [`notify_threshold_changed`](Self::notify_threshold_changed)
    /// recomputes over the remaining members.
    pub fn most_visible(&self) -> Option<&Member<D>> {
        let id = self.most_visible?;
        self.members.iter().find(|m| m.id == id)
    }

    /// Identity of the stored winner, as of the last notification.
    pub fn most_visible_id(&self) -> Option<ObserverId> {
        self.most_visible
    }

    /// Add an observer. Returns `false` if it was already registered.
    ///
    /// Does not recompute the winner.
    pub fn register(&mut self, id: ObserverId, threshold: f64, data: D) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push(Member {
            id,
            threshold: clamp_ratio(threshold),
            data,
        });
        true
    }

    /// Remove an observer. Safe if absent; returns whether it was present.
    ///
    /// Does not recompute the winner.
    pub fn deregister(&mut self, id: ObserverId) -> bool {
        match self.position(id) {
            Some(i) => {
                self.members.remove(i);
                true
            }
            None => false,
        }
    }

    fn position(&self, id: ObserverId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    /// Index of the member with the highest threshold, keeping the stored
    /// winner on ties.
    fn select(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, m) in self.members.iter().enumerate() {
            match best {
                None => best = Some(i),
                // Strictly greater: the first of equal maxima stays.
                Some(j) if m.threshold > self.members[j].threshold => best = Some(i),
                Some(_) => {}
            }
        }

        let best = best?;
        let max = self.members[best].threshold;
        if let Some(prev) = self.most_visible
            && let Some(p) = self.position(prev)
            && self.members[p].threshold == max
        {
            return Some(p);
        }
        Some(best)
    }
}

impl<D: Clone + 'static> Comparator<D> {
    /// Record `threshold` for `id` and recompute the most visible member.
    ///
    /// Always fires [`ComparatorEvent::ThresholdsReached`]; fires
    /// [`ComparatorEvent::MostVisibleChanged`] afterwards when the winner's
    /// identity changed. Unregistered ids still trigger a recompute over the
    /// current members.
    ///
    /// Listeners run while `self` is borrowed. For a [`SharedComparator`]
    /// use [`Comparator::notify`] so listeners can read the group.
    pub fn notify_threshold_changed(&mut self, id: ObserverId, threshold: f64) {
        self.record(id, threshold);
        if self.dispatching {
            return;
        }
        while let Some(event) = self.pending.pop_front() {
            self.listeners.emit(&event);
        }
    }

    /// Notify a shared comparator, running listeners without holding its borrow.
    ///
    /// Same semantics as
    /// [`notify_threshold_changed`](Self::notify_threshold_changed). Returns
    /// `false` if the comparator was already borrowed elsewhere; the
    /// notification is then dropped.
    pub fn notify(shared: &SharedComparator<D>, id: ObserverId, threshold: f64) -> bool {
        let listeners = {
            let Ok(mut c) = shared.try_borrow_mut() else {
                trace::comparator_busy(id);
                return false;
            };
            c.record(id, threshold);
            if c.dispatching {
                // The outer dispatch delivers the queued events.
                return true;
            }
            c.dispatching = true;
            c.listeners.take()
        };
        Dispatch { shared, listeners }.run();
        true
    }

    fn record(&mut self, id: ObserverId, threshold: f64) {
        if let Some(i) = self.position(id) {
            self.members[i].threshold = clamp_ratio(threshold);
        }

        let winner = self.select();
        let winner_id = winner.map(|i| self.members[i].id);

        self.pending.push_back(ComparatorEvent::ThresholdsReached);

        if winner_id != self.most_visible {
            trace::most_visible_changed(self.most_visible, winner_id);
            self.most_visible = winner_id;
            let payload = winner.map(|i| self.members[i].clone());
            self.pending.push_back(ComparatorEvent::MostVisibleChanged(payload));
        }
    }

    /// Call `f` on every notification.
    pub fn on_thresholds_reached(&mut self, mut f: impl FnMut() -> CallbackResult + 'static) {
        self.listeners.push(move |e| match e {
            ComparatorEvent::ThresholdsReached => f(),
            ComparatorEvent::MostVisibleChanged(_) => Ok(()),
        });
    }

    /// Call `f` with the new winner whenever it changes.
    pub fn on_most_visible_changed(
        &mut self,
        mut f: impl FnMut(Option<&Member<D>>) -> CallbackResult + 'static,
    ) {
        self.listeners.push(move |e| match e {
            ComparatorEvent::MostVisibleChanged(m) => f(m.as_ref()),
            ComparatorEvent::ThresholdsReached => Ok(()),
        });
    }

    /// Call `f` for every comparator event.
    pub fn listen(&mut self, f: impl FnMut(&ComparatorEvent<D>) -> CallbackResult + 'static) {
        self.listeners.push(f);
    }
}

/// Listeners lent out of a shared comparator for one dispatch.
///
/// Dropping it puts them back, after any registered meanwhile.
struct Dispatch<'a, D> {
    shared: &'a SharedComparator<D>,
    listeners: Listeners<ComparatorEvent<D>>,
}

impl<D> Dispatch<'_, D> {
    fn run(mut self) {
        loop {
            let next = match self.shared.try_borrow_mut() {
                Ok(mut c) => c.pending.pop_front(),
                Err(_) => None,
            };
            let Some(event) = next else {
                return;
            };
            self.listeners.emit(&event);
        }
    }
}

impl<D> Drop for Dispatch<'_, D> {
    fn drop(&mut self) {
        if let Ok(mut c) = self.shared.try_borrow_mut() {
            let mut listeners = self.listeners.take();
            listeners.append(c.listeners.take());
            c.listeners = listeners;
            c.dispatching = false;
        }
    }
}
