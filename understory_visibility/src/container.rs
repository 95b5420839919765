// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container: one rendered element with exactly one observer.
//!
//! The container gives its element an identity, derives the locator the
//! signal source uses to find it, and ties the observer's lifetime to the
//! element's: [`first_render_complete`](Container::first_render_complete)
//! starts observing and [`unmount`](Container::unmount) disposes. Callback
//! registration and state getters forward to the owned
//! [`Observer`].
//!
//! The rendering layer is expected to emit the element with the
//! [`APPEAR_ID_ATTRIBUTE`] attribute set to [`Container::id`].
//!
//! ```
//! use understory_visibility::container::{Container, ContainerOptions};
//!
//! let c: Container = Container::new(ContainerOptions::default());
//! assert!(c.id().starts_with("id-"));
//! assert_eq!(c.locator(), format!("[_appear-id=\"{}\"]", c.id()));
//!
//! let named: Container = Container::new(ContainerOptions::with_id("hero"));
//! assert_eq!(named.locator(), "[_appear-id=\"hero\"]");
//! ```

use alloc::format;
use alloc::string::String;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::comparator::SharedComparator;
use crate::error::CallbackResult;
use crate::observer::{Lifecycle, Observer, ObserverOptions};
use crate::source::SignalSource;
use crate::types::{EventKinds, ObserverEvent, Signal, VisibilityFlags};

/// Attribute the rendering layer sets on the container's element.
pub const APPEAR_ID_ATTRIBUTE: &str = "_appear-id";

static NEXT_CONTAINER_ID: AtomicU32 = AtomicU32::new(1);

fn generate_id() -> String {
    format!("id-{}", NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Configuration for a [`Container`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerOptions<D = ()> {
    /// Element identity; generated when `None`.
    pub id: Option<String>,
    /// Options for the owned observer.
    pub observer: ObserverOptions<D>,
}

impl<D: Default> Default for ContainerOptions<D> {
    fn default() -> Self {
        Self {
            id: None,
            observer: ObserverOptions::default(),
        }
    }
}

impl<D: Default> ContainerOptions<D> {
    /// Default options with a caller-chosen identity.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// A rendered element paired with its observer.
#[derive(Debug)]
pub struct Container<D = ()> {
    id: String,
    observer: Observer<D>,
}

impl<D: Clone + 'static> Container<D> {
    /// Create a container; an identity is generated if none was supplied.
    pub fn new(options: ContainerOptions<D>) -> Self {
        Self {
            id: options.id.unwrap_or_else(generate_id),
            observer: Observer::new(options.observer),
        }
    }

    /// Element identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attribute selector that finds the rendered element.
    pub fn locator(&self) -> String {
        format!("[{APPEAR_ID_ATTRIBUTE}=\"{}\"]", self.id)
    }

    /// The owned observer.
    pub fn observer(&self) -> &Observer<D> {
        &self.observer
    }

    /// The owned observer, mutably.
    pub fn observer_mut(&mut self) -> &mut Observer<D> {
        &mut self.observer
    }

    /// The element exists in the rendered output; start observing it.
    ///
    /// Only the first call has any effect.
    pub fn first_render_complete<S: SignalSource + ?Sized>(&mut self, source: &mut S) -> bool {
        let locator = self.locator();
        self.observer.start_observing(locator, source)
    }

    /// The element is gone; dispose the observer and unsubscribe.
    pub fn unmount<S: SignalSource + ?Sized>(&mut self, source: &mut S) {
        self.observer.dispose_in(source);
    }

    /// Forward a source signal to the observer.
    pub fn handle_signal(&mut self, signal: &Signal) -> bool {
        self.observer.handle_signal(signal)
    }

    /// Join a comparator.
    pub fn attach(&mut self, comparator: &SharedComparator<D>) -> bool {
        self.observer.attach(comparator)
    }

    /// Leave the comparator.
    pub fn detach(&mut self) -> bool {
        self.observer.detach()
    }

    /// See [`Observer::on_appeared`].
    pub fn on_appeared(&mut self, f: impl FnMut() -> CallbackResult + 'static) {
        self.observer.on_appeared(f);
    }

    /// See [`Observer::on_disappeared`].
    pub fn on_disappeared(&mut self, f: impl FnMut() -> CallbackResult + 'static) {
        self.observer.on_disappeared(f);
    }

    /// See [`Observer::on_first_appeared`].
    pub fn on_first_appeared(&mut self, f: impl FnMut() -> CallbackResult + 'static) {
        self.observer.on_first_appeared(f);
    }

    /// See [`Observer::on_initialized`].
    pub fn on_initialized(&mut self, f: impl FnMut() -> CallbackResult + 'static) {
        self.observer.on_initialized(f);
    }

    /// See [`Observer::on_threshold_reached`].
    pub fn on_threshold_reached(&mut self, f: impl FnMut(f64) -> CallbackResult + 'static) {
        self.observer.on_threshold_reached(f);
    }

    /// See [`Observer::listen`].
    pub fn listen(
        &mut self,
        kinds: EventKinds,
        f: impl FnMut(&ObserverEvent) -> CallbackResult + 'static,
    ) {
        self.observer.listen(kinds, f);
    }

    /// Whether the element is currently visible; `false` before observation.
    pub fn is_visible(&self) -> bool {
        self.observer.is_visible()
    }

    /// Whether the element has appeared at least once.
    pub fn has_appeared(&self) -> bool {
        self.observer.has_appeared()
    }

    /// Whether the element is, or at some point was, visible.
    pub fn is_or_was_visible(&self) -> bool {
        self.observer.is_or_was_visible()
    }

    /// Last recorded intersection ratio.
    pub fn current_threshold(&self) -> f64 {
        self.observer.current_threshold()
    }

    /// All visibility flags.
    pub fn flags(&self) -> VisibilityFlags {
        self.observer.flags()
    }

    /// Lifecycle of the owned observer.
    pub fn lifecycle(&self) -> Lifecycle {
        self.observer.lifecycle()
    }
}
