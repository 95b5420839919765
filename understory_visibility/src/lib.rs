// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_visibility --heading-base-level=0

//! Understory Visibility: deterministic, `no_std` visibility observers for UI.
//!
//! ## Overview
//!
//! This crate turns intersection notifications into visibility state and
//! events. Use it to react to an element appearing, disappearing, or
//! crossing visibility thresholds, and to find the most visible element of a
//! group. It does not compute intersections itself. A host-provided
//! [`SignalSource`](crate::source::SignalSource) does that, for example a
//! browser `IntersectionObserver` binding or the headless
//! [`RectSource`](crate::adapters::rect::RectSource).
//!
//! ## Components
//!
//! - [`Observer`](crate::observer::Observer): one element. It tracks
//!   `is_visible`, `has_appeared`, `is_or_was_visible`, and the current
//!   threshold, and fires appeared / disappeared / first-appeared /
//!   threshold-reached events.
//! - [`Comparator`](crate::comparator::Comparator): a group. Observers attach
//!   to it and notify it on every threshold change. It tracks the member
//!   with the highest threshold and reports winner changes.
//! - [`Container`](crate::container::Container): a rendered element that owns
//!   exactly one observer, with a generated identity and locator.
//!
//! ## Data flow
//!
//! signal source → [`Observer::handle_signal`](crate::observer::Observer::handle_signal)
//! → observer state and callbacks → attached comparator
//! → [`Comparator::notify`](crate::comparator::Comparator::notify)
//! → group callbacks.
//!
//! ## Failure policy
//!
//! Visibility tracking is best-effort. Setup races (the element is gone
//! before observation starts) leave the observer inert. Callback errors and,
//! with `std`, callback panics are discarded without interrupting the event
//! sequence. Signals arriving after disposal are ignored. Enable the
//! `tracing` feature to log these cases at debug level.
//!
//! ## Example
//!
//! ```
//! use understory_visibility::comparator::Comparator;
//! use understory_visibility::observer::{Observer, ObserverOptions};
//! use understory_visibility::types::SignalKind;
//!
//! let group = Comparator::<u32>::shared();
//! group.borrow_mut().on_most_visible_changed(|m| {
//!     println!("most visible: {:?}", m.map(|m| m.data));
//!     Ok(())
//! });
//!
//! let mut x = Observer::new(ObserverOptions::with_data(1));
//! let mut y = Observer::new(ObserverOptions::with_data(2));
//! x.attach(&group);
//! y.attach(&group);
//!
//! x.on_signal(SignalKind::Appeared, 0.5);
//! y.on_signal(SignalKind::Appeared, 0.8);
//! assert_eq!(group.borrow().most_visible_id(), Some(y.id()));
//!
//! x.on_signal(SignalKind::Appeared, 0.9);
//! assert_eq!(group.borrow().most_visible_id(), Some(x.id()));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod adapters;
pub mod comparator;
pub mod container;
pub mod error;
pub mod margin;
pub mod observer;
pub mod source;
pub mod thresholds;
pub mod types;

mod listeners;
mod trace;
