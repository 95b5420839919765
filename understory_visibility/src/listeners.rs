// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered callback lists with a silent-ignore failure boundary.
//!
//! Every callback runs inside its own boundary: an `Err` (and, with the
//! `std` feature, a panic) is logged and dropped, and the remaining
//! callbacks for the same event still run.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::CallbackResult;
use crate::trace;

type Handler<E> = Box<dyn FnMut(&E) -> CallbackResult>;

pub(crate) struct Listeners<E> {
    origin: &'static str,
    handlers: Vec<Handler<E>>,
}

impl<E> core::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listeners")
            .field("origin", &self.origin)
            .field("len", &self.handlers.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub(crate) const fn new(origin: &'static str) -> Self {
        Self {
            origin,
            handlers: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, handler: impl FnMut(&E) -> CallbackResult + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Move the handlers out, leaving an empty list with the same origin.
    pub(crate) fn take(&mut self) -> Self {
        Self {
            origin: self.origin,
            handlers: core::mem::take(&mut self.handlers),
        }
    }

    /// Add `later`'s handlers after the existing ones.
    pub(crate) fn append(&mut self, mut later: Self) {
        self.handlers.append(&mut later.handlers);
    }

    /// Deliver `event` to every handler in registration order.
    pub(crate) fn emit(&mut self, event: &E) {
        for handler in &mut self.handlers {
            if let Err(error) = guarded(handler, event) {
                trace::callback_failed(self.origin, &error);
            }
        }
    }
}

#[cfg(feature = "std")]
fn guarded<E>(handler: &mut Handler<E>, event: &E) -> CallbackResult {
    use crate::error::CallbackError;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    catch_unwind(AssertUnwindSafe(|| handler(event)))
        .unwrap_or_else(|_| Err(CallbackError::new("callback panicked")))
}

#[cfg(not(feature = "std"))]
fn guarded<E>(handler: &mut Handler<E>, event: &E) -> CallbackResult {
    handler(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use crate::error::CallbackError;

    #[test]
    fn failing_handler_does_not_stop_later_ones() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut l: Listeners<u32> = Listeners::new("test");
        let s = seen.clone();
        l.push(move |e| {
            s.borrow_mut().push(("first", *e));
            Err(CallbackError::new("nope"))
        });
        let s = seen.clone();
        l.push(move |e| {
            s.borrow_mut().push(("second", *e));
            Ok(())
        });
        l.emit(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn take_and_append_keep_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut l: Listeners<u32> = Listeners::new("test");
        let s = seen.clone();
        l.push(move |e| {
            s.borrow_mut().push(*e);
            Ok(())
        });
        let mut taken = l.take();
        assert_eq!(l.len(), 0);
        let s = seen.clone();
        l.push(move |e| {
            s.borrow_mut().push(*e * 10);
            Ok(())
        });
        taken.append(l.take());
        taken.emit(&2);
        assert_eq!(*seen.borrow(), vec![2, 20]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_handler_is_contained() {
        let hits = Rc::new(RefCell::new(0));
        let mut l: Listeners<()> = Listeners::new("test");
        l.push(|_| panic!("handler exploded"));
        let h = hits.clone();
        l.push(move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });
        l.emit(&());
        l.emit(&());
        assert_eq!(*hits.borrow(), 2);
    }
}
