// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured logging hooks; no-ops unless the `tracing` feature is enabled.

#[cfg(feature = "tracing")]
use crate::error::{CallbackError, SetupError};
#[cfg(feature = "tracing")]
use crate::types::{ObserverId, SubscriptionId};

#[cfg(feature = "tracing")]
pub(crate) fn setup_ignored(id: ObserverId, error: &SetupError) {
    tracing::debug!(message = "visibility.setup_ignored", observer = id.get(), %error);
}

#[cfg(feature = "tracing")]
pub(crate) fn callback_failed(origin: &'static str, error: &CallbackError) {
    tracing::debug!(message = "visibility.callback_failed", origin, %error);
}

#[cfg(feature = "tracing")]
pub(crate) fn stale_signal(id: ObserverId, subscription: SubscriptionId) {
    tracing::debug!(
        message = "visibility.stale_signal",
        observer = id.get(),
        subscription = subscription.get()
    );
}

#[cfg(feature = "tracing")]
pub(crate) fn comparator_busy(id: ObserverId) {
    tracing::debug!(message = "visibility.comparator_busy", observer = id.get());
}

#[cfg(feature = "tracing")]
pub(crate) fn most_visible_changed(from: Option<ObserverId>, to: Option<ObserverId>) {
    tracing::debug!(
        message = "visibility.most_visible_changed",
        from = from.map(ObserverId::get),
        to = to.map(ObserverId::get)
    );
}

#[cfg(feature = "tracing")]
pub(crate) fn dropped_while_observing(id: ObserverId, subscription: SubscriptionId) {
    tracing::warn!(
        message = "visibility.dropped_while_observing",
        observer = id.get(),
        subscription = subscription.get()
    );
}

#[cfg(not(feature = "tracing"))]
mod noop {
    use crate::error::{CallbackError, SetupError};
    use crate::types::{ObserverId, SubscriptionId};

    #[inline]
    pub(crate) fn setup_ignored(_: ObserverId, _: &SetupError) {}
    #[inline]
    pub(crate) fn callback_failed(_: &'static str, _: &CallbackError) {}
    #[inline]
    pub(crate) fn stale_signal(_: ObserverId, _: SubscriptionId) {}
    #[inline]
    pub(crate) fn comparator_busy(_: ObserverId) {}
    #[inline]
    pub(crate) fn most_visible_changed(_: Option<ObserverId>, _: Option<ObserverId>) {}
    #[inline]
    pub(crate) fn dropped_while_observing(_: ObserverId, _: SubscriptionId) {}
}

#[cfg(not(feature = "tracing"))]
pub(crate) use noop::*;
