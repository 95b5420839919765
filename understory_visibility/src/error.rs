// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! None of these reach the end user: observers swallow setup failures and
//! callback failures. They exist so signal sources and callbacks can say
//! what went wrong, and so the optional `tracing` hooks can log it.

use alloc::borrow::Cow;
use alloc::string::String;

use thiserror::Error;

/// Why a subscription could not be established.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// No element matches the locator; typically torn down before setup finished.
    #[error("no element matches `{locator}`")]
    ElementNotFound {
        /// The locator that failed to resolve.
        locator: String,
    },
    /// The bounding-box margin could not be understood by the source.
    #[error("invalid bounding-box margin `{margin}`: {source}")]
    InvalidMargin {
        /// The margin string as supplied.
        margin: String,
        /// Parse failure.
        source: MarginError,
    },
    /// The observer was disposed before setup completed.
    #[error("observer was disposed before setup completed")]
    Disposed,
}

/// Failure to parse a bounding-box margin string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MarginError {
    /// More than four lengths were given.
    #[error("expected 1 to 4 lengths, found {0}")]
    TooManyValues(usize),
    /// A component is not `<number>px`, `<number>%`, or `0`.
    #[error("`{0}` is not a px or % length")]
    InvalidLength(String),
}

/// Error returned by a user callback.
///
/// Discarded by the failure boundary; later callbacks still run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CallbackError {
    message: Cow<'static, str>,
}

impl CallbackError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&'static str> for CallbackError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Return type of every user callback.
pub type CallbackResult = Result<(), CallbackError>;
