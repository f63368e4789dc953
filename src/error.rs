//! Errors that abort an invocation.
//!
//! None of these are retried here. Whatever retry policy exists belongs to
//! the Lambda service or to whoever is calling us.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No registered adapter recognized the event.
    #[error("unsupported lambda event type")]
    UnsupportedEventType,

    /// The event was not valid JSON, or did not have the structure of the
    /// shape it was detected as.
    #[error("malformed lambda event: {0}")]
    MalformedPayload(String),

    /// The path and query of the event could not be turned into a request
    /// target.
    #[error("invalid request target `{target}`: {reason}")]
    InvalidRequestTarget { target: String, reason: String },

    /// The reply could not be serialized, e.g. because the handler set a
    /// header value that isn't valid UTF-8.
    #[error("failed to serialize lambda reply: {0}")]
    Reply(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed<E: Display>(err: E) -> Self {
        Error::MalformedPayload(err.to_string())
    }

    pub(crate) fn invalid_target<E: Display>(target: &str, reason: E) -> Self {
        Error::InvalidRequestTarget {
            target: target.to_owned(),
            reason: reason.to_string(),
        }
    }
}
