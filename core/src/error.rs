//! Error types for request construction, signing and batch execution.
//!
//! # Design
//! Build-time and sign-time failures (`InvalidRoute`, `MissingRegion`,
//! `Credential`, `Serialization`, `InvalidHeader`) abort a run. `Transport`
//! is different: `HttpClient::send` never returns it, it only lives inside
//! a `RequestResult`, so a failed send does not stop the batch.

use thiserror::Error;

/// Errors produced by the request executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The route could not be normalized into an absolute URL.
    #[error("invalid route {route:?}: {reason}")]
    InvalidRoute { route: String, reason: String },

    /// Signing was requested without a region.
    #[error("must specify an AWS region")]
    MissingRegion,

    /// Credentials could not be read from the environment or profile.
    #[error("credentials: {0}")]
    Credential(String),

    /// A requested target id is not declared in the spec.
    #[error("unknown request ID: {0}")]
    UnknownTarget(String),

    /// Two targets in one spec share an id.
    #[error("duplicate request ID: {0}")]
    DuplicateTarget(String),

    /// The spec or a request body could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A header name or value is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request could not be delivered (DNS, refused, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
