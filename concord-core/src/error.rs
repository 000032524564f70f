//! Error taxonomy for the federation protocol engine.

use thiserror::Error;

/// Errors surfaced by registries, the publisher, the consumer, and the
/// stream handler. Variant names are the kinds named in the protocol's
/// failure-semantics section, not implementation-specific detail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to encode payload: {0}")]
    Encode(String),

    #[error("failed to decode payload: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("publisher queue overflow for stream {stream_id}, resource url {resource_url}")]
    QueueOverflow {
        stream_id: String,
        resource_url: String,
    },

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Error::Transport(status.message().to_string())
    }
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Unauthenticated(msg) => tonic::Status::unauthenticated(msg),
            Error::NotFound(msg) => tonic::Status::not_found(msg),
            Error::AlreadyExists(msg) | Error::AlreadyInitialized(msg) => {
                tonic::Status::already_exists(msg)
            }
            Error::Decode(msg) => tonic::Status::invalid_argument(msg),
            other => tonic::Status::internal(other.to_string()),
        }
    }
}
