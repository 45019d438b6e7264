use thiserror::Error;

/// Errors surfaced by event bus operations.
///
/// Type mismatches are not errors: a subscriber of another type simply
/// receives nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("global event bus is already initialized")]
    AlreadyInitialized,
}
