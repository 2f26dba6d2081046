//! Error types for the exploder effect.

use thiserror::Error;

use crate::animation::host::PrimitiveKind;

/// Failures reported by the host engine's object API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host could not allocate a renderable primitive.
    #[error("failed to create {kind:?} renderable: {reason}")]
    CreationFailed {
        /// Primitive that was requested.
        kind: PrimitiveKind,
        /// Host supplied reason.
        reason: String,
    },
}

/// Errors that can occur while configuring or driving an exploder.
#[derive(Error, Debug)]
pub enum ExploderError {
    /// A caller supplied value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The pool cannot be built without its renderables.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// A JSON configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The pool is already allocated with a different size.
    #[error("pool already allocated with {allocated} particles, cannot resize to {requested}")]
    AlreadyInitialized {
        /// Size of the live pool.
        allocated: usize,
        /// Size the new configuration asked for.
        requested: usize,
    },
}

pub type Result<T> = std::result::Result<T, ExploderError>;
