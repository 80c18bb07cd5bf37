//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// The base error type for `rts-core` and a common building block for
/// sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown {kind} name {name:?}")]
    UnknownClass { kind: &'static str, name: String },

    #[error("{kind} registry is full ({max} names)")]
    ClassCapacity { kind: &'static str, max: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `rts-core`.
pub type CoreResult<T> = Result<T, CoreError>;
