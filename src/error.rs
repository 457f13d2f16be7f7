//! Error types.
//!
//! Precondition violations (a non-positive mapped symbol, a multiplier equal
//! to its mapped symbol) are caller bugs and panic. The types below cover the
//! recoverable failures: inverting an automorphism outside the supported class
//! and reading a corrupt persisted program.

use thiserror::Error;

/// `inverse()` was called on an automorphism it cannot invert.
///
/// Only the identity, inverters and left/right multipliers are supported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InverseError {
    #[error("unsupported endomorphism with {count} non-trivial images (at most one is supported)")]
    TooManyImages { count: usize },

    #[error("unsupported endomorphism whose image has height {height} (at most 2 is supported)")]
    HeightExceeded { height: u32 },

    #[error("unsupported endomorphism: image of {symbol} is not a product of {symbol} with another symbol")]
    NotElementary { symbol: i64 },
}

/// A persisted endomorphism could not be read back.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at token {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("input ended early: expected {expected}")]
    Truncated { expected: &'static str },

    #[error("vertex index {index} is referenced before it is defined")]
    DanglingIndex { index: u64 },

    #[error("vertex index {index} is defined twice")]
    DuplicateIndex { index: u64 },

    #[error("symbol code {symbol} does not fit the symbol type")]
    InvalidSymbol { symbol: i64 },

    #[error("root symbol {symbol} is not a positive generator")]
    InvalidRoot { symbol: i64 },

    #[error("root symbol {symbol} is listed twice")]
    DuplicateRoot { symbol: i64 },

    #[error("cbor error: {0}")]
    Cbor(#[from] serde_cbor::Error),
}

/// A persisted endomorphism could not be written.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cbor error: {0}")]
    Cbor(#[from] serde_cbor::Error),
}
