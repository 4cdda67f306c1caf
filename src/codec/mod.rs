//! Diagnostic trouble code codec
//!
//! Converts scraped DTC strings such as `P05FF-00` into the three-byte form
//! used on the wire by UDS diagnostics, and names the failure mode carried by
//! the two-digit fault suffix.

mod code;
mod fault;
mod triplet;

pub use code::{Code, SystemKind, CODE_PATTERN};
pub use fault::{fault_meaning, FAULT_MEANINGS};
pub use triplet::{to_canonical_triplet, CanonicalTriplet};

use thiserror::Error;

/// Errors produced while decoding a code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("Invalid code format: {0}")]
    InvalidCodeFormat(String),
}
