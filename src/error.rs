//! Error kinds shared across the detection/recovery core.

use thiserror::Error;

/// Failure modes produced by the core. Parsing errors are meant to reach the
/// collaborator (it shows a user-visible message); allocation failures inside
/// the MT state finder are caught locally and never surface here (see
/// [`crate::mt::MersenneTwister::find_sequence`]).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DerandomError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("number format error: {0}")]
    NumberFormat(String),

    #[error("underflow: {0}")]
    Underflow(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),
}

pub type Result<T> = std::result::Result<T, DerandomError>;
