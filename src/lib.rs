//! Detects which member of a fixed catalog of pseudo-random number
//! generators produced an observed sequence, recovers its internal state,
//! and predicts the values it will produce next.
//!
//! The catalog covers sixteen named linear congruential generators (see
//! [`lcg::catalog`]) and the two standard Mersenne Twister
//! parameterizations (see [`mt::catalog`]); [`RandomManager`] is the entry
//! point that runs detection and prediction against both families at once.

pub mod error;
pub mod generator;
pub mod history;
pub mod lcg;
pub mod manager;
pub mod mt;
pub mod number_sequence;
pub mod number_type;
mod state_finder;

pub use error::{DerandomError, Result};
pub use generator::Generator;
pub use history::HistoryBuffer;
pub use manager::RandomManager;
pub use number_sequence::NumberSequence;
pub use number_type::NumberType;
