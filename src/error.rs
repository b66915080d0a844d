//! Error types for surface construction.
//!
//! Per-quote solver failures live in [`crate::models::implied_vol::SolveFailure`]
//! and never abort a build. [`SurfaceError`] covers the outcomes that stop a
//! surface (or a whole request) from being produced.

use thiserror::Error;

use crate::surface::types::OptionType;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SurfaceError {
    /// Non-positive spot, non-finite rates, or a malformed grid/config.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Too few usable points survived filtering and solving for one option type.
    #[error("Insufficient data for {option_type}: {reason}")]
    InsufficientData {
        option_type: OptionType,
        /// Distinct (T, K) sites available when the check failed
        points: usize,
        reason: String,
    },
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;

impl SurfaceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn insufficient(option_type: OptionType, points: usize, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            option_type,
            points,
            reason: reason.into(),
        }
    }

    /// True when the error only concerns one option type's surface.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
