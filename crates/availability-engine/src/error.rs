//! Error types for availability evaluation and holiday lookups.

use thiserror::Error;

use crate::condition::RegionId;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Invalid window: lower bound {lower} is after upper bound {upper}")]
    InvalidWindow { lower: String, upper: String },

    /// A node of the condition tree is structurally invalid.
    /// `path` locates the node, e.g. `root.children[1].child`.
    #[error("Invalid condition at {path}: {reason}")]
    InvalidCondition { path: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error(transparent)]
    Holiday(#[from] HolidayError),

    #[error("Condition decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by a holiday source. The evaluator propagates these unchanged.
#[derive(Error, Debug)]
pub enum HolidayError {
    #[error("No holiday data for region '{0}'")]
    UnsupportedRegion(RegionId),

    #[error("Could not get holidays in interval [{lower},{upper}) for region '{region}'")]
    OutOfCoverage {
        region: RegionId,
        lower: String,
        upper: String,
    },

    #[error("Holiday provider error: {0}")]
    Provider(String),

    #[error("Holiday cache snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AvailabilityError>;
