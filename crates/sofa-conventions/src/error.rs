//! Error types for the conventions crate.

use sofa_format::{Axis, FormatError};
use sofa_spatial::{ObjectKind, SpatialError};
use thiserror::Error;

/// Errors raised while validating or initializing a dataset layout.
#[derive(Error, Debug)]
pub enum ConventionError {
    /// One or more rules rejected an object configuration.
    #[error("invalid {object} configuration, failed rules: {}", rules.join(", "))]
    ValidationFailed {
        object: ObjectKind,
        /// Names of every failing rule, in rule order.
        rules: Vec<String>,
    },

    #[error("unknown convention: {0}")]
    UnknownConvention(String),

    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    #[error("unknown room type: {0}")]
    UnknownRoomType(String),

    /// No explicit count, existing dimension or convention default.
    #[error("no count given for {object} and dimension {axis} is not defined")]
    MissingCount { object: ObjectKind, axis: Axis },

    #[error("{data_type} data needs a sample count that is a multiple of {multiple}, got {count}")]
    InvalidSampleCount {
        data_type: String,
        count: usize,
        multiple: usize,
    },

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, ConventionError>;
