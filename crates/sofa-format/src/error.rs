//! Error types for the SOFA format crate.

use thiserror::Error;

use crate::axis::Axis;

/// Errors that can occur when accessing or persisting a dataset.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unknown dimension name: {0}")]
    UnknownAxis(String),

    #[error("dimension {axis} already defined with size {existing}, cannot redefine to {requested}")]
    DimensionExists {
        axis: Axis,
        existing: usize,
        requested: usize,
    },

    #[error("invalid size {size} for dimension {axis}: {reason}")]
    InvalidDimensionSize {
        axis: Axis,
        size: usize,
        reason: &'static str,
    },

    #[error("cannot create variable {variable}, dimensions undefined: {missing:?}")]
    UndefinedDimensions { variable: String, missing: Vec<Axis> },

    #[error("variable {0} already exists")]
    VariableExists(String),

    #[error("variable {0} not initialized")]
    VariableNotInitialized(String),

    #[error("dimension mismatch on {variable}: {details}")]
    DimensionMismatch { variable: String, details: String },

    #[error("cannot repeat values of {variable} along {axis}: dimension already provided in the value order")]
    RepeatConflict { variable: String, axis: Axis },

    #[error("Invalid magic bytes: expected SOFA (0x534F4641)")]
    InvalidMagic,

    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u16),

    #[error("Chunk checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Invalid chunk type: {0}")]
    InvalidChunkType(u8),

    #[error("Invalid offset: chunk at {offset} exceeds file size {file_size}")]
    InvalidOffset { offset: u64, file_size: u64 },

    #[error("Chunk count exceeded maximum (max {max}, got {got})")]
    ChunkCountExceeded { max: u64, got: u64 },

    #[error("Allocation too large: requested {requested} bytes, limit is {limit} bytes")]
    AllocationTooLarge { requested: u64, limit: u64 },

    #[error("Missing {0:?} chunk")]
    MissingChunk(crate::chunk::ChunkType),

    #[error("Malformed variable chunk for {name}: {details}")]
    MalformedVariable { name: String, details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormatError {
    pub fn mismatch(variable: &str, details: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            variable: variable.to_string(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
