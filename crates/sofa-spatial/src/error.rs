//! Error types for the spatial crate.

use sofa_format::{Axis, FormatError};
use thiserror::Error;

use crate::object::ObjectKind;

/// Errors raised by coordinate conversion and pose resolution.
#[derive(Error, Debug)]
pub enum SpatialError {
    #[error("cannot convert {variable}: unsupported coordinate system {system}")]
    UnsupportedCoordinateConversion { variable: String, system: String },

    #[error("unknown coordinate system: {0}")]
    UnknownSystem(String),

    #[error("unsupported unit: {0}")]
    UnsupportedUnit(String),

    #[error("cannot resolve pose of {object}: dimension {axis} is not defined")]
    MissingPose { object: ObjectKind, axis: Axis },

    #[error("unknown spatial object: {0}")]
    UnknownObject(String),

    #[error("coordinate conversion needs a C axis, got {dims:?}")]
    MissingCoordinateAxis { dims: Vec<Axis> },

    #[error("coordinate axis holds {len} components, conversion needs 3")]
    PartialTriple { len: usize },

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, SpatialError>;
