//! Error types for dataset sessions.

use std::path::PathBuf;

use sofa_conventions::ConventionError;
use sofa_format::FormatError;
use sofa_spatial::SpatialError;
use thiserror::Error;

/// Errors raised by a [`crate::Database`] session.
#[derive(Error, Debug)]
pub enum SofaError {
    #[error("{} was opened read-only", .0.display())]
    ReadOnly(PathBuf),

    #[error(transparent)]
    Convention(#[from] ConventionError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, SofaError>;
