//! Error taxonomy for dataset generation.
//!
//! Every failure is raised at the point of detection. Errors coming out of a
//! [`ParametricModel`](crate::model::ParametricModel) are carried unchanged in
//! [`DatasetError::Model`].

use thiserror::Error;

use crate::model::ModelError;

/// Errors that can occur while building tables, images, or noise fields.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Invalid shape: expected a 2D array, got {ndim} dimension(s)")]
    InvalidShape { ndim: usize },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Missing column: {0} must be a column in the source table")]
    MissingColumn(String),
    #[error("Requested parameter {name} is not in model {model}")]
    UnknownParameter { name: String, model: String },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[cfg(feature = "fits")]
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::compat::errors::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DatasetError>;
