//! Image shape utilities

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DatasetError;

/// Shape of a 2D image grid.
///
/// Follows the ndarray row-major convention: rows (`ny`, the y axis) come
/// first, columns (`nx`, the x axis) second. Pixel `(0, 0)` is the array
/// origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    /// Number of rows (y extent)
    pub ny: usize,
    /// Number of columns (x extent)
    pub nx: usize,
}

impl ImageShape {
    pub fn new(ny: usize, nx: usize) -> Self {
        Self { ny, nx }
    }

    /// Create a zero-filled grid with this shape
    pub fn zeros(&self) -> Array2<f64> {
        Array2::zeros((self.ny, self.nx))
    }

    /// Get total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.ny * self.nx
    }

    /// Convert to tuple (ny, nx)
    pub fn to_tuple(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }
}

impl From<(usize, usize)> for ImageShape {
    fn from((ny, nx): (usize, usize)) -> Self {
        Self { ny, nx }
    }
}

impl From<ImageShape> for (usize, usize) {
    fn from(shape: ImageShape) -> Self {
        shape.to_tuple()
    }
}

impl TryFrom<&[usize]> for ImageShape {
    type Error = DatasetError;

    /// Accepts only exactly two axes; anything else is an
    /// [`DatasetError::InvalidShape`].
    fn try_from(dims: &[usize]) -> Result<Self, Self::Error> {
        match dims {
            [ny, nx] => Ok(Self { ny: *ny, nx: *nx }),
            _ => Err(DatasetError::InvalidShape { ndim: dims.len() }),
        }
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.ny, self.nx)
    }
}
