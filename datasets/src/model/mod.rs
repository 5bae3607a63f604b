//! Parametric 2D flux models
//!
//! A [`ParametricModel`] is a function from pixel coordinates to flux whose
//! shape is controlled by a fixed set of named scalar parameters. The
//! renderer drives models purely through this trait: parameters are read and
//! written by name, which is how source-table columns are matched to them.
//!
//! - [`Gaussian2D`]: elliptical, rotated 2D Gaussian
//! - [`discretize_oversample`]: pixel-averaged evaluation on a finer sub-grid

pub mod discretize;
pub mod gaussian;

pub use discretize::discretize_oversample;
pub use gaussian::Gaussian2D;

use thiserror::Error;

/// Errors raised by model implementations and the discretization kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model {model} has no parameter named {name}")]
    UnknownParameter { model: String, name: String },
    #[error("Invalid value {value} for parameter {name}")]
    InvalidParameter { name: String, value: f64 },
    #[error("Oversampling factor must be at least 1, got {0}")]
    InvalidFactor(usize),
    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}

/// A 2D flux model with named, mutable scalar parameters.
///
/// Implementations are borrowed mutably by the renderer for the duration of
/// one render call and are never cloned, so models carrying large auxiliary
/// data (tabulated PSFs and the like) are cheap to render with.
pub trait ParametricModel {
    /// Human readable model name, used in error messages.
    fn name(&self) -> &str;

    /// Declared parameter names, in a stable order.
    fn param_names(&self) -> &[&str];

    /// Current value of a parameter, or `None` if the name is not declared.
    fn param(&self, name: &str) -> Option<f64>;

    /// Set a parameter by name.
    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ModelError>;

    /// Evaluate the flux at pixel coordinates `(x, y)`.
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, ModelError>;

    fn has_param(&self, name: &str) -> bool {
        self.param_names().contains(&name)
    }
}
