//! Synthetic astronomical images for testing photometry algorithms.
//!
//! The crate renders tables of parametric sources onto pixel grids, draws
//! random source tables and noise fields, and ships two canned example
//! images. Everything random is seeded with an optional `u64` and produces
//! bit-identical output for the same seed.
//!
//! # Building blocks
//! - [`model`]: the [`ParametricModel`] trait, [`Gaussian2D`] and
//!   oversampled discretization
//! - [`SourceTable`]: column-ordered per-source parameters
//! - [`make_model_sources_image`] / [`make_gaussian_sources_image`]: render a
//!   table with any model, or with Gaussians given by flux or amplitude
//! - [`make_random_gaussians_table`] / [`make_random_models_table`]: uniform
//!   random tables
//! - [`make_noise_image`] / [`apply_poisson_noise`]: noise fields
//! - [`make_4gaussians_image`] / [`make_100gaussians_image`]: canned images
//! - [`make_wcs`] / [`make_imagehdu`]: sky coordinates and FITS containers
//!
//! # Example
//! ```
//! use datasets::{
//!     apply_poisson_noise, make_gaussian_sources_image, make_random_gaussians_table,
//!     GaussianRanges,
//! };
//!
//! let ranges = GaussianRanges {
//!     flux: (500.0, 1000.0),
//!     amplitude: None,
//!     x_mean: (0.0, 64.0),
//!     y_mean: (0.0, 64.0),
//!     x_stddev: (1.0, 3.0),
//!     y_stddev: (1.0, 3.0),
//! };
//! let table = make_random_gaussians_table(10, &ranges, Some(1));
//! let image = make_gaussian_sources_image((64, 64), &table, 5).unwrap();
//! let noisy = apply_poisson_noise(&image, Some(2)).unwrap();
//! assert_eq!(noisy.dim(), (64, 64));
//! ```

pub mod canned;
pub mod error;
pub mod hdu;
pub mod model;
pub mod noise;
pub mod random;
pub mod random_tables;
pub mod render;
pub mod shape;
pub mod shared_args;
pub mod table;
pub mod wcs;

pub use canned::{make_100gaussians_image, make_4gaussians_image};
pub use error::{DatasetError, Result};
pub use hdu::{make_imagehdu, HeaderCard, HeaderValue, ImageHdu};
pub use model::{Gaussian2D, ModelError, ParametricModel};
pub use noise::{
    apply_poisson_noise, apply_poisson_noise_with_rng, gaussian_noise, make_noise_image,
    make_noise_image_with_rng, poisson_noise, NoiseDistribution,
};
pub use random_tables::{
    make_random_gaussians_table, make_random_gaussians_table_with_rng, make_random_models_table,
    make_random_models_table_with_rng, Bounds, GaussianRanges,
};
pub use render::{
    add_model_sources, make_gaussian_sources_image, make_model_sources_image, RenderTarget,
};
pub use shape::ImageShape;
pub use table::{Brightness, Column, GaussianSource, SourceRow, SourceTable};
pub use wcs::{make_wcs, Wcs};
