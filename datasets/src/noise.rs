//! Noise synthesis for simulated images.
//!
//! Two entry points:
//! - [`make_noise_image`] draws a fresh noise field from a Gaussian or
//!   Poisson distribution with fixed parameters.
//! - [`apply_poisson_noise`] treats every pixel of an existing image as the
//!   expectation value of a Poisson distribution and samples it.
//!
//! Draws are made in row-major (logical) order from a ChaCha8 stream, so a
//! given seed reproduces the same field on every platform.

use std::fmt;
use std::str::FromStr;

use log::debug;
use ndarray::{Array, Array2, ArrayBase, Data, Dimension};
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

use crate::error::{DatasetError, Result};
use crate::random::rng_from_seed;
use crate::shape::ImageShape;

/// Distribution used by [`make_noise_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseDistribution {
    Gaussian,
    Poisson,
}

impl FromStr for NoiseDistribution {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gaussian" => Ok(NoiseDistribution::Gaussian),
            "poisson" => Ok(NoiseDistribution::Poisson),
            other => Err(DatasetError::InvalidArgument(format!(
                "Invalid distribution: {other}. Use one of {{\"gaussian\", \"poisson\"}}."
            ))),
        }
    }
}

impl fmt::Display for NoiseDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseDistribution::Gaussian => write!(f, "gaussian"),
            NoiseDistribution::Poisson => write!(f, "poisson"),
        }
    }
}

/// Make an image containing only noise.
///
/// # Arguments
/// * `shape` - Output shape `(ny, nx)`
/// * `distribution` - Distribution to draw from
/// * `mean` - Mean of the distribution
/// * `stddev` - Standard deviation; required for Gaussian noise and ignored
///   for Poisson noise
/// * `seed` - Optional seed for reproducibility
///
/// # Errors
/// [`DatasetError::InvalidArgument`] when Gaussian noise has no `stddev`,
/// `stddev` is negative or non-finite, or the Poisson `mean` is negative or
/// non-finite.
///
/// # Examples
/// ```
/// use datasets::{make_noise_image, NoiseDistribution};
///
/// let noise =
///     make_noise_image((100, 200), NoiseDistribution::Gaussian, 5.0, Some(2.0), Some(1)).unwrap();
/// assert_eq!(noise.dim(), (100, 200));
/// ```
pub fn make_noise_image(
    shape: impl Into<ImageShape>,
    distribution: NoiseDistribution,
    mean: f64,
    stddev: Option<f64>,
    seed: Option<u64>,
) -> Result<Array2<f64>> {
    make_noise_image_with_rng(shape, distribution, mean, stddev, &mut rng_from_seed(seed))
}

/// [`make_noise_image`] drawing from a caller-supplied generator.
///
/// The field consumes draws from `rng` in row-major order, so several fields
/// drawn in sequence from one generator continue a single stream.
pub fn make_noise_image_with_rng<R: Rng>(
    shape: impl Into<ImageShape>,
    distribution: NoiseDistribution,
    mean: f64,
    stddev: Option<f64>,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let shape = shape.into();

    let image = match distribution {
        NoiseDistribution::Gaussian => {
            let stddev = stddev.ok_or_else(|| {
                DatasetError::InvalidArgument(
                    "stddev must be given for Gaussian noise".to_string(),
                )
            })?;
            gaussian_field(shape, mean, stddev, rng)?
        }
        NoiseDistribution::Poisson => poisson_field(shape, mean, rng)?,
    };

    debug!("Generated {} noise image of shape {}", distribution, shape);
    Ok(image)
}

/// Gaussian noise field with the given mean and standard deviation.
pub fn gaussian_noise(
    shape: impl Into<ImageShape>,
    mean: f64,
    stddev: f64,
    seed: Option<u64>,
) -> Result<Array2<f64>> {
    make_noise_image(shape, NoiseDistribution::Gaussian, mean, Some(stddev), seed)
}

/// Poisson noise field with the given mean.
pub fn poisson_noise(
    shape: impl Into<ImageShape>,
    mean: f64,
    seed: Option<u64>,
) -> Result<Array2<f64>> {
    make_noise_image(shape, NoiseDistribution::Poisson, mean, None, seed)
}

fn gaussian_field<R: Rng>(
    shape: ImageShape,
    mean: f64,
    stddev: f64,
    rng: &mut R,
) -> Result<Array2<f64>> {
    if !(stddev.is_finite() && stddev >= 0.0) || !mean.is_finite() {
        return Err(DatasetError::InvalidArgument(format!(
            "Gaussian noise needs a finite mean and stddev >= 0, got mean {mean}, stddev {stddev}"
        )));
    }
    let normal = Normal::new(mean, stddev)
        .map_err(|e| DatasetError::InvalidArgument(format!("Gaussian noise: {e}")))?;
    Ok(Array2::from_shape_fn(shape.to_tuple(), |_| normal.sample(rng)))
}

fn poisson_field<R: Rng>(shape: ImageShape, mean: f64, rng: &mut R) -> Result<Array2<f64>> {
    check_expectation(mean)?;
    if mean == 0.0 {
        return Ok(shape.zeros());
    }
    let poisson = poisson_for(mean)?;
    Ok(Array2::from_shape_fn(shape.to_tuple(), |_| poisson.sample(rng)))
}

fn check_expectation(value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DatasetError::InvalidArgument(format!(
            "Poisson expectation values must be finite and >= 0, got {value}"
        )))
    }
}

fn poisson_for(lambda: f64) -> Result<Poisson<f64>> {
    Poisson::new(lambda).map_err(|e| {
        DatasetError::InvalidArgument(format!("Poisson noise with mean {lambda}: {e}"))
    })
}

/// Apply Poisson noise to an array of expectation values.
///
/// Each element is replaced by a draw from a Poisson distribution whose mean
/// is the element value. Works on arrays of any dimensionality.
///
/// # Arguments
/// * `data` - Expectation values; all must be finite and >= 0
/// * `seed` - Optional seed for reproducibility
///
/// # Returns
/// Array of the same shape holding the sampled counts. Zero-valued elements
/// stay zero.
///
/// # Errors
/// [`DatasetError::InvalidArgument`] if any value is negative or non-finite.
/// Nothing is drawn in that case.
pub fn apply_poisson_noise<S, D>(data: &ArrayBase<S, D>, seed: Option<u64>) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    apply_poisson_noise_with_rng(data, &mut rng_from_seed(seed))
}

/// [`apply_poisson_noise`] drawing from a caller-supplied generator.
///
/// Elements are sampled in logical order and zero-valued elements consume no
/// draws. A rejected array leaves `rng` untouched.
pub fn apply_poisson_noise_with_rng<S, D, R>(
    data: &ArrayBase<S, D>,
    rng: &mut R,
) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    R: Rng,
{
    if let Some(&bad) = data.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
        return Err(DatasetError::InvalidArgument(format!(
            "data must not contain any negative or non-finite values, found {bad}"
        )));
    }

    let mut sampled = Array::<f64, D>::zeros(data.raw_dim());
    for (out, &lambda) in sampled.iter_mut().zip(data.iter()) {
        if lambda > 0.0 {
            *out = poisson_for(lambda)?.sample(rng);
        }
    }

    debug!("Applied Poisson noise to {} elements", data.len());
    Ok(sampled)
}
