//! Ready-made example images.
//!
//! Both builders render a fixed set of Gaussian sources onto a constant
//! background of 5 and optionally add seeded Gaussian noise, so the output
//! is identical on every call.

use ndarray::Array2;

use crate::error::Result;
use crate::noise::gaussian_noise;
use crate::random_tables::{make_random_gaussians_table, GaussianRanges};
use crate::render::make_gaussian_sources_image;
use crate::shape::ImageShape;
use crate::table::{Brightness, GaussianSource, SourceTable};

const BACKGROUND: f64 = 5.0;
const SEED: u64 = 12345;

/// Make an example image containing four 2D Gaussians plus a constant
/// background.
///
/// The image has shape `(100, 200)`. With `noise`, Gaussian noise of mean 0
/// and standard deviation 5 is added.
///
/// # Examples
/// ```
/// use datasets::make_4gaussians_image;
///
/// let image = make_4gaussians_image(false);
/// assert_eq!(image.dim(), (100, 200));
/// assert!((image[[70, 160]] - 55.0).abs() < 1.0);
/// ```
pub fn make_4gaussians_image(noise: bool) -> Array2<f64> {
    build_image(four_gaussians_table(), ImageShape::new(100, 200), noise.then_some(5.0))
        .expect("built-in source table renders")
}

/// Make an example image containing 100 2D Gaussians plus a constant
/// background.
///
/// The sources are drawn with a fixed seed: fluxes in `[500, 1000)`,
/// positions over the `(300, 500)` image, standard deviations in `[1, 5)`.
/// With `noise`, Gaussian noise of mean 0 and standard deviation 2 is added.
pub fn make_100gaussians_image(noise: bool) -> Array2<f64> {
    build_image(hundred_gaussians_table(), ImageShape::new(300, 500), noise.then_some(2.0))
        .expect("built-in source table renders")
}

fn four_gaussians_table() -> SourceTable {
    let amplitude = [50.0, 70.0, 150.0, 210.0];
    let x_mean = [160.0, 25.0, 150.0, 90.0];
    let y_mean = [70.0, 40.0, 25.0, 60.0];
    let x_stddev = [15.2, 5.1, 3.0, 8.1];
    let y_stddev = [2.6, 2.5, 3.0, 4.7];
    let theta_deg = [145.0_f64, 20.0, 0.0, 60.0];

    let sources: Vec<GaussianSource> = (0..4)
        .map(|i| GaussianSource {
            brightness: Brightness::Amplitude(amplitude[i]),
            x_mean: x_mean[i],
            y_mean: y_mean[i],
            x_stddev: x_stddev[i],
            y_stddev: y_stddev[i],
            theta: theta_deg[i].to_radians(),
        })
        .collect();

    SourceTable::from_gaussians(&sources)
}

fn hundred_gaussians_table() -> SourceTable {
    let ranges = GaussianRanges {
        flux: (500.0, 1000.0),
        amplitude: None,
        x_mean: (0.0, 500.0),
        y_mean: (0.0, 300.0),
        x_stddev: (1.0, 5.0),
        y_stddev: (1.0, 5.0),
    };
    make_random_gaussians_table(100, &ranges, Some(SEED))
}

fn build_image(
    table: SourceTable,
    shape: ImageShape,
    noise_stddev: Option<f64>,
) -> Result<Array2<f64>> {
    let mut image = make_gaussian_sources_image(shape, &table, 1)?;
    image += BACKGROUND;

    if let Some(stddev) = noise_stddev {
        image += &gaussian_noise(shape, 0.0, stddev, Some(SEED))?;
    }
    Ok(image)
}
