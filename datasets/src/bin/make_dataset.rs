//! Command line front end for the synthetic dataset generators
//!
//! Builds one of the canned example images, draws a random Gaussian source
//! table, or renders a source table loaded from JSON. Images are summarized
//! in the log and, with the `fits` feature, written to a FITS file together
//! with an example TAN WCS header.

use clap::{Parser, Subcommand};
use datasets::shared_args::{BoundsArg, NoiseKind, ShapeArg, SharedOutputArgs};
use datasets::{
    make_100gaussians_image, make_4gaussians_image, make_gaussian_sources_image, make_imagehdu,
    make_noise_image, make_random_gaussians_table, make_wcs, GaussianRanges, SourceTable,
};
use log::info;
use ndarray::Array2;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "make_dataset",
    about = "Generates synthetic astronomical images and source tables",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Four Gaussian sources on a 100x200 image
    FourGaussians {
        /// Leave out the Gaussian noise
        #[arg(long)]
        no_noise: bool,

        #[command(flatten)]
        output: SharedOutputArgs,
    },

    /// One hundred random Gaussian sources on a 300x500 image
    HundredGaussians {
        /// Leave out the Gaussian noise
        #[arg(long)]
        no_noise: bool,

        #[command(flatten)]
        output: SharedOutputArgs,
    },

    /// Draw a random Gaussian source table and print it as JSON
    RandomTable {
        /// Number of sources
        #[arg(long, default_value_t = 100)]
        count: usize,

        /// Total flux range (format: "lower,upper")
        #[arg(long, default_value = "500,1000")]
        flux: BoundsArg,

        /// Peak amplitude range; replaces the flux column when given
        #[arg(long)]
        amplitude: Option<BoundsArg>,

        /// x_mean range in pixels
        #[arg(long, default_value = "0,500")]
        x_mean: BoundsArg,

        /// y_mean range in pixels
        #[arg(long, default_value = "0,300")]
        y_mean: BoundsArg,

        /// x_stddev range in pixels
        #[arg(long, default_value = "1,5")]
        x_stddev: BoundsArg,

        /// y_stddev range in pixels
        #[arg(long, default_value = "1,5")]
        y_stddev: BoundsArg,

        /// Random seed; a fresh seed is drawn when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Write the JSON here instead of stdout
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Render a Gaussian source table loaded from JSON
    Render {
        /// Source table as produced by `random-table`
        #[arg(long)]
        table: PathBuf,

        /// Image shape (format: "NYxNX")
        #[arg(long, default_value = "300x500")]
        shape: ShapeArg,

        /// Sub-samples per pixel axis
        #[arg(long, default_value_t = 1)]
        oversample: usize,

        /// Add noise drawn from this distribution
        #[arg(long)]
        noise: Option<NoiseKind>,

        /// Noise mean
        #[arg(long, default_value_t = 0.0)]
        mean: f64,

        /// Noise standard deviation (Gaussian noise only)
        #[arg(long)]
        stddev: Option<f64>,

        /// Noise seed; a fresh seed is drawn when omitted
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        output: SharedOutputArgs,
    },
}

fn summarize(name: &str, image: &Array2<f64>) {
    let (ny, nx) = image.dim();
    let min = image.iter().copied().fold(f64::INFINITY, f64::min);
    let max = image.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = image.mean().unwrap_or(f64::NAN);
    info!("{name}: {ny}x{nx} pixels, min {min:.3}, max {max:.3}, mean {mean:.3}");
}

fn emit_image(
    name: &str,
    image: Array2<f64>,
    output: &SharedOutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    summarize(name, &image);

    let wcs = output.wcs.then(|| make_wcs(image.dim()));
    let hdu = make_imagehdu(&image, wcs.as_ref())?;
    for card in &hdu.header {
        log::debug!("{card}");
    }

    match &output.output {
        Some(path) => write_hdu(&hdu, path),
        None => Ok(()),
    }
}

#[cfg(feature = "fits")]
fn write_hdu(hdu: &datasets::ImageHdu, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    hdu.write_fits(path)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(not(feature = "fits"))]
fn write_hdu(_hdu: &datasets::ImageHdu, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    Err(format!(
        "cannot write {}: make_dataset was built without the `fits` feature",
        path.display()
    )
    .into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::FourGaussians { no_noise, output } => {
            emit_image("4gaussians", make_4gaussians_image(!no_noise), &output)?;
        }
        Command::HundredGaussians { no_noise, output } => {
            emit_image("100gaussians", make_100gaussians_image(!no_noise), &output)?;
        }
        Command::RandomTable {
            count,
            flux,
            amplitude,
            x_mean,
            y_mean,
            x_stddev,
            y_stddev,
            seed,
            json,
        } => {
            let ranges = GaussianRanges {
                flux: flux.0,
                amplitude: amplitude.map(|a| a.0),
                x_mean: x_mean.0,
                y_mean: y_mean.0,
                x_stddev: x_stddev.0,
                y_stddev: y_stddev.0,
            };
            let table = make_random_gaussians_table(count, &ranges, seed);
            let text = serde_json::to_string_pretty(&table)?;
            match json {
                Some(path) => {
                    fs::write(&path, text)?;
                    info!("Wrote {} sources to {}", table.len(), path.display());
                }
                None => println!("{text}"),
            }
        }
        Command::Render {
            table,
            shape,
            oversample,
            noise,
            mean,
            stddev,
            seed,
            output,
        } => {
            let sources: SourceTable = serde_json::from_str(&fs::read_to_string(&table)?)?;
            info!("Loaded {} sources from {}", sources.len(), table.display());

            let mut image = make_gaussian_sources_image(shape.0, &sources, oversample)?;
            if let Some(kind) = noise {
                image += &make_noise_image(shape.0, kind.into(), mean, stddev, seed)?;
            }
            emit_image("render", image, &output)?;
        }
    }

    Ok(())
}
