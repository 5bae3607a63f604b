use crate::noise::NoiseDistribution;
use crate::random_tables::Bounds;
use crate::shape::ImageShape;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Parse an image shape string in format "NYxNX" (rows first)
fn parse_shape(s: &str) -> Result<ImageShape, String> {
    let (ny, nx) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "Shape must be in format 'NYxNX', e.g. '300x500'".to_string())?;

    let ny = ny
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid row count: {ny}"))?;
    let nx = nx
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid column count: {nx}"))?;

    Ok(ImageShape::new(ny, nx))
}

/// Parse a uniform range string in format "lower,upper"
fn parse_bounds(s: &str) -> Result<Bounds, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Range must be in format 'lower,upper'".to_string());
    }

    let lower = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid lower bound: {}", parts[0]))?;
    let upper = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid upper bound: {}", parts[1]))?;

    if !lower.is_finite() || !upper.is_finite() {
        return Err("Range bounds must be finite".to_string());
    }
    Ok((lower, upper))
}

/// Image shape argument, e.g. "300x500"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeArg(pub ImageShape);

impl std::str::FromStr for ShapeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_shape(s).map(ShapeArg)
    }
}

impl std::fmt::Display for ShapeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uniform range argument, e.g. "500,1000"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsArg(pub Bounds);

impl std::str::FromStr for BoundsArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bounds(s).map(BoundsArg)
    }
}

impl std::fmt::Display for BoundsArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.0 .0, self.0 .1)
    }
}

/// Noise distributions selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum NoiseKind {
    /// Normal distribution; needs --stddev
    Gaussian,
    /// Poisson distribution with the given mean
    Poisson,
}

impl std::fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", NoiseDistribution::from(*self))
    }
}

impl From<NoiseKind> for NoiseDistribution {
    fn from(kind: NoiseKind) -> Self {
        match kind {
            NoiseKind::Gaussian => NoiseDistribution::Gaussian,
            NoiseKind::Poisson => NoiseDistribution::Poisson,
        }
    }
}

/// Output options shared by every image-producing subcommand
#[derive(Args, Debug, Clone)]
pub struct SharedOutputArgs {
    /// Write the image, with its WCS header, to this FITS file
    /// (requires the `fits` feature)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Attach an example TAN world coordinate system to the image header
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub wcs: bool,
}
