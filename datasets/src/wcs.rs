//! Gnomonic (TAN) world coordinate system for example images.
//!
//! Pixel coordinates passed to and returned from [`Wcs`] are 0-based array
//! coordinates: `x` is the column index and `y` the row index, with `(0, 0)`
//! at the center of the first pixel. FITS pixel coordinates are these plus
//! one, which is the convention `crpix` is stored in.

use std::f64::consts::PI;

use nalgebra::{Matrix2, Vector2};

use crate::hdu::{HeaderCard, HeaderValue};
use crate::shape::ImageShape;

/// Reference sky position used by [`make_wcs`], degrees
const REFERENCE_RA: f64 = 197.8925;
const REFERENCE_DEC: f64 = -1.365_555_56;
/// Pixel scale used by [`make_wcs`]: 0.1 arcsec per pixel
const PIXEL_SCALE_DEG: f64 = 0.1 / 3600.0;
/// Rotation of the pixel grid relative to north
const ROTATION: f64 = PI / 3.0;

/// Celestial TAN projection with a linear CD matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    /// Image extent `(nx, ny)` in FITS axis order
    pub naxis: [usize; 2],
    /// Reference pixel, 1-based FITS convention
    pub crpix: [f64; 2],
    /// Sky coordinates (RA, Dec) of the reference pixel, degrees
    pub crval: [f64; 2],
    /// Pixel to intermediate world coordinate matrix, degrees per pixel
    pub cd: Matrix2<f64>,
    pub ctype: [String; 2],
    pub cunit: [String; 2],
    pub radesys: String,
}

/// Make an example TAN world coordinate system for an image.
///
/// The reference pixel sits at the image center (`crpix = [nx/2, ny/2]`),
/// the pixel scale is 0.1 arcsec and the grid is rotated by 60 degrees.
///
/// # Examples
/// ```
/// use datasets::make_wcs;
///
/// let wcs = make_wcs((100, 200));
/// assert_eq!(wcs.naxis, [200, 100]);
/// assert_eq!(wcs.crpix, [100.0, 50.0]);
/// ```
pub fn make_wcs(shape: impl Into<ImageShape>) -> Wcs {
    let shape = shape.into();
    let (sin_rho, cos_rho) = ROTATION.sin_cos();
    let s = PIXEL_SCALE_DEG;

    Wcs {
        naxis: [shape.nx, shape.ny],
        crpix: [shape.nx as f64 / 2.0, shape.ny as f64 / 2.0],
        crval: [REFERENCE_RA, REFERENCE_DEC],
        cd: Matrix2::new(-s * cos_rho, s * sin_rho, s * sin_rho, s * cos_rho),
        ctype: ["RA---TAN".to_string(), "DEC--TAN".to_string()],
        cunit: ["deg".to_string(), "deg".to_string()],
        radesys: "ICRS".to_string(),
    }
}

impl Wcs {
    /// Convert 0-based pixel coordinates to sky coordinates.
    ///
    /// # Returns
    /// `(ra, dec)` in degrees, with `ra` wrapped into `[0, 360)`
    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        let offset = Vector2::new(x + 1.0 - self.crpix[0], y + 1.0 - self.crpix[1]);
        let intermediate = self.cd * offset;
        let xi = intermediate.x.to_radians();
        let eta = intermediate.y.to_radians();

        let ra0 = self.crval[0].to_radians();
        let dec0 = self.crval[1].to_radians();
        let rho = xi.hypot(eta);
        if rho == 0.0 {
            return (self.crval[0], self.crval[1]);
        }

        let c = rho.atan();
        let (sin_c, cos_c) = c.sin_cos();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();

        let dec = (cos_c * sin_dec0 + eta * sin_c * cos_dec0 / rho).asin();
        let ra = ra0 + (xi * sin_c).atan2(rho * cos_dec0 * cos_c - eta * sin_dec0 * sin_c);

        (ra.to_degrees().rem_euclid(360.0), dec.to_degrees())
    }

    /// Convert sky coordinates in degrees to 0-based pixel coordinates.
    ///
    /// Returns `None` for points on or behind the projection horizon (more
    /// than 90 degrees from the reference position) or when the CD matrix is
    /// singular.
    pub fn world_to_pixel(&self, ra: f64, dec: f64) -> Option<(f64, f64)> {
        let (ra, dec) = (ra.to_radians(), dec.to_radians());
        let ra0 = self.crval[0].to_radians();
        let dec0 = self.crval[1].to_radians();

        let (sin_dec, cos_dec) = dec.sin_cos();
        let (sin_dec0, cos_dec0) = dec0.sin_cos();
        let (sin_da, cos_da) = (ra - ra0).sin_cos();

        let denom = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_da;
        if denom <= 1e-12 {
            return None;
        }
        let xi = cos_dec * sin_da / denom;
        let eta = (sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_da) / denom;

        let intermediate = Vector2::new(xi.to_degrees(), eta.to_degrees());
        let offset = self.cd.try_inverse()? * intermediate;
        Some((offset.x + self.crpix[0] - 1.0, offset.y + self.crpix[1] - 1.0))
    }

    /// Angular size of a pixel along each axis, degrees
    pub fn pixel_scale(&self) -> (f64, f64) {
        (self.cd.column(0).norm(), self.cd.column(1).norm())
    }

    /// FITS header cards describing this coordinate system
    pub fn to_header(&self) -> Vec<HeaderCard> {
        let mut cards = vec![HeaderCard::new(
            "WCSAXES",
            HeaderValue::Int(2),
            "Number of coordinate axes",
        )];
        for axis in 0..2 {
            let n = axis + 1;
            cards.push(HeaderCard::new(
                format!("CRPIX{n}"),
                HeaderValue::Float(self.crpix[axis]),
                "Pixel coordinate of reference point",
            ));
        }
        for row in 0..2 {
            for col in 0..2 {
                cards.push(HeaderCard::new(
                    format!("CD{}_{}", row + 1, col + 1),
                    HeaderValue::Float(self.cd[(row, col)]),
                    "Coordinate transformation matrix element",
                ));
            }
        }
        for axis in 0..2 {
            cards.push(HeaderCard::new(
                format!("CUNIT{}", axis + 1),
                HeaderValue::Text(self.cunit[axis].clone()),
                "Units of coordinate increment and value",
            ));
        }
        for axis in 0..2 {
            cards.push(HeaderCard::new(
                format!("CTYPE{}", axis + 1),
                HeaderValue::Text(self.ctype[axis].clone()),
                "Gnomonic projection",
            ));
        }
        for axis in 0..2 {
            cards.push(HeaderCard::new(
                format!("CRVAL{}", axis + 1),
                HeaderValue::Float(self.crval[axis]),
                "[deg] Coordinate value at reference point",
            ));
        }
        cards.push(HeaderCard::new(
            "RADESYS",
            HeaderValue::Text(self.radesys.clone()),
            "Equatorial coordinate system",
        ));
        cards
    }
}
