//! In-memory FITS image containers.
//!
//! [`ImageHdu`] pairs a 2D image with the header cards that describe it. With
//! the `fits` feature enabled it can be written to disk as a FITS file.

use std::fmt;

use ndarray::{Array2, ArrayBase, Data, Dimension, Ix2};

use crate::error::{DatasetError, Result};
use crate::wcs::Wcs;

/// Value of a FITS header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Int(v) => write!(f, "{v}"),
            HeaderValue::Float(v) => write!(f, "{v:?}"),
            HeaderValue::Text(v) => write!(f, "'{v}'"),
        }
    }
}

/// A single `KEY = value / comment` header record.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCard {
    pub key: String,
    pub value: HeaderValue,
    pub comment: String,
}

impl HeaderCard {
    pub fn new(key: impl Into<String>, value: HeaderValue, comment: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value,
            comment: comment.into(),
        }
    }
}

impl fmt::Display for HeaderCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}= {} / {}", self.key, self.value, self.comment)
    }
}

/// A 2D image with its header cards.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHdu {
    pub data: Array2<f64>,
    pub header: Vec<HeaderCard>,
}

impl ImageHdu {
    /// Look up a header card value by key
    pub fn header_value(&self, key: &str) -> Option<&HeaderValue> {
        self.header.iter().find(|c| c.key == key).map(|c| &c.value)
    }

    /// Write the image and its header as an `IMAGE` extension of a new FITS
    /// file, replacing any existing file at `path`.
    ///
    /// Array row 0 becomes FITS row 1, so pixel coordinates agree with the
    /// WCS convention used by [`Wcs`].
    #[cfg(feature = "fits")]
    pub fn write_fits<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        use fitsio::compat::fitsfile::FitsFile;
        use fitsio::compat::images::{ImageDescription, ImageType, WriteImage};

        let (height, width) = self.data.dim();
        let mut fptr = FitsFile::create(&path).overwrite().open()?;
        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: vec![width, height],
        };
        let hdu = fptr.create_image("IMAGE", &description)?;

        let flat: Vec<f64> = self.data.iter().copied().collect();
        f64::write_image(&mut fptr, &hdu, &flat)?;

        for card in &self.header {
            match &card.value {
                HeaderValue::Int(v) => hdu.write_key(&mut fptr, &card.key, v)?,
                HeaderValue::Float(v) => hdu.write_key(&mut fptr, &card.key, v)?,
                HeaderValue::Text(v) => hdu.write_key(&mut fptr, &card.key, v)?,
            }
        }

        log::debug!(
            "Wrote {}x{} image with {} header cards to {}",
            height,
            width,
            self.header.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Wrap an image in an [`ImageHdu`], attaching the WCS header if given.
///
/// # Errors
/// [`DatasetError::InvalidShape`] unless `data` is 2-dimensional.
///
/// # Examples
/// ```
/// use datasets::{make_4gaussians_image, make_imagehdu, make_wcs};
///
/// let image = make_4gaussians_image(false);
/// let wcs = make_wcs(image.dim());
/// let hdu = make_imagehdu(&image, Some(&wcs)).unwrap();
/// assert_eq!(hdu.data.dim(), (100, 200));
/// assert!(!hdu.header.is_empty());
/// ```
pub fn make_imagehdu<S, D>(data: &ArrayBase<S, D>, wcs: Option<&Wcs>) -> Result<ImageHdu>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let data = data
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| DatasetError::InvalidShape { ndim: data.ndim() })?
        .to_owned();

    Ok(ImageHdu {
        data,
        header: wcs.map(Wcs::to_header).unwrap_or_default(),
    })
}
