//! Rendering source tables onto pixel grids.
//!
//! Every row of a [`SourceTable`] is one source. Rendering substitutes the
//! row's values into a single shared [`ParametricModel`], evaluates it over
//! the grid and adds the result into the image. The model is never cloned:
//! its touched parameters are captured before the first row and written back
//! when rendering finishes, fails, or unwinds.
//!
//! # Discretization
//! - `oversample == 1`: the model is sampled at integer pixel coordinates and
//!   accumulated straight into the output. Small sources lose flux.
//! - `oversample > 1`: each pixel is the average of an
//!   `oversample x oversample` sub-grid, see [`discretize_oversample`].

use std::borrow::Cow;

use log::{debug, warn};
use ndarray::{Array2, ArrayD, ArrayViewMut2, Ix2};

use crate::error::{DatasetError, Result};
use crate::model::{discretize_oversample, Gaussian2D, ParametricModel};
use crate::shape::ImageShape;
use crate::table::SourceTable;

/// Where rendered sources go.
#[derive(Debug)]
pub enum RenderTarget<'a> {
    /// Allocate a new zero-filled grid of this shape
    Shape(ImageShape),
    /// Add into a caller-owned grid in place
    Buffer(ArrayViewMut2<'a, f64>),
}

impl<'a> RenderTarget<'a> {
    /// Use a dynamically-dimensioned array as the accumulation buffer.
    ///
    /// Fails with [`DatasetError::InvalidShape`] unless the array is 2D.
    pub fn from_dyn(buffer: &'a mut ArrayD<f64>) -> Result<Self> {
        let ndim = buffer.ndim();
        buffer
            .view_mut()
            .into_dimensionality::<Ix2>()
            .map(RenderTarget::Buffer)
            .map_err(|_| DatasetError::InvalidShape { ndim })
    }
}

impl From<ImageShape> for RenderTarget<'_> {
    fn from(shape: ImageShape) -> Self {
        RenderTarget::Shape(shape)
    }
}

impl From<(usize, usize)> for RenderTarget<'_> {
    fn from(dims: (usize, usize)) -> Self {
        RenderTarget::Shape(dims.into())
    }
}

impl<'a> From<&'a mut Array2<f64>> for RenderTarget<'a> {
    fn from(buffer: &'a mut Array2<f64>) -> Self {
        RenderTarget::Buffer(buffer.view_mut())
    }
}

/// Holds a model borrowed for rendering and writes captured parameter values
/// back when dropped.
///
/// Each parameter gets its own captured value back. Restoration runs on
/// normal return, on early return through `?`, and during unwinding.
/// Capture fails without touching the model if any named parameter cannot
/// be read, so every parameter later set through the guard is restored.
struct ParamRestore<'m, M: ParametricModel + ?Sized> {
    model: &'m mut M,
    saved: Vec<(String, f64)>,
}

impl<'m, M: ParametricModel + ?Sized> ParamRestore<'m, M> {
    fn capture<'n>(model: &'m mut M, names: impl IntoIterator<Item = &'n str>) -> Result<Self> {
        let saved = names
            .into_iter()
            .map(|name| match model.param(name) {
                Some(value) => Ok((name.to_string(), value)),
                None => Err(DatasetError::UnknownParameter {
                    name: name.to_string(),
                    model: model.name().to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { model, saved })
    }

    fn model(&self) -> &M {
        &*self.model
    }

    fn model_mut(&mut self) -> &mut M {
        &mut *self.model
    }
}

impl<M: ParametricModel + ?Sized> Drop for ParamRestore<'_, M> {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            if let Err(e) = self.model.set_param(name, *value) {
                warn!(
                    "Failed to restore parameter {} of model {}: {}",
                    name,
                    self.model.name(),
                    e
                );
            }
        }
    }
}

fn check_oversample(oversample: usize) -> Result<()> {
    if oversample == 0 {
        return Err(DatasetError::InvalidArgument(
            "oversample must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Add the sources of `table`, rendered through `model`, into `image`.
///
/// Only columns whose names exactly match one of `model.param_names()` are
/// applied; every other column is ignored. Model parameters without a
/// matching column keep whatever value the model has.
///
/// This is the allocation-free path for `oversample == 1`: values are
/// accumulated directly into `image`.
///
/// # Errors
/// * [`DatasetError::InvalidArgument`] if `oversample` is zero
/// * [`DatasetError::UnknownParameter`] if the model declares a matched
///   parameter but cannot report its current value; nothing is rendered
/// * [`DatasetError::Model`] if the model fails to evaluate; the image then
///   holds the sources rendered so far, and the model is still restored
pub fn add_model_sources<M>(
    mut image: ArrayViewMut2<'_, f64>,
    model: &mut M,
    table: &SourceTable,
    oversample: usize,
) -> Result<()>
where
    M: ParametricModel + ?Sized,
{
    check_oversample(oversample)?;

    let (ny, nx) = image.dim();
    let matched: Vec<(usize, &str)> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| model.has_param(&column.name))
        .map(|(idx, column)| (idx, column.name.as_str()))
        .collect();

    debug!(
        "Rendering {} sources through {} onto {}x{} grid (oversample {}), {} matched parameters",
        table.len(),
        model.name(),
        ny,
        nx,
        oversample,
        matched.len()
    );

    let mut guard = ParamRestore::capture(model, matched.iter().map(|&(_, name)| name))?;

    for row in table.rows() {
        for &(column, name) in &matched {
            guard.model_mut().set_param(name, row.get_at(column))?;
        }

        let model = guard.model();
        if oversample == 1 {
            for ((y, x), pixel) in image.indexed_iter_mut() {
                *pixel += model.evaluate(x as f64, y as f64)?;
            }
        } else {
            let grid = discretize_oversample(model, 0..nx as i64, 0..ny as i64, oversample)?;
            image += &grid;
        }
    }

    Ok(())
}

/// Make an image containing sources generated from a user-supplied model.
///
/// # Arguments
/// * `target` - Shape of a new image, or a buffer to add the sources into
/// * `model` - Model used for every source; restored to its original
///   parameter values before returning
/// * `table` - One row per source, columns named after model parameters
/// * `oversample` - Sub-samples per pixel axis, `1` for point sampling
///
/// # Returns
/// The rendered image. For a [`RenderTarget::Buffer`] the buffer holds the
/// result in place and a copy of it is returned; use [`add_model_sources`]
/// to skip that copy.
///
/// # Examples
/// ```
/// use datasets::model::Gaussian2D;
/// use datasets::{make_model_sources_image, SourceTable};
///
/// let table = SourceTable::new()
///     .with_column("x_mean", vec![10.0, 30.0]).unwrap()
///     .with_column("y_mean", vec![10.0, 5.0]).unwrap();
/// let mut model = Gaussian2D::new(5.0, 0.0, 0.0, 2.0, 2.0, 0.0);
///
/// let image = make_model_sources_image((20, 40), &mut model, &table, 1).unwrap();
/// assert_eq!(image[[10, 10]], 5.0);
/// assert_eq!(model.x_mean, 0.0);
/// ```
pub fn make_model_sources_image<'a, M>(
    target: impl Into<RenderTarget<'a>>,
    model: &mut M,
    table: &SourceTable,
    oversample: usize,
) -> Result<Array2<f64>>
where
    M: ParametricModel + ?Sized,
{
    match target.into() {
        RenderTarget::Shape(shape) => {
            let mut image = shape.zeros();
            add_model_sources(image.view_mut(), model, table, oversample)?;
            Ok(image)
        }
        RenderTarget::Buffer(mut buffer) => {
            add_model_sources(buffer.view_mut(), model, table, oversample)?;
            Ok(buffer.to_owned())
        }
    }
}

/// Rewrite a Gaussian source table into the peak-amplitude convention.
///
/// A `flux` column is converted per row with
/// `amplitude = flux / (2π x_stddev y_stddev)` and removed; an existing
/// `amplitude` column is then overwritten. Tables that already use
/// `amplitude` are borrowed unchanged.
pub fn normalize_gaussian_table(table: &SourceTable) -> Result<Cow<'_, SourceTable>> {
    let Some(flux) = table.column("flux") else {
        if table.has_column("amplitude") {
            return Ok(Cow::Borrowed(table));
        }
        return Err(DatasetError::MissingColumn(
            "either \"amplitude\" or \"flux\"".to_string(),
        ));
    };

    let x_stddev = table
        .column("x_stddev")
        .ok_or_else(|| DatasetError::MissingColumn("x_stddev".to_string()))?;
    let y_stddev = table
        .column("y_stddev")
        .ok_or_else(|| DatasetError::MissingColumn("y_stddev".to_string()))?;

    let amplitude: Vec<f64> = flux
        .iter()
        .zip(x_stddev.iter().zip(y_stddev))
        .map(|(&f, (&sx, &sy))| Gaussian2D::amplitude_for_flux(f, sx, sy))
        .collect();

    let mut normalized = table.clone();
    normalized.remove_column("flux");
    normalized.add_column("amplitude", amplitude)?;
    Ok(Cow::Owned(normalized))
}

/// Make an image containing 2D Gaussian sources.
///
/// `table` must have a `flux` or `amplitude` column plus `x_mean`,
/// `y_mean`, `x_stddev`, `y_stddev` and `theta` (radians). When both `flux`
/// and `amplitude` are present, `amplitude` is ignored. The caller's table is
/// left untouched.
///
/// # Examples
/// ```
/// use datasets::{make_gaussian_sources_image, Brightness, GaussianSource, SourceTable};
///
/// let table = SourceTable::from_gaussians(&[GaussianSource {
///     brightness: Brightness::Flux(1000.0),
///     x_mean: 25.0,
///     y_mean: 25.0,
///     x_stddev: 3.0,
///     y_stddev: 3.0,
///     theta: 0.0,
/// }]);
/// let image = make_gaussian_sources_image((50, 50), &table, 1).unwrap();
/// assert!((image.sum() - 1000.0).abs() < 1.0);
/// ```
pub fn make_gaussian_sources_image(
    shape: impl Into<ImageShape>,
    table: &SourceTable,
    oversample: usize,
) -> Result<Array2<f64>> {
    let table = normalize_gaussian_table(table)?;
    let mut model = Gaussian2D::default();
    make_model_sources_image(shape.into(), &mut model, &table, oversample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelError;
    use crate::table::{Brightness, GaussianSource};
    use approx::assert_relative_eq;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    /// Constant model that panics when its level goes negative
    #[derive(Debug, Clone, PartialEq)]
    struct PanickyConst {
        level: f64,
    }

    impl ParametricModel for PanickyConst {
        fn name(&self) -> &str {
            "PanickyConst"
        }

        fn param_names(&self) -> &[&str] {
            &["level"]
        }

        fn param(&self, name: &str) -> Option<f64> {
            (name == "level").then_some(self.level)
        }

        fn set_param(&mut self, name: &str, value: f64) -> std::result::Result<(), ModelError> {
            if name != "level" {
                return Err(ModelError::UnknownParameter {
                    model: self.name().to_string(),
                    name: name.to_string(),
                });
            }
            self.level = value;
            Ok(())
        }

        fn evaluate(&self, _x: f64, _y: f64) -> std::result::Result<f64, ModelError> {
            assert!(self.level >= 0.0, "negative level");
            Ok(self.level)
        }
    }

    /// Declares `gain` but never reports its value
    struct HiddenGain {
        level: f64,
        gain: f64,
    }

    impl ParametricModel for HiddenGain {
        fn name(&self) -> &str {
            "HiddenGain"
        }

        fn param_names(&self) -> &[&str] {
            &["level", "gain"]
        }

        fn param(&self, name: &str) -> Option<f64> {
            (name == "level").then_some(self.level)
        }

        fn set_param(&mut self, name: &str, value: f64) -> std::result::Result<(), ModelError> {
            match name {
                "level" => self.level = value,
                _ => self.gain = value,
            }
            Ok(())
        }

        fn evaluate(&self, _x: f64, _y: f64) -> std::result::Result<f64, ModelError> {
            Ok(self.level * self.gain)
        }
    }

    fn original_model() -> Gaussian2D {
        Gaussian2D::new(7.0, 3.0, 4.0, 2.0, 1.5, 0.25)
    }

    fn two_source_table() -> SourceTable {
        SourceTable::new()
            .with_column("amplitude", vec![10.0, 20.0])
            .unwrap()
            .with_column("x_mean", vec![5.0, 15.0])
            .unwrap()
            .with_column("y_mean", vec![5.0, 8.0])
            .unwrap()
            .with_column("x_stddev", vec![1.0, 2.0])
            .unwrap()
    }

    #[test]
    fn test_model_restored_after_success() {
        let mut model = original_model();
        let image = make_model_sources_image((12, 20), &mut model, &two_source_table(), 1).unwrap();

        assert_eq!(model, original_model());
        assert_relative_eq!(image[[5, 5]], 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_model_restored_after_failure() {
        let mut model = original_model();
        let table = two_source_table()
            .with_column("y_stddev", vec![1.0, -1.0])
            .unwrap();

        let result = make_model_sources_image((12, 20), &mut model, &table, 1);
        assert!(matches!(
            result,
            Err(DatasetError::Model(ModelError::InvalidParameter { .. }))
        ));

        // Every parameter gets its own original value back
        assert_eq!(model, original_model());
    }

    #[test]
    fn test_model_restored_after_failure_with_oversampling() {
        let mut model = original_model();
        let table = two_source_table()
            .with_column("y_stddev", vec![1.0, 0.0])
            .unwrap();

        assert!(make_model_sources_image((12, 20), &mut model, &table, 4).is_err());
        assert_eq!(model, original_model());
    }

    #[test]
    fn test_model_restored_after_panic() {
        let mut model = PanickyConst { level: 2.5 };
        let table = SourceTable::new()
            .with_column("level", vec![1.0, -1.0])
            .unwrap();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            make_model_sources_image((3, 3), &mut model, &table, 1)
        }));

        assert!(outcome.is_err());
        assert_eq!(model.level, 2.5);
    }

    #[test]
    fn test_unreadable_parameter_fails_before_rendering() {
        let mut model = HiddenGain {
            level: 1.0,
            gain: 3.0,
        };
        let table = SourceTable::new()
            .with_column("level", vec![4.0, 5.0])
            .unwrap()
            .with_column("gain", vec![10.0, 20.0])
            .unwrap();

        let mut buffer = Array2::<f64>::zeros((2, 2));
        let result = add_model_sources(buffer.view_mut(), &mut model, &table, 1);

        match result {
            Err(DatasetError::UnknownParameter { name, model }) => {
                assert_eq!(name, "gain");
                assert_eq!(model, "HiddenGain");
            }
            other => panic!("expected UnknownParameter, got {other:?}"),
        }
        assert_eq!(model.level, 1.0);
        assert_eq!(model.gain, 3.0);
        assert!(buffer.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_unmatched_params_keep_model_values() {
        // theta and y_stddev come from the model, not the table
        let mut model = Gaussian2D::new(1.0, 0.0, 0.0, 1.0, 3.0, 0.0);
        let table = SourceTable::new()
            .with_column("x_mean", vec![10.0])
            .unwrap()
            .with_column("y_mean", vec![10.0])
            .unwrap();

        let image = make_model_sources_image((21, 21), &mut model, &table, 1).unwrap();
        let expected = Gaussian2D::new(1.0, 10.0, 10.0, 1.0, 3.0, 0.0)
            .evaluate(10.0, 13.0)
            .unwrap();
        assert_relative_eq!(image[[13, 10]], expected);
    }

    #[test]
    fn test_extra_columns_do_not_change_image() {
        let table = two_source_table();
        let padded = table
            .clone()
            .with_column("flux_err", vec![1.0e6, -3.0])
            .unwrap()
            .with_column("Amplitude", vec![0.0, 0.0])
            .unwrap();

        let plain = make_model_sources_image((12, 20), &mut original_model(), &table, 1).unwrap();
        let extra = make_model_sources_image((12, 20), &mut original_model(), &padded, 1).unwrap();
        assert_eq!(plain, extra);
    }

    #[test]
    fn test_buffer_is_added_into() {
        let table = two_source_table();
        let rendered =
            make_model_sources_image((12, 20), &mut original_model(), &table, 1).unwrap();

        let mut buffer = Array2::<f64>::from_elem((12, 20), 1.5);
        let returned =
            make_model_sources_image(&mut buffer, &mut original_model(), &table, 1).unwrap();

        assert_eq!(returned, buffer);
        for (sum, single) in buffer.iter().zip(rendered.iter()) {
            assert_relative_eq!(*sum, single + 1.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dyn_buffer_must_be_2d() {
        let mut cube = ArrayD::<f64>::zeros(vec![2, 3, 4]);
        assert!(matches!(
            RenderTarget::from_dyn(&mut cube),
            Err(DatasetError::InvalidShape { ndim: 3 })
        ));

        let mut flat = ArrayD::<f64>::zeros(vec![4, 6]);
        let target = RenderTarget::from_dyn(&mut flat).unwrap();
        let table = SourceTable::new().with_column("x_mean", vec![2.0]).unwrap();
        make_model_sources_image(target, &mut Gaussian2D::default(), &table, 1).unwrap();
        assert_eq!(flat[&[0, 2][..]], 1.0);
    }

    #[test]
    fn test_zero_oversample_rejected() {
        let mut model = original_model();
        assert!(matches!(
            make_model_sources_image((4, 4), &mut model, &two_source_table(), 0),
            Err(DatasetError::InvalidArgument(_))
        ));
        assert_eq!(model, original_model());
    }

    #[test]
    fn test_empty_table_renders_zeros() {
        let image =
            make_model_sources_image((4, 5), &mut original_model(), &SourceTable::new(), 3)
                .unwrap();
        assert_eq!(image, Array2::<f64>::zeros((4, 5)));
    }

    #[test]
    fn test_gaussian_flux_is_preserved() {
        let table = SourceTable::from_gaussians(&[GaussianSource {
            brightness: Brightness::Flux(500.0),
            x_mean: 30.0,
            y_mean: 25.0,
            x_stddev: 2.0,
            y_stddev: 2.0,
            theta: 0.0,
        }]);

        let image = make_gaussian_sources_image((50, 60), &table, 1).unwrap();
        assert_relative_eq!(image.sum(), 500.0, epsilon = 0.5);
    }

    #[test]
    fn test_oversampling_tightens_flux_of_small_gaussian() {
        let table = SourceTable::from_gaussians(&[GaussianSource {
            brightness: Brightness::Flux(100.0),
            x_mean: 10.3,
            y_mean: 9.6,
            x_stddev: 0.35,
            y_stddev: 0.4,
            theta: 0.0,
        }]);

        let point = make_gaussian_sources_image((20, 20), &table, 1).unwrap().sum();
        let fine = make_gaussian_sources_image((20, 20), &table, 10).unwrap().sum();

        assert!((fine - 100.0).abs() < (point - 100.0).abs());
        assert_relative_eq!(fine, 100.0, epsilon = 0.5);
    }

    #[test]
    fn test_flux_wins_over_amplitude() {
        let base = SourceTable::new()
            .with_column("x_mean", vec![5.0])
            .unwrap()
            .with_column("y_mean", vec![5.0])
            .unwrap()
            .with_column("x_stddev", vec![1.0])
            .unwrap()
            .with_column("y_stddev", vec![2.0])
            .unwrap()
            .with_column("theta", vec![0.0])
            .unwrap();
        let both = base
            .clone()
            .with_column("amplitude", vec![1.0e9])
            .unwrap()
            .with_column("flux", vec![100.0])
            .unwrap();

        let image = make_gaussian_sources_image((11, 11), &both, 1).unwrap();
        assert_relative_eq!(image[[5, 5]], 100.0 / (2.0 * std::f64::consts::PI * 2.0));

        // The caller's table is untouched
        assert_eq!(both.column("amplitude"), Some(&[1.0e9][..]));
        assert!(both.has_column("flux"));
    }

    #[test]
    fn test_missing_brightness_column() {
        let table = SourceTable::new().with_column("x_mean", vec![5.0]).unwrap();
        assert!(matches!(
            make_gaussian_sources_image((4, 4), &table, 1),
            Err(DatasetError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_flux_needs_stddev_columns() {
        let table = SourceTable::new()
            .with_column("flux", vec![5.0])
            .unwrap()
            .with_column("x_stddev", vec![1.0])
            .unwrap();
        assert!(matches!(
            normalize_gaussian_table(&table),
            Err(DatasetError::MissingColumn(ref name)) if name == "y_stddev"
        ));
    }

    #[test]
    fn test_amplitude_table_is_borrowed() {
        let table = SourceTable::new()
            .with_column("amplitude", vec![5.0])
            .unwrap();
        assert!(matches!(
            normalize_gaussian_table(&table).unwrap(),
            Cow::Borrowed(_)
        ));
    }
}
