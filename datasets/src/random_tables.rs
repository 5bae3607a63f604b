//! Source tables drawn from uniform parameter ranges.
//!
//! Columns are drawn one after another, each completely before the next, so
//! a table is fully determined by its seed and arguments.

use std::f64::consts::PI;

use log::debug;
use rand::Rng;

use crate::error::{DatasetError, Result};
use crate::model::ParametricModel;
use crate::random::{rng_from_seed, uniform_values};
use crate::table::SourceTable;

/// `(lower, upper)` bounds of a uniform distribution
pub type Bounds = (f64, f64);

/// Parameter ranges for [`make_random_gaussians_table`].
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianRanges {
    /// Total flux; ignored when `amplitude` is given
    pub flux: Bounds,
    /// Peak amplitude; takes precedence over `flux`
    pub amplitude: Option<Bounds>,
    pub x_mean: Bounds,
    pub y_mean: Bounds,
    pub x_stddev: Bounds,
    pub y_stddev: Bounds,
}

/// Make a table of randomly generated 2D Gaussian sources.
///
/// Columns, in draw order: `flux` (or `amplitude` when
/// `ranges.amplitude` is set), `x_mean`, `y_mean`, `x_stddev`, `y_stddev`,
/// `theta`. `theta` is always drawn from `[0, 2π)`.
///
/// The table can be passed to
/// [`make_gaussian_sources_image`](crate::make_gaussian_sources_image).
///
/// # Examples
/// ```
/// use datasets::{make_random_gaussians_table, GaussianRanges};
///
/// let ranges = GaussianRanges {
///     flux: (500.0, 1000.0),
///     amplitude: None,
///     x_mean: (0.0, 500.0),
///     y_mean: (0.0, 300.0),
///     x_stddev: (1.0, 5.0),
///     y_stddev: (1.0, 5.0),
/// };
/// let table = make_random_gaussians_table(100, &ranges, Some(12345));
/// assert_eq!(table.len(), 100);
/// assert!(table.has_column("flux"));
/// ```
pub fn make_random_gaussians_table(
    n_sources: usize,
    ranges: &GaussianRanges,
    seed: Option<u64>,
) -> SourceTable {
    make_random_gaussians_table_with_rng(n_sources, ranges, &mut rng_from_seed(seed))
}

/// [`make_random_gaussians_table`] drawing from a caller-supplied generator.
pub fn make_random_gaussians_table_with_rng<R: Rng>(
    n_sources: usize,
    ranges: &GaussianRanges,
    rng: &mut R,
) -> SourceTable {
    let mut table = SourceTable::new();

    match ranges.amplitude {
        Some(amplitude) => {
            table.push_column("amplitude", uniform_values(rng, amplitude, n_sources))
        }
        None => table.push_column("flux", uniform_values(rng, ranges.flux, n_sources)),
    }
    table.push_column("x_mean", uniform_values(rng, ranges.x_mean, n_sources));
    table.push_column("y_mean", uniform_values(rng, ranges.y_mean, n_sources));
    table.push_column("x_stddev", uniform_values(rng, ranges.x_stddev, n_sources));
    table.push_column("y_stddev", uniform_values(rng, ranges.y_stddev, n_sources));
    table.push_column("theta", uniform_values(rng, (0.0, 2.0 * PI), n_sources));

    debug!("Drew {} random Gaussian sources", n_sources);
    table
}

/// Make a table of random parameters for sources of an arbitrary model.
///
/// One column per entry of `param_ranges`, in slice order. Every name must
/// be a parameter of `model`; this is checked before anything is drawn.
///
/// # Errors
/// * [`DatasetError::UnknownParameter`] for a name `model` does not declare
/// * [`DatasetError::InvalidArgument`] for a name listed twice
pub fn make_random_models_table<M>(
    model: &M,
    n_sources: usize,
    param_ranges: &[(&str, Bounds)],
    seed: Option<u64>,
) -> Result<SourceTable>
where
    M: ParametricModel + ?Sized,
{
    make_random_models_table_with_rng(model, n_sources, param_ranges, &mut rng_from_seed(seed))
}

/// [`make_random_models_table`] drawing from a caller-supplied generator.
pub fn make_random_models_table_with_rng<M, R>(
    model: &M,
    n_sources: usize,
    param_ranges: &[(&str, Bounds)],
    rng: &mut R,
) -> Result<SourceTable>
where
    M: ParametricModel + ?Sized,
    R: Rng,
{
    for (idx, &(name, _)) in param_ranges.iter().enumerate() {
        if !model.has_param(name) {
            return Err(DatasetError::UnknownParameter {
                name: name.to_string(),
                model: model.name().to_string(),
            });
        }
        if param_ranges[..idx].iter().any(|&(other, _)| other == name) {
            return Err(DatasetError::InvalidArgument(format!(
                "parameter {name} is listed more than once"
            )));
        }
    }

    let mut table = SourceTable::new();
    for &(name, bounds) in param_ranges {
        table.push_column(name, uniform_values(rng, bounds, n_sources));
    }

    debug!(
        "Drew {} random {} sources over {} parameters",
        n_sources,
        model.name(),
        param_ranges.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gaussian2D, ModelError};

    /// Flat model with a single `level` parameter
    struct Const2D {
        level: f64,
    }

    impl ParametricModel for Const2D {
        fn name(&self) -> &str {
            "Const2D"
        }

        fn param_names(&self) -> &[&str] {
            &["level"]
        }

        fn param(&self, name: &str) -> Option<f64> {
            (name == "level").then_some(self.level)
        }

        fn set_param(&mut self, _name: &str, value: f64) -> std::result::Result<(), ModelError> {
            self.level = value;
            Ok(())
        }

        fn evaluate(&self, _x: f64, _y: f64) -> std::result::Result<f64, ModelError> {
            Ok(self.level)
        }
    }

    fn ranges() -> GaussianRanges {
        GaussianRanges {
            flux: (500.0, 1000.0),
            amplitude: None,
            x_mean: (0.0, 500.0),
            y_mean: (0.0, 300.0),
            x_stddev: (1.0, 5.0),
            y_stddev: (1.0, 5.0),
        }
    }

    fn assert_within(values: &[f64], (lower, upper): Bounds) {
        for &v in values {
            assert!(v >= lower && v < upper, "{v} outside [{lower}, {upper})");
        }
    }

    #[test]
    fn test_gaussian_table_columns_and_bounds() {
        let table = make_random_gaussians_table(50, &ranges(), Some(1));
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            ["flux", "x_mean", "y_mean", "x_stddev", "y_stddev", "theta"]
        );
        assert_eq!(table.len(), 50);
        assert_within(table.column("flux").unwrap(), (500.0, 1000.0));
        assert_within(table.column("x_mean").unwrap(), (0.0, 500.0));
        assert_within(table.column("y_stddev").unwrap(), (1.0, 5.0));
        assert_within(table.column("theta").unwrap(), (0.0, 2.0 * PI));
    }

    #[test]
    fn test_amplitude_range_takes_precedence() {
        let with_amplitude = GaussianRanges {
            amplitude: Some((10.0, 20.0)),
            ..ranges()
        };
        let table = make_random_gaussians_table(10, &with_amplitude, Some(2));
        assert!(table.has_column("amplitude"));
        assert!(!table.has_column("flux"));
        assert_within(table.column("amplitude").unwrap(), (10.0, 20.0));
    }

    #[test]
    fn test_gaussian_table_is_deterministic() {
        let a = make_random_gaussians_table(100, &ranges(), Some(12345));
        let b = make_random_gaussians_table(100, &ranges(), Some(12345));
        let c = make_random_gaussians_table(100, &ranges(), Some(54321));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_draw_order_is_column_major() {
        // The flux column consumes the first n draws of the stream
        let table = make_random_gaussians_table(5, &ranges(), Some(99));
        let mut rng = rng_from_seed(Some(99));
        let flux = uniform_values(&mut rng, (500.0, 1000.0), 5);
        let x_mean = uniform_values(&mut rng, (0.0, 500.0), 5);
        assert_eq!(table.column("flux").unwrap(), flux.as_slice());
        assert_eq!(table.column("x_mean").unwrap(), x_mean.as_slice());
    }

    #[test]
    fn test_gaussian_tables_continue_a_shared_stream() {
        let mut rng = rng_from_seed(Some(31));
        let first = make_random_gaussians_table_with_rng(4, &ranges(), &mut rng);
        let second = make_random_gaussians_table_with_rng(4, &ranges(), &mut rng);

        assert_eq!(first, make_random_gaussians_table(4, &ranges(), Some(31)));
        assert_ne!(second, make_random_gaussians_table(4, &ranges(), Some(31)));

        // Skip the 6 columns of the first table, then rebuild the second
        let mut reference_rng = rng_from_seed(Some(31));
        uniform_values(&mut reference_rng, (0.0, 1.0), 6 * 4);
        let bounds = [
            ("flux", (500.0, 1000.0)),
            ("x_mean", (0.0, 500.0)),
            ("y_mean", (0.0, 300.0)),
            ("x_stddev", (1.0, 5.0)),
            ("y_stddev", (1.0, 5.0)),
            ("theta", (0.0, 2.0 * PI)),
        ];
        let mut expected = SourceTable::new();
        for (name, range) in bounds {
            expected.push_column(name, uniform_values(&mut reference_rng, range, 4));
        }
        assert_eq!(second, expected);
    }

    #[test]
    fn test_models_tables_continue_a_shared_stream() {
        let model = Gaussian2D::default();
        let param_ranges = [("x_mean", (0.0, 50.0)), ("amplitude", (1.0, 2.0))];

        let mut rng = rng_from_seed(Some(32));
        let first = make_random_models_table_with_rng(&model, 3, &param_ranges, &mut rng).unwrap();
        let second = make_random_models_table_with_rng(&model, 3, &param_ranges, &mut rng).unwrap();

        let fresh = make_random_models_table(&model, 3, &param_ranges, Some(32)).unwrap();
        assert_eq!(first, fresh);
        assert_ne!(second, fresh);

        let mut reference_rng = rng_from_seed(Some(32));
        uniform_values(&mut reference_rng, (0.0, 1.0), 2 * 3);
        let mut expected = SourceTable::new();
        for (name, range) in param_ranges {
            expected.push_column(name, uniform_values(&mut reference_rng, range, 3));
        }
        assert_eq!(second, expected);
    }

    #[test]
    fn test_rejected_models_table_draws_nothing() {
        let model = Const2D { level: 1.0 };
        let mut rng = rng_from_seed(Some(33));
        let result = make_random_models_table_with_rng(
            &model,
            5,
            &[("level", (0.0, 1.0)), ("radius", (1.0, 2.0))],
            &mut rng,
        );
        assert!(matches!(result, Err(DatasetError::UnknownParameter { .. })));

        let level = [("level", (0.0, 1.0))];
        let table = make_random_models_table_with_rng(&model, 5, &level, &mut rng).unwrap();
        let fresh = make_random_models_table(&model, 5, &level, Some(33)).unwrap();
        assert_eq!(table, fresh);
    }

    #[test]
    fn test_models_table_follows_range_order() {
        let model = Gaussian2D::default();
        let table = make_random_models_table(
            &model,
            20,
            &[("y_mean", (0.0, 10.0)), ("amplitude", (1.0, 2.0))],
            Some(3),
        )
        .unwrap();

        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            ["y_mean", "amplitude"]
        );
        assert_within(table.column("amplitude").unwrap(), (1.0, 2.0));

        let again = make_random_models_table(
            &model,
            20,
            &[("y_mean", (0.0, 10.0)), ("amplitude", (1.0, 2.0))],
            Some(3),
        )
        .unwrap();
        assert_eq!(table, again);
    }

    #[test]
    fn test_models_table_unknown_parameter() {
        let model = Const2D { level: 1.0 };
        let result = make_random_models_table(&model, 5, &[("x_mean", (0.0, 10.0))], Some(1));
        match result {
            Err(DatasetError::UnknownParameter { name, model }) => {
                assert_eq!(name, "x_mean");
                assert_eq!(model, "Const2D");
            }
            other => panic!("expected UnknownParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_models_table_duplicate_parameter() {
        let model = Const2D { level: 1.0 };
        let result = make_random_models_table(
            &model,
            5,
            &[("level", (0.0, 1.0)), ("level", (2.0, 3.0))],
            None,
        );
        assert!(matches!(result, Err(DatasetError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_sources() {
        let table = make_random_gaussians_table(0, &ranges(), Some(4));
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 6);
    }
}
