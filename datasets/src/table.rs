//! Source tables: one row of named model parameters per source.
//!
//! A [`SourceTable`] is stored column by column. Column names are matched
//! case-sensitively against model parameter names when rendering; columns
//! that match nothing are carried along but ignored.

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::model::Gaussian2D;

/// A named column of per-source values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered sequence of per-source parameter records.
///
/// All columns have the same length, enforced on construction. The JSON
/// representation is the list of columns in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct SourceTable {
    columns: Vec<Column>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (sources) in the table
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|idx| self.columns[idx].values.as_slice())
    }

    /// Add a column, or replace the values of an existing column of the same
    /// name in place (keeping its position).
    ///
    /// Fails with [`DatasetError::InvalidArgument`] when the length does not
    /// match the existing rows.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let replacing = self.column_index(&name);

        let other_columns = self.columns.len() - usize::from(replacing.is_some());
        if other_columns > 0 && values.len() != self.len() {
            return Err(DatasetError::InvalidArgument(format!(
                "column {name} has {} values but the table has {} rows",
                values.len(),
                self.len()
            )));
        }

        match replacing {
            Some(idx) => self.columns[idx].values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Append a column whose length is already known to match.
    pub(crate) fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        debug_assert!(self.columns.is_empty() || values.len() == self.len());
        self.columns.push(Column {
            name: name.into(),
            values,
        });
    }

    /// Builder form of [`SourceTable::add_column`].
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.add_column(name, values)?;
        Ok(self)
    }

    /// Remove a column, returning its values if it existed.
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        self.column_index(name).map(|idx| self.columns.remove(idx).values)
    }

    pub fn row(&self, index: usize) -> Option<SourceRow<'_>> {
        (index < self.len()).then_some(SourceRow { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = SourceRow<'_>> + '_ {
        (0..self.len()).map(move |index| SourceRow { table: self, index })
    }

    /// Build a Gaussian source table from typed records.
    ///
    /// Produces a `flux` column when every source is specified by flux and an
    /// `amplitude` column otherwise; fluxes of a mixed set are converted to
    /// peak amplitudes.
    pub fn from_gaussians(sources: &[GaussianSource]) -> Self {
        let all_flux = !sources.is_empty()
            && sources
                .iter()
                .all(|s| matches!(s.brightness, Brightness::Flux(_)));

        let (brightness_name, brightness): (&str, Vec<f64>) = if all_flux {
            ("flux", sources.iter().map(|s| s.brightness.value()).collect())
        } else {
            ("amplitude", sources.iter().map(GaussianSource::amplitude).collect())
        };

        let columns = vec![
            Column {
                name: brightness_name.to_string(),
                values: brightness,
            },
            Column {
                name: "x_mean".to_string(),
                values: sources.iter().map(|s| s.x_mean).collect(),
            },
            Column {
                name: "y_mean".to_string(),
                values: sources.iter().map(|s| s.y_mean).collect(),
            },
            Column {
                name: "x_stddev".to_string(),
                values: sources.iter().map(|s| s.x_stddev).collect(),
            },
            Column {
                name: "y_stddev".to_string(),
                values: sources.iter().map(|s| s.y_stddev).collect(),
            },
            Column {
                name: "theta".to_string(),
                values: sources.iter().map(|s| s.theta).collect(),
            },
        ];

        Self { columns }
    }
}

impl TryFrom<Vec<Column>> for SourceTable {
    type Error = DatasetError;

    fn try_from(columns: Vec<Column>) -> Result<Self> {
        let mut table = SourceTable::new();
        for column in columns {
            if table.has_column(&column.name) {
                return Err(DatasetError::InvalidArgument(format!(
                    "duplicate column {}",
                    column.name
                )));
            }
            table.add_column(column.name, column.values)?;
        }
        Ok(table)
    }
}

impl From<SourceTable> for Vec<Column> {
    fn from(table: SourceTable) -> Self {
        table.columns
    }
}

/// Borrowed view of one row of a [`SourceTable`].
#[derive(Debug, Clone, Copy)]
pub struct SourceRow<'a> {
    table: &'a SourceTable,
    index: usize,
}

impl<'a> SourceRow<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of the named column in this row
    pub fn get(&self, name: &str) -> Option<f64> {
        self.table.column(name).map(|values| values[self.index])
    }

    /// Value by column position, as returned by [`SourceTable::column_index`]
    pub fn get_at(&self, column: usize) -> f64 {
        self.table.columns[column].values[self.index]
    }
}

/// How the brightness of a Gaussian source is specified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Brightness {
    /// Total integrated flux
    Flux(f64),
    /// Peak amplitude
    Amplitude(f64),
}

impl Brightness {
    pub fn value(&self) -> f64 {
        match *self {
            Brightness::Flux(v) | Brightness::Amplitude(v) => v,
        }
    }
}

/// Typed parameters of one 2D Gaussian source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianSource {
    pub brightness: Brightness,
    pub x_mean: f64,
    pub y_mean: f64,
    pub x_stddev: f64,
    pub y_stddev: f64,
    /// Rotation angle in radians
    pub theta: f64,
}

impl GaussianSource {
    /// Peak amplitude, converting from flux when needed
    pub fn amplitude(&self) -> f64 {
        match self.brightness {
            Brightness::Amplitude(a) => a,
            Brightness::Flux(f) => Gaussian2D::amplitude_for_flux(f, self.x_stddev, self.y_stddev),
        }
    }
}
