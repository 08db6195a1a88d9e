//! Fold resolver outcomes back into their rows.

use coursegeo_dataset::Dataset;
use coursegeo_shared::{CourseGeoError, Result, Value};

use crate::resolver::RowOutcome;

/// Indices of the two coordinate columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateColumns {
    pub latitude: usize,
    pub longitude: usize,
}

impl CoordinateColumns {
    /// Locate the coordinate columns, appending them if the dataset lacks them.
    pub fn ensure(dataset: &mut Dataset) -> Self {
        let (latitude, longitude) = dataset.ensure_coordinate_columns();
        Self {
            latitude,
            longitude,
        }
    }
}

/// Write one outcome into exactly `outcome.row`.
///
/// Resolved rows get the match's coordinates; unresolved rows get `Null` in
/// both columns, replacing whatever a previous run left there.
pub fn apply(
    dataset: &mut Dataset,
    columns: CoordinateColumns,
    outcome: &RowOutcome,
) -> Result<()> {
    if outcome.row >= dataset.len() {
        return Err(CourseGeoError::validation(format!(
            "outcome for row {} but dataset has {} rows",
            outcome.row,
            dataset.len()
        )));
    }

    let (latitude, longitude) = match outcome.result.point() {
        Some(point) => (
            Value::coordinate(point.latitude),
            Value::coordinate(point.longitude),
        ),
        None => (Value::Null, Value::Null),
    };

    dataset.set(outcome.row, columns.latitude, latitude)?;
    dataset.set(outcome.row, columns.longitude, longitude)?;
    Ok(())
}
