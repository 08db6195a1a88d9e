//! Coordinate coverage summary for an enriched dataset.

use coursegeo_dataset::Dataset;
use coursegeo_shared::{GeoPoint, LATITUDE_COLUMN, LONGITUDE_COLUMN};

/// One row of the preview table.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub name: String,
    pub point: Option<GeoPoint>,
}

/// Totals plus the first few rows, for operator output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetSummary {
    pub total: usize,
    pub with_coordinates: usize,
    pub without_coordinates: usize,
    pub preview: Vec<PreviewRow>,
}

/// Count rows with a usable coordinate pair and capture up to `preview_rows` rows.
///
/// A row counts as located only when both latitude and longitude are numbers.
pub fn summarize(dataset: &Dataset, name_column: &str, preview_rows: usize) -> DatasetSummary {
    let name_col = dataset.column_index(name_column);
    let lat_col = dataset.column_index(LATITUDE_COLUMN);
    let lon_col = dataset.column_index(LONGITUDE_COLUMN);

    let point_at = |row: usize| -> Option<GeoPoint> {
        let lat = dataset.get(row, lat_col?)?.as_f64()?;
        let lon = dataset.get(row, lon_col?)?.as_f64()?;
        Some(GeoPoint::new(lat, lon))
    };

    let with_coordinates = (0..dataset.len()).filter(|&row| point_at(row).is_some()).count();

    let preview = (0..dataset.len().min(preview_rows))
        .map(|row| PreviewRow {
            name: name_col
                .and_then(|col| dataset.get(row, col))
                .map(ToString::to_string)
                .unwrap_or_default(),
            point: point_at(row),
        })
        .collect();

    DatasetSummary {
        total: dataset.len(),
        with_coordinates,
        without_coordinates: dataset.len() - with_coordinates,
        preview,
    }
}
