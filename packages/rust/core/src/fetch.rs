//! Download the public course list and store it as a spreadsheet.

use std::collections::BTreeSet;

use reqwest::Client;
use serde_json::{Map, Value as Json};
use tracing::{debug, info, instrument};

use coursegeo_dataset::{Dataset, write_outputs};
use coursegeo_shared::{CourseGeoError, FetchConfig, OutputPaths, Result, Value};

/// What a fetch produced.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Records in the downloaded list.
    pub fetched: usize,
    /// Records left after keyword filtering.
    pub kept: usize,
    pub columns: usize,
    pub outputs: OutputPaths,
}

/// GET the course list, optionally filter it, and write both outputs.
#[instrument(skip_all, fields(url = %config.url))]
pub async fn fetch_courses(config: &FetchConfig) -> Result<FetchResult> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .build()
        .map_err(|e| CourseGeoError::Network(format!("failed to build HTTP client: {e}")))?;

    let response = client
        .get(config.url.clone())
        .send()
        .await
        .map_err(|e| CourseGeoError::Network(format!("GET {} failed: {e}", config.url)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CourseGeoError::Network(format!(
            "GET {} returned HTTP {status}",
            config.url
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| CourseGeoError::Network(format!("failed to read response body: {e}")))?;
    let json: Json = serde_json::from_str(&body)
        .map_err(|e| CourseGeoError::parse(format!("course list is not valid JSON: {e}")))?;

    let mut dataset = courses_to_dataset(&json)?;
    let fetched = dataset.len();
    debug!(records = fetched, columns = dataset.columns().len(), "course list parsed");

    if let Some(column) = &config.filter_column {
        dataset = filter_rows(dataset, column, &config.keywords)?;
    }

    write_outputs(&dataset, &config.outputs)?;

    info!(
        fetched,
        kept = dataset.len(),
        xlsx = %config.outputs.xlsx.display(),
        "course list saved"
    );

    Ok(FetchResult {
        fetched,
        kept: dataset.len(),
        columns: dataset.columns().len(),
        outputs: config.outputs.clone(),
    })
}

/// Flatten a JSON array of objects into a table.
///
/// Columns are the sorted union of every record's keys. Missing keys become `Null`.
pub fn courses_to_dataset(json: &Json) -> Result<Dataset> {
    let Json::Array(items) = json else {
        return Err(CourseGeoError::parse("course list must be a JSON array"));
    };

    let records = items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Json::Object(map) => Ok(map),
            _ => Err(CourseGeoError::parse(format!(
                "course list entry {i} is not an object"
            ))),
        })
        .collect::<Result<Vec<&Map<String, Json>>>>()?;

    let columns: Vec<String> = records
        .iter()
        .flat_map(|record| record.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut dataset = Dataset::new(columns.clone());
    for record in records {
        let row = columns
            .iter()
            .map(|key| record.get(key).map(json_cell).unwrap_or_default())
            .collect();
        dataset.push_row(row)?;
    }

    Ok(dataset)
}

/// Keep rows whose `column` text contains any of `keywords`.
pub fn filter_rows(dataset: Dataset, column: &str, keywords: &[String]) -> Result<Dataset> {
    if keywords.is_empty() {
        return Err(CourseGeoError::validation(
            "keyword filter needs at least one keyword",
        ));
    }
    let col = dataset.column_index(column).ok_or_else(|| {
        CourseGeoError::validation(format!("filter column {column:?} not in course list"))
    })?;

    let mut filtered = Dataset::new(dataset.columns().to_vec());
    for row in dataset.rows() {
        let matches = row[col]
            .as_str()
            .is_some_and(|text| keywords.iter().any(|k| text.contains(k.as_str())));
        if matches {
            filtered.push_row(row.clone())?;
        }
    }
    Ok(filtered)
}

fn json_cell(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::String(s) => Value::text(s.as_str()),
        Json::Number(n) => n.as_f64().map(Value::Number).unwrap_or_default(),
        Json::Bool(b) => Value::Bool(*b),
        nested => Value::text(nested.to_string()),
    }
}
