//! Per-row geocoding, one query at a time, in row order.
//!
//! [`Resolver`] is a pull-based sequence of [`RowOutcome`]s. Every failure
//! mode of a single row (empty name, miss, timeout, transport error) becomes
//! an `Unresolved` outcome; nothing here aborts the batch.

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use coursegeo_dataset::Dataset;
use coursegeo_geocoder::{Geocoder, RateLimiter, build_query};
use coursegeo_shared::{GeocodeMatch, GeocodeResult, UnresolvedReason, Value};

/// Outcome for one dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    /// Index of the row in the dataset.
    pub row: usize,
    /// The name that was looked up (`None` when the cell was empty).
    pub name: Option<String>,
    pub result: GeocodeResult,
}

/// `name → lat, lon`, or `name (reason)` for unresolved rows.
impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("-");
        match &self.result {
            GeocodeResult::Resolved(found) => write!(f, "{name} → {}", found.point),
            GeocodeResult::Unresolved(reason) => write!(f, "{name} ({reason})"),
        }
    }
}

/// Query and filtering knobs for a resolver run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Locality appended to every query.
    pub country_hint: String,
    /// Upper bound on each geocoder call.
    pub request_timeout: Duration,
    /// Matches below this importance are discarded.
    pub min_importance: Option<f64>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            country_hint: "Thailand".into(),
            request_timeout: Duration::from_secs(10),
            min_importance: None,
        }
    }
}

/// Extract `(row, name)` pairs from `column`, in row order.
pub fn row_names(dataset: &Dataset, column: usize) -> Vec<(usize, Option<String>)> {
    dataset
        .column_values(column)
        .enumerate()
        .map(|(row, value)| {
            let name = match value {
                Value::Null => None,
                other => Some(other.to_string().trim().to_string()).filter(|s| !s.is_empty()),
            };
            (row, name)
        })
        .collect()
}

/// Sequential geocoding over a fixed list of rows.
pub struct Resolver<'a> {
    geocoder: &'a dyn Geocoder,
    limiter: &'a dyn RateLimiter,
    options: ResolveOptions,
    cancel: CancellationToken,
    pending: std::vec::IntoIter<(usize, Option<String>)>,
    total: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(
        geocoder: &'a dyn Geocoder,
        limiter: &'a dyn RateLimiter,
        options: ResolveOptions,
        cancel: CancellationToken,
        rows: Vec<(usize, Option<String>)>,
    ) -> Self {
        let total = rows.len();
        Self {
            geocoder,
            limiter,
            options,
            cancel,
            pending: rows.into_iter(),
            total,
        }
    }

    /// Number of rows this resolver was created with.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Resolve the next row.
    ///
    /// Returns `None` when every row has been processed or the run was
    /// cancelled. A row interrupted mid-request is not returned.
    pub async fn next(&mut self) -> Option<RowOutcome> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let (row, name) = self.pending.next()?;

        let Some(name) = name else {
            debug!(row, "empty name, skipping lookup");
            return Some(RowOutcome {
                row,
                name: None,
                result: GeocodeResult::Unresolved(UnresolvedReason::EmptyName),
            });
        };

        let query = build_query(&name, &self.options.country_hint);

        let result = tokio::select! {
            result = self.lookup(row, &query) => result,
            _ = self.cancel.cancelled() => {
                info!(row, "cancelled during lookup");
                return None;
            }
        };

        // Throttle after every query, hit or miss.
        tokio::select! {
            _ = self.limiter.pause() => {}
            _ = self.cancel.cancelled() => {}
        }

        Some(RowOutcome {
            row,
            name: Some(name),
            result,
        })
    }

    async fn lookup(&self, row: usize, query: &str) -> GeocodeResult {
        let call = self.geocoder.geocode(query);

        match tokio::time::timeout(self.options.request_timeout, call).await {
            Err(_) => {
                warn!(
                    row,
                    query,
                    timeout_ms = self.options.request_timeout.as_millis(),
                    "geocoding timed out"
                );
                GeocodeResult::Unresolved(UnresolvedReason::Timeout)
            }
            Ok(Err(e)) => {
                warn!(row, query, error = %e, "geocoding failed");
                GeocodeResult::Unresolved(UnresolvedReason::Failed(e.to_string()))
            }
            Ok(Ok(None)) => {
                debug!(row, query, "no match");
                GeocodeResult::Unresolved(UnresolvedReason::NoMatch)
            }
            Ok(Ok(Some(found))) => self.accept(row, found),
        }
    }

    fn accept(&self, row: usize, found: GeocodeMatch) -> GeocodeResult {
        let below_threshold = match (self.options.min_importance, found.importance) {
            (Some(min), Some(importance)) => importance < min,
            _ => false,
        };

        if below_threshold {
            debug!(
                row,
                importance = ?found.importance,
                address = %found.address,
                "match below importance threshold"
            );
            return GeocodeResult::Unresolved(UnresolvedReason::LowConfidence);
        }

        debug!(row, point = %found.point, address = %found.address, "resolved");
        GeocodeResult::Resolved(found)
    }
}
