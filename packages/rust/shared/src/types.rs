//! Core domain types shared by the loader, resolver, and writer.

use std::fmt;

/// Column holding the resolved latitude.
pub const LATITUDE_COLUMN: &str = "latitude";

/// Column holding the resolved longitude.
pub const LONGITUDE_COLUMN: &str = "longitude";

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single table cell.
///
/// `Null` doubles as the explicit "unknown" marker for coordinates: an empty
/// field in CSV, a blank cell in a spreadsheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Value {
    /// Build a text cell, mapping blank strings to `Null`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() { Self::Null } else { Self::Text(s) }
    }

    /// Build a coordinate cell. Non-finite numbers become `Null`.
    pub fn coordinate(v: f64) -> Self {
        if v.is_finite() { Self::Number(v) } else { Self::Null }
    }

    /// Parse a coordinate from text; anything unparsable becomes `Null`.
    pub fn parse_coordinate(s: &str) -> Self {
        s.trim()
            .parse::<f64>()
            .map(Self::coordinate)
            .unwrap_or(Self::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders the cell the way it lands in CSV: `Null` is the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Best match returned by a geocoding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub point: GeoPoint,
    /// Provider-normalized address string.
    pub address: String,
    /// Provider relevance score in `[0, 1]`, when exposed.
    pub importance: Option<f64>,
}

/// Why a row ended up without coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// The name cell was empty; no query was made.
    EmptyName,
    /// The provider answered with no match.
    NoMatch,
    /// The match scored below the configured importance threshold.
    LowConfidence,
    /// The request exceeded the per-request timeout.
    Timeout,
    /// Network, HTTP, or decoding failure.
    Failed(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => f.write_str("empty name"),
            Self::NoMatch => f.write_str("no match"),
            Self::LowConfidence => f.write_str("low confidence match"),
            Self::Timeout => f.write_str("timed out"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Terminal outcome of one row's geocoding attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Resolved(GeocodeMatch),
    Unresolved(UnresolvedReason),
}

impl GeocodeResult {
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            Self::Resolved(m) => Some(m.point),
            Self::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}
