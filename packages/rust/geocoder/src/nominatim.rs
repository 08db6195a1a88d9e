//! Client for Nominatim-compatible `/search` endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use coursegeo_shared::{CourseGeoError, GeoPoint, GeocodeMatch, GeocoderConfig, Result};

use crate::Geocoder;

/// One place in a `format=jsonv2` search response.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    importance: Option<f64>,
}

/// Geocoder backed by a Nominatim `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
}

impl NominatimGeocoder {
    /// Build a client from the `[geocoder]` config section.
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| CourseGeoError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_url: search_endpoint(&config.base_url)?,
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>> {
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| CourseGeoError::Geocode(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourseGeoError::Geocode(format!("HTTP {status}")));
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| CourseGeoError::Geocode(format!("malformed response: {e}")))?;

        debug!(candidates = places.len(), "search answered");

        places.into_iter().next().map(into_match).transpose()
    }
}

/// `<base>/search`, keeping any path prefix on the base URL.
fn search_endpoint(base: &Url) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("search")
        .map_err(|e| CourseGeoError::config(format!("invalid geocoder URL {base}: {e}")))
}

fn into_match(place: Place) -> Result<GeocodeMatch> {
    let latitude = parse_coordinate(&place.lat, "lat")?;
    let longitude = parse_coordinate(&place.lon, "lon")?;

    Ok(GeocodeMatch {
        point: GeoPoint::new(latitude, longitude),
        address: place.display_name,
        importance: place.importance,
    })
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CourseGeoError::Geocode(format!("malformed {field} {raw:?}")))
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    }
}
