//! Geocoding capability, Nominatim client, and request throttling.
//!
//! The resolver only ever sees the [`Geocoder`] and [`RateLimiter`] traits,
//! so tests can swap in deterministic stubs and a zero-delay limiter.

mod nominatim;
mod rate_limit;

use async_trait::async_trait;

use coursegeo_shared::{GeocodeMatch, Result};

pub use nominatim::NominatimGeocoder;
pub use rate_limit::{FixedDelay, NoDelay, RateLimiter};

/// Free-text place lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Return the provider's best match for `query`, or `None` when nothing matched.
    ///
    /// Errors cover transport and decoding failures; callers treat them the
    /// same as a miss for the affected row.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>>;
}

/// Build the query sent for one institution: `"{name}, {country_hint}"`.
///
/// The locality hint narrows short or common names to one country. A blank
/// hint sends the bare name.
pub fn build_query(name: &str, country_hint: &str) -> String {
    let name = name.trim();
    let hint = country_hint.trim();
    if hint.is_empty() {
        name.to_string()
    } else {
        format!("{name}, {hint}")
    }
}
