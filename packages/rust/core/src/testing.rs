//! Deterministic geocoder stub shared by the crate's tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use coursegeo_geocoder::Geocoder;
use coursegeo_shared::{CourseGeoError, GeoPoint, GeocodeMatch, Result};

#[derive(Debug, Clone)]
enum Answer {
    Match(GeocodeMatch),
    Error(String),
}

/// Answers from a fixed table; unknown queries are a miss.
#[derive(Debug, Default)]
pub(crate) struct StubGeocoder {
    answers: HashMap<String, Answer>,
    latency: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl StubGeocoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_match(mut self, query: &str, found: GeocodeMatch) -> Self {
        self.answers.insert(query.to_string(), Answer::Match(found));
        self
    }

    pub(crate) fn with_error(mut self, query: &str, message: &str) -> Self {
        self.answers
            .insert(query.to_string(), Answer::Error(message.to_string()));
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every query received so far, in order.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>> {
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.to_string());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.answers.get(query) {
            Some(Answer::Match(found)) => Ok(Some(found.clone())),
            Some(Answer::Error(message)) => Err(CourseGeoError::Geocode(message.clone())),
            None => Ok(None),
        }
    }
}

/// Chulalongkorn University, Bangkok.
pub(crate) fn chula() -> GeocodeMatch {
    GeocodeMatch {
        point: GeoPoint::new(13.7367, 100.5231),
        address: "จุฬาลงกรณ์มหาวิทยาลัย, เขตปทุมวัน, กรุงเทพมหานคร, ประเทศไทย".into(),
        importance: Some(0.57),
    }
}

/// Chiang Mai University.
pub(crate) fn cmu() -> GeocodeMatch {
    GeocodeMatch {
        point: GeoPoint::new(18.8037, 98.9525),
        address: "มหาวิทยาลัยเชียงใหม่, อำเภอเมืองเชียงใหม่, จังหวัดเชียงใหม่, ประเทศไทย".into(),
        importance: Some(0.48),
    }
}
