//! Forward geocoding of free-text addresses.
//!
//! Lookups never fail from the caller's point of view: a network error, a timeout, an
//! error status or an empty answer all come back as [`GeocodeOutcome::NoResult`].

use crate::GeocoderConfig;
use crate::record::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::num::ParseFloatError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    Found(Coordinates),
    NoResult,
}

impl GeocodeOutcome {
    pub fn coordinates(self) -> Option<Coordinates> {
        match self {
            GeocodeOutcome::Found(c) => Some(c),
            GeocodeOutcome::NoResult => None,
        }
    }
}

pub trait Geocode {
    /// Looks up `address`. Blank addresses resolve to [`GeocodeOutcome::NoResult`]
    /// without contacting the provider.
    fn geocode(&self, address: &str) -> impl Future<Output = GeocodeOutcome> + Send;
}

/// Serialised minimum-interval gate. Clones share the same last-call instant, so every
/// caller holding a clone is throttled together.
#[derive(Debug, Clone)]
pub struct RateGate {
    min_interval: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until at least `min_interval` has passed since the previous turn started.
    pub async fn wait_turn(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            sleep_until(previous + self.min_interval).await;
        }
        *last_call = Some(Instant::now());
    }
}

#[derive(Debug, Error)]
enum LookupError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("provider returned an unparsable coordinate: {0}")]
    Coordinate(#[from] ParseFloatError),
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Client for a Nominatim compatible `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: String,
    gate: RateGate,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
            gate: RateGate::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, LookupError> {
        let hits = self
            .client
            .get(&self.search_url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SearchHit>>()
            .await?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(Coordinates::new(hit.lat.parse()?, hit.lon.parse()?)))
    }
}

impl Geocode for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeOutcome {
        let query = address.trim();
        if query.is_empty() {
            return GeocodeOutcome::NoResult;
        }

        self.gate.wait_turn().await;
        match self.lookup(query).await {
            Ok(Some(coordinates)) => {
                debug!(address = query, ?coordinates, "geocoded address");
                GeocodeOutcome::Found(coordinates)
            }
            Ok(None) => {
                debug!(address = query, "no geocoding match");
                GeocodeOutcome::NoResult
            }
            Err(e) => {
                warn!(error = ?e, address = query, "geocoding lookup failed");
                GeocodeOutcome::NoResult
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_provider(min_interval_ms: u64) -> NominatimGeocoder {
        NominatimGeocoder::new(&GeocoderConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "display-store-tests".to_string(),
            min_interval_ms,
            timeout_seconds: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn blank_address_skips_gate_and_network() {
        // A ten second gate would make the second call wait if the gate were touched.
        let geocoder = unreachable_provider(10_000);
        let started = std::time::Instant::now();

        assert_eq!(geocoder.geocode("").await, GeocodeOutcome::NoResult);
        assert_eq!(geocoder.geocode("   \t").await, GeocodeOutcome::NoResult);

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(geocoder.gate.last_call.lock().await.is_none());
    }

    #[tokio::test]
    async fn unreachable_provider_is_no_result() {
        let geocoder = unreachable_provider(0);
        let outcome = geocoder.geocode("Heerstr. 12, 10115 Berlin").await;
        assert_eq!(outcome, GeocodeOutcome::NoResult);
    }

    #[tokio::test]
    async fn gate_spaces_consecutive_turns() {
        let gate = RateGate::new(Duration::from_millis(50));
        let started = Instant::now();

        gate.wait_turn().await;
        gate.wait_turn().await;
        gate.wait_turn().await;

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn clones_share_one_gate() {
        let gate = RateGate::new(Duration::from_millis(50));
        let other = gate.clone();
        let started = Instant::now();

        gate.wait_turn().await;
        other.wait_turn().await;

        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
