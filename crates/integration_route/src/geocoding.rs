//! Geocoding provider boundary and Nominatim client
//!
//! [`Geocoder`] is the raw provider capability: ranked result lists for a
//! coordinate or a free-text query. [`NominatimGeocoder`] implements it over
//! the [Nominatim](https://nominatim.openstreetmap.org) API (OpenStreetMap)
//! and enforces the Nominatim usage policy of one request per second.
//!
//! Callers normally go through [`crate::GeocodeExecutor`], which adds the
//! deadline, cancellation and first-result-wins rules.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::value_objects::{Address, Coordinate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Configuration for the Nominatim geocoding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,

    /// Preferred result language (`accept-language` parameter)
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Country code filter for forward lookups (empty = worldwide)
    #[serde(default)]
    pub country_filter: String,

    /// Minimum spacing between requests in milliseconds (0 disables)
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

const fn default_geocoding_timeout_secs() -> u64 {
    5
}

fn default_accept_language() -> String {
    "uk,ru,en".to_string()
}

const fn default_min_request_interval_ms() -> u64 {
    1100
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            timeout_secs: default_geocoding_timeout_secs(),
            accept_language: default_accept_language(),
            country_filter: String::new(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            min_request_interval_ms: 0,
            ..Default::default()
        }
    }
}

/// Errors that can occur during geocoding
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// Connection to geocoding service failed
    #[error("Geocoding connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to geocoding service failed
    #[error("Geocoding request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse geocoding response
    #[error("Geocoding parse error: {0}")]
    ParseError(String),

    /// The provider returned no results
    #[error("No match for {0}")]
    NoMatch(String),

    /// The request cannot be sent as given
    #[error("Invalid geocoding request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded (max 1 req/sec for Nominatim)
    #[error("Geocoding rate limit exceeded")]
    RateLimitExceeded,

    /// Request timeout
    #[error("Geocoding request timed out")]
    Timeout,

    /// The lookup task was cancelled or died before producing a result
    #[error("Geocoding lookup cancelled: {0}")]
    Cancelled(String),
}

impl GeocodingError {
    /// Returns true if this error is transient
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::RequestFailed(_)
                | Self::RateLimitExceeded
                | Self::Timeout
                | Self::Cancelled(_)
        )
    }
}

/// Geocoding provider capability
///
/// Results are ranked best-first. Implementations may return fewer than
/// `max_results` entries, including none.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Addresses near a coordinate
    async fn lookup_by_coordinate(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> Result<Vec<Address>, GeocodingError>;

    /// Coordinates matching a free-text address
    async fn lookup_by_text(
        &self,
        text: &str,
        max_results: usize,
    ) -> Result<Vec<Coordinate>, GeocodingError>;
}

/// Nominatim-based geocoder with request spacing
#[derive(Debug)]
pub struct NominatimGeocoder {
    client: Client,
    config: NominatimConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl NominatimGeocoder {
    /// Create a new Nominatim geocoder
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("taxometr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    /// Enforce the configured minimum spacing between requests
    async fn rate_limit(&self) {
        if self.config.min_request_interval_ms == 0 {
            return;
        }
        let interval = Duration::from_millis(self.config.min_request_interval_ms);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                let wait = interval.saturating_sub(elapsed);
                debug!(?wait, "Rate limiting geocoding request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Response, GeocodingError> {
        self.rate_limit().await;

        let url = format!("{}/{path}", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Timeout
                } else {
                    GeocodingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodingError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(GeocodingError::RequestFailed(format!("HTTP {status}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn lookup_by_coordinate(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> Result<Vec<Address>, GeocodingError> {
        let params = [
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("accept-language", self.config.accept_language.clone()),
        ];

        debug!(%latitude, %longitude, "Reverse geocoding");

        let body = self
            .get("reverse", &params)
            .await?
            .text()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        let result: NominatimReverse =
            serde_json::from_str(&body).map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        if let Some(error) = result.error {
            debug!(%error, "Reverse geocoding found nothing");
            return Ok(Vec::new());
        }

        Ok(result.into_address().into_iter().take(max_results).collect())
    }

    #[instrument(skip(self))]
    async fn lookup_by_text(
        &self,
        text: &str,
        max_results: usize,
    ) -> Result<Vec<Coordinate>, GeocodingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GeocodingError::InvalidRequest(
                "Address must not be empty".to_string(),
            ));
        }

        let mut params = vec![
            ("q", text.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", max_results.to_string()),
            ("accept-language", self.config.accept_language.clone()),
        ];

        if !self.config.country_filter.is_empty() {
            params.push(("countrycodes", self.config.country_filter.clone()));
        }

        debug!(%text, "Geocoding address");

        let body = self
            .get("search", &params)
            .await?
            .text()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        let results: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        results
            .into_iter()
            .take(max_results)
            .map(NominatimPlace::into_coordinate)
            .collect()
    }
}

/// Raw Nominatim search result
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn into_coordinate(self) -> Result<Coordinate, GeocodingError> {
        let lat: f64 = self
            .lat
            .parse()
            .map_err(|_| GeocodingError::ParseError("Invalid latitude".to_string()))?;
        let lon: f64 = self
            .lon
            .parse()
            .map_err(|_| GeocodingError::ParseError("Invalid longitude".to_string()))?;
        Coordinate::new(lat, lon).map_err(|e| GeocodingError::ParseError(e.to_string()))
    }
}

/// Raw Nominatim reverse result
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    error: Option<String>,
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimReverse {
    /// Map the structured address onto street / locality / region lines
    fn into_address(self) -> Option<Address> {
        let Some(parts) = self.address else {
            return self
                .display_name
                .map(|name| Address::from_lines([Some(name)]));
        };

        let street = match (parts.road, parts.house_number) {
            (Some(road), Some(number)) => Some(format!("{road} {number}")),
            (road, _) => road,
        };
        let locality = parts.city.or(parts.town).or(parts.village);
        let region = parts.country.or(parts.state);

        let address = Address::from_lines([street, locality, region]);
        if address.is_empty() {
            return self
                .display_name
                .map(|name| Address::from_lines([Some(name)]));
        }
        Some(address)
    }
}
