//! HTTP transport for route documents
//!
//! Fetches the document addressed by [`RouteRequestBuilder`] and hands the
//! body to [`RouteParser`]. Requests are sent once; there are no retries.

use std::time::Duration;

use async_trait::async_trait;
use domain::value_objects::{Coordinate, Route};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::RouteConfig;
use crate::error::RouteError;
use crate::kml::{MalformedPointPolicy, RouteParser};
use crate::request::RouteRequestBuilder;

/// Trait for route service clients
#[async_trait]
pub trait RouteClient: Send + Sync {
    /// Fetch and parse a driving route between two coordinates
    ///
    /// Transport failures are returned as errors; a document that cannot be
    /// parsed yields an empty route.
    async fn fetch_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        language: &str,
    ) -> Result<Route, RouteError>;
}

/// Route client backed by reqwest
#[derive(Debug)]
pub struct HttpRouteClient {
    client: Client,
    builder: RouteRequestBuilder,
    parser: RouteParser,
    timeout_secs: u64,
}

impl HttpRouteClient {
    /// Create a new HTTP route client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &RouteConfig) -> Result<Self, RouteError> {
        config.validate().map_err(RouteError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("taxometr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RouteError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            builder: RouteRequestBuilder::new(config),
            parser: RouteParser::default(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Use a different malformed-point policy for fetched documents
    #[must_use]
    pub fn with_policy(mut self, policy: MalformedPointPolicy) -> Self {
        self.parser = RouteParser::new(policy);
        self
    }
}

#[async_trait]
impl RouteClient for HttpRouteClient {
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    async fn fetch_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        language: &str,
    ) -> Result<Route, RouteError> {
        let url = self.builder.build_url(from, to, language);
        debug!(%url, "Fetching route document");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RouteError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                RouteError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteError::RequestFailed(format!("HTTP {status}")));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                RouteError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                RouteError::ConnectionFailed(e.to_string())
            }
        })?;

        let route = self.parser.parse_bytes(&body);
        if route.is_empty() {
            warn!("No route waypoints in response");
        }

        debug!(waypoints = route.len(), "Route fetched");
        Ok(route)
    }
}
