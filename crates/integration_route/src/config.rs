//! Route, geocoding and positioning configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the routing service request and transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Routing endpoint, without query string
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `output` query parameter (route document format)
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Connection timeout in seconds for the HTTP transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://maps.google.com/maps".to_string()
}

fn default_output_format() -> String {
    "kml".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_format: default_output_format(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RouteConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        url::Url::parse(&self.base_url).map_err(|e| format!("base_url is not a valid URL: {e}"))?;

        if self.output_format.is_empty() {
            return Err("output_format must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Configuration for geocode lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// How long a bounded lookup waits before giving up
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

const fn default_lookup_timeout_secs() -> u64 {
    5
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

impl GeocodeConfig {
    /// Bounded-mode deadline
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.lookup_timeout_secs == 0 {
            return Err("lookup_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for position update subscriptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Minimum time between position updates in milliseconds
    #[serde(default = "default_min_update_interval_ms")]
    pub min_update_interval_ms: u64,

    /// Minimum distance between position updates in meters
    #[serde(default = "default_min_distance_m")]
    pub min_distance_m: f32,

    /// How long a caller should wait for a first fix, in seconds
    #[serde(default = "default_fix_timeout_secs")]
    pub fix_timeout_secs: u64,
}

const fn default_min_update_interval_ms() -> u64 {
    3000
}

const fn default_min_distance_m() -> f32 {
    10.0
}

const fn default_fix_timeout_secs() -> u64 {
    30
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            min_update_interval_ms: default_min_update_interval_ms(),
            min_distance_m: default_min_distance_m(),
            fix_timeout_secs: default_fix_timeout_secs(),
        }
    }
}

impl LocationConfig {
    /// Minimum interval between updates
    #[must_use]
    pub const fn min_update_interval(&self) -> Duration {
        Duration::from_millis(self.min_update_interval_ms)
    }

    /// First-fix timeout
    #[must_use]
    pub const fn fix_timeout(&self) -> Duration {
        Duration::from_secs(self.fix_timeout_secs)
    }
}
