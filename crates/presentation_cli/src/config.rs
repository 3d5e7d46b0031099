//! CLI configuration loading
//!
//! Layers built-in defaults, an optional `taxometr.toml` file and
//! `TAXOMETR_*` environment variables (e.g. `TAXOMETR_ROUTE__BASE_URL`).

use std::path::Path;

use integration_route::{GeocodeConfig, NominatimConfig, RouteConfig};
use serde::Deserialize;

/// Top-level CLI configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Routing service settings
    #[serde(default)]
    pub route: RouteConfig,

    /// Geocoding provider settings
    #[serde(default)]
    pub nominatim: NominatimConfig,

    /// Lookup deadline settings
    #[serde(default)]
    pub geocode: GeocodeConfig,
}

impl AppConfig {
    /// Load configuration from `taxometr.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (required when given)
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("taxometr").required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("TAXOMETR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        self.route
            .validate()
            .and_then(|()| self.geocode.validate())
            .map_err(config::ConfigError::Message)
    }
}
