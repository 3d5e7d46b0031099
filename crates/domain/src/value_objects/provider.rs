//! Positioning providers and selection outcome

use serde::{Deserialize, Serialize};
use std::fmt;

/// A positioning source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationProvider {
    /// Satellite positioning: slower first fix, more accurate
    Gps,
    /// Cell/Wi-Fi positioning: fast first fix, coarse
    Network,
}

impl LocationProvider {
    /// Provider name as used by platform positioning services
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for LocationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of best-provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    /// Satellite positioning selected
    Gps,
    /// Network positioning selected
    Network,
    /// No usable provider
    None,
}

impl ProviderChoice {
    /// The selected provider, if any
    #[must_use]
    pub const fn provider(&self) -> Option<LocationProvider> {
        match self {
            Self::Gps => Some(LocationProvider::Gps),
            Self::Network => Some(LocationProvider::Network),
            Self::None => None,
        }
    }

    /// Whether a provider was selected
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl From<LocationProvider> for ProviderChoice {
    fn from(provider: LocationProvider) -> Self {
        match provider {
            LocationProvider::Gps => Self::Gps,
            LocationProvider::Network => Self::Network,
        }
    }
}

impl From<Option<LocationProvider>> for ProviderChoice {
    fn from(provider: Option<LocationProvider>) -> Self {
        provider.map_or(Self::None, Self::from)
    }
}

/// Accuracy/power trade-off handed to best-provider selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCriteria {
    /// Prefer fine accuracy
    pub high_accuracy: bool,
    /// Prefer low power consumption
    pub power_sensitive: bool,
}

impl ProviderCriteria {
    /// Fine accuracy, power not a concern
    #[must_use]
    pub const fn fine() -> Self {
        Self {
            high_accuracy: true,
            power_sensitive: false,
        }
    }
}
