//! Geocoding request and result types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Address, Coordinate};

/// What to look up: an address for a position, or a position for an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GeocodeRequest {
    /// Reverse lookup: coordinate to address
    ByCoordinate(Coordinate),
    /// Forward lookup: free text to coordinate
    ByAddressText(String),
}

impl fmt::Display for GeocodeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByCoordinate(c) => write!(f, "reverse({c})"),
            Self::ByAddressText(text) => write!(f, "forward({text:?})"),
        }
    }
}

/// The best match of a successful lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GeocodeOutcome {
    /// Address found for a coordinate
    Address(Address),
    /// Coordinate found for an address text
    Coordinate(Coordinate),
}

impl GeocodeOutcome {
    /// The address, if this is a reverse lookup result
    #[must_use]
    pub fn into_address(self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(address),
            Self::Coordinate(_) => None,
        }
    }

    /// The coordinate, if this is a forward lookup result
    #[must_use]
    pub fn into_coordinate(self) -> Option<Coordinate> {
        match self {
            Self::Coordinate(coordinate) => Some(coordinate),
            Self::Address(_) => None,
        }
    }
}
