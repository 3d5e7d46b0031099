//! Value Objects - Immutable, identity-less domain primitives

mod address;
mod coordinate;
mod geocode;
mod micro_point;
mod provider;
mod route;

pub use address::Address;
pub use coordinate::{Coordinate, DEFAULT_LOCATION};
pub use geocode::{GeocodeOutcome, GeocodeRequest};
pub use micro_point::{MICRODEGREES, MicroPoint};
pub use provider::{LocationProvider, ProviderChoice, ProviderCriteria};
pub use route::Route;
