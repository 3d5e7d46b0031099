//! Route and geocode resolution for taxometr
//!
//! Builds driving-directions requests, parses the returned KML route
//! documents, and resolves addresses and positions:
//!
//! - [`RouteRequestBuilder`] encodes a routing request as a URL.
//! - [`RouteParser`] turns a KML byte stream into a [`domain::Route`],
//!   degrading any failure to an empty route.
//! - [`HttpRouteClient`] fetches and parses a route in one call.
//! - [`GeocodeExecutor`] runs [`Geocoder`] lookups with a deadline and
//!   cancellation; [`NominatimGeocoder`] is the bundled provider.
//! - [`LocationResolutionPolicy`] picks positioning providers and seeds the
//!   session position.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_route::{HttpRouteClient, RouteClient, RouteConfig};
//!
//! let client = HttpRouteClient::new(&RouteConfig::default())?;
//! let route = client.fetch_route(from, to, "uk").await?;
//! println!("{} waypoints", route.len());
//! ```

mod client;
mod config;
mod error;
mod executor;
mod geocoding;
mod kml;
mod location;
mod request;

pub use client::{HttpRouteClient, RouteClient};
pub use config::{GeocodeConfig, LocationConfig, RouteConfig};
pub use error::RouteError;
pub use executor::GeocodeExecutor;
pub use geocoding::{Geocoder, GeocodingError, NominatimConfig, NominatimGeocoder};
pub use kml::{MalformedPointPolicy, RouteParser, parse_route};
pub use location::{
    CurrentPosition, LocationError, LocationResolutionPolicy, LocationSession, PositionConsumer,
    PositionFix, PositioningService, SessionSubscriptions,
};
pub use request::{RouteRequestBuilder, build_route_url};
