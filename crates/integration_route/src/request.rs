//! Driving-directions request URL builder
//!
//! The query string is reproduced literally for wire compatibility with the
//! routing service: parameter order and the `f=d`, `ie=UTF8`, `0` and `om=0`
//! tokens must not change.
//!
//! Coordinates are written with Rust's `Display` for `f64`, which yields the
//! shortest decimal that round-trips (`30.3`, `50.27`, `-122`). The language
//! tag is copied verbatim.

use domain::value_objects::Coordinate;

use crate::config::RouteConfig;

/// Builds routing request URLs from a [`RouteConfig`]
#[derive(Debug, Clone)]
pub struct RouteRequestBuilder {
    base_url: String,
    output_format: String,
}

impl Default for RouteRequestBuilder {
    fn default() -> Self {
        Self::new(&RouteConfig::default())
    }
}

impl RouteRequestBuilder {
    /// Create a builder for the configured endpoint and output format
    #[must_use]
    pub fn new(config: &RouteConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            output_format: config.output_format.clone(),
        }
    }

    /// Build the GET URL for driving directions from `from` to `to`
    #[must_use]
    pub fn build_url(&self, from: Coordinate, to: Coordinate, language: &str) -> String {
        format!(
            "{base}?f=d&hl={language}&saddr={from_lat},{from_lon}&daddr={to_lat},{to_lon}&ie=UTF8&0&om=0&output={output}",
            base = self.base_url,
            from_lat = from.latitude(),
            from_lon = from.longitude(),
            to_lat = to.latitude(),
            to_lon = to.longitude(),
            output = self.output_format,
        )
    }
}

/// Build a routing URL against the default endpoint
#[must_use]
pub fn build_route_url(from: Coordinate, to: Coordinate, language: &str) -> String {
    RouteRequestBuilder::default().build_url(from, to, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn reproduces_reference_url() {
        let url = build_route_url(coord(30.30, 50.27), coord(30.40, 50.30), "en");
        assert_eq!(
            url,
            "http://maps.google.com/maps?f=d&hl=en&saddr=30.3,50.27&daddr=30.4,50.3&ie=UTF8&0&om=0&output=kml"
        );
        assert!(url.contains("saddr=30.3,50.27&daddr=30.4,50.3"));
        assert!(url.ends_with("&ie=UTF8&0&om=0&output=kml"));
    }

    #[test]
    fn whole_and_negative_degrees() {
        let url = build_route_url(coord(-33.0, 151.0), coord(0.000_1, -0.5), "uk");
        assert!(url.contains("saddr=-33,151&daddr=0.0001,-0.5"));
    }

    #[test]
    fn language_passed_verbatim() {
        let url = build_route_url(coord(1.0, 2.0), coord(3.0, 4.0), "pt-BR&x");
        assert!(url.contains("&hl=pt-BR&x&saddr="));
    }

    #[test]
    fn uses_configured_endpoint_and_format() {
        let config = RouteConfig {
            base_url: "http://localhost:8080/maps".to_string(),
            output_format: "kmz".to_string(),
            ..RouteConfig::default()
        };
        let url = RouteRequestBuilder::new(&config).build_url(coord(1.5, 2.5), coord(3.5, 4.5), "de");
        assert!(url.starts_with("http://localhost:8080/maps?f=d&hl=de&"));
        assert!(url.ends_with("&output=kmz"));
    }

    #[test]
    fn full_precision_is_kept() {
        let url = build_route_url(coord(50.450_123_456_789, 30.523_4), coord(1.0, 1.0), "en");
        assert!(url.contains("saddr=50.450123456789,30.5234&"));
    }
}
