//! Integration tests for the route and geocoding clients (wiremock-based)

use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::value_objects::{Coordinate, GeocodeRequest, MicroPoint};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_route::{
    GeocodeConfig, GeocodeExecutor, Geocoder, GeocodingError, HttpRouteClient, NominatimConfig,
    NominatimGeocoder, RouteClient, RouteConfig, RouteError,
};

fn route_config(base_url: &str) -> RouteConfig {
    RouteConfig {
        base_url: format!("{base_url}/maps"),
        timeout_secs: 5,
        ..RouteConfig::default()
    }
}

fn nominatim_config(base_url: &str) -> NominatimConfig {
    NominatimConfig {
        base_url: base_url.to_string(),
        ..NominatimConfig::for_testing()
    }
}

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

const fn sample_route_kml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://earth.google.com/kml/2.0">
<Document>
  <name>Driving directions to Khreshchatyk</name>
  <Placemark>
    <name>Route</name>
    <description><![CDATA[Distance: 1.2&#160;km (about 3 mins)]]></description>
    <GeometryCollection>
      <LineString>
        <coordinates>30.52,50.45,0.000000 30.5205,50.4502,0.000000 30.523,50.447,0.000000</coordinates>
      </LineString>
    </GeometryCollection>
  </Placemark>
</Document>
</kml>"#
}

#[tokio::test]
async fn test_fetch_route_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps"))
        .and(query_param("f", "d"))
        .and(query_param("hl", "uk"))
        .and(query_param("saddr", "50.45,30.52"))
        .and(query_param("daddr", "50.447,30.523"))
        .and(query_param("output", "kml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_route_kml()))
        .mount(&server)
        .await;

    let client = HttpRouteClient::new(&route_config(&server.uri())).unwrap();
    let route = client
        .fetch_route(coord(50.45, 30.52), coord(50.447, 30.523), "uk")
        .await
        .unwrap();

    assert_eq!(route.len(), 3);
    assert_eq!(route.start(), Some(MicroPoint::new(50_450_000, 30_520_000)));
    assert_eq!(route.end(), Some(MicroPoint::new(50_447_000, 30_523_000)));
    assert_eq!(route.name.as_deref(), Some("Driving directions to Khreshchatyk"));
    assert!(route.description.unwrap().starts_with("Distance: 1.2"));
}

#[tokio::test]
async fn test_fetch_route_malformed_body_is_empty_route() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Sorry"))
        .mount(&server)
        .await;

    let client = HttpRouteClient::new(&route_config(&server.uri())).unwrap();
    let route = client
        .fetch_route(coord(1.0, 2.0), coord(3.0, 4.0), "en")
        .await
        .unwrap();

    assert!(route.is_empty());
}

#[tokio::test]
async fn test_fetch_route_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpRouteClient::new(&route_config(&server.uri())).unwrap();
    let err = client
        .fetch_route(coord(1.0, 2.0), coord(3.0, 4.0), "en")
        .await
        .unwrap_err();

    assert!(matches!(err, RouteError::RequestFailed(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_reverse_geocode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "50.45"))
        .and(query_param("lon", "30.52"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "display_name": "1, Khreshchatyk, Kyiv, Ukraine",
                "address": {"house_number": "1", "road": "Khreshchatyk", "city": "Kyiv", "country": "Ukraine"}
            }"#,
        ))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&nominatim_config(&server.uri())).unwrap();
    let executor = GeocodeExecutor::new(Arc::new(geocoder), &GeocodeConfig::default());

    let line = executor.address_line_for(coord(50.45, 30.52)).await;
    assert_eq!(line, "Khreshchatyk 1, Kyiv, Ukraine");
}

#[tokio::test]
async fn test_reverse_geocode_unable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": "Unable to geocode"}"#))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&nominatim_config(&server.uri())).unwrap();
    let addresses = geocoder.lookup_by_coordinate(0.0, 0.0, 1).await.unwrap();
    assert!(addresses.is_empty());

    let executor = GeocodeExecutor::new(Arc::new(geocoder), &GeocodeConfig::default());
    assert_eq!(executor.address_for(coord(0.0, 0.0)).await, None);
}

#[tokio::test]
async fn test_forward_geocode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Khreshchatyk 1, Kyiv"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"lat": "50.4470", "lon": "30.5227", "display_name": "Khreshchatyk"}]"#,
        ))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&nominatim_config(&server.uri())).unwrap();
    let executor = GeocodeExecutor::new(Arc::new(geocoder), &GeocodeConfig::default());

    let point = executor.point_for_address("Khreshchatyk 1, Kyiv").await;
    assert_eq!(point, Some(MicroPoint::new(50_447_000, 30_522_700)));
}

#[tokio::test]
async fn test_forward_geocode_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&nominatim_config(&server.uri())).unwrap();
    let err = geocoder.lookup_by_text("Lviv", 1).await.unwrap_err();
    assert!(matches!(err, GeocodingError::RateLimitExceeded));

    let executor = GeocodeExecutor::new(Arc::new(geocoder), &GeocodeConfig::default());
    assert_eq!(executor.point_for_address("Lviv").await, None);
}

#[tokio::test]
async fn test_forward_geocode_empty_query() {
    let geocoder = NominatimGeocoder::new(&NominatimConfig::for_testing()).unwrap();
    let err = geocoder.lookup_by_text("   ", 1).await.unwrap_err();
    assert!(matches!(err, GeocodingError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_bounded_lookup_against_slow_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"lat": "1.0", "lon": "2.0"}]"#)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&nominatim_config(&server.uri())).unwrap();
    let executor = GeocodeExecutor::new(Arc::new(geocoder), &GeocodeConfig::default());

    let started = Instant::now();
    let outcome = executor
        .resolve_with_timeout(
            GeocodeRequest::ByAddressText("Odesa".to_string()),
            Duration::from_millis(200),
        )
        .await;

    assert_eq!(outcome, None);
    assert!(started.elapsed() < Duration::from_secs(2));
}
