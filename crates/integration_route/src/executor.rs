//! Deadline-bounded geocode lookups
//!
//! Every call spawns one tokio task for the provider lookup and waits on it,
//! either up to a deadline (bounded mode) or until it finishes (unbounded
//! mode). Dropping the wait aborts the task; provider I/O already in flight
//! may still complete on the provider's side.
//!
//! All failures collapse to `None`: timeout, cancellation, provider errors and
//! "no match" are only distinguishable in the logs. Identical concurrent
//! requests are not coalesced.

use std::sync::Arc;
use std::time::Duration;

use domain::value_objects::{
    Address, Coordinate, GeocodeOutcome, GeocodeRequest, MicroPoint,
};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::config::GeocodeConfig;
use crate::geocoding::{Geocoder, GeocodingError};

/// Only the best match is ever requested
const MAX_RESULTS: usize = 1;

/// Runs geocode lookups against a [`Geocoder`] off the caller's task
#[derive(Clone)]
pub struct GeocodeExecutor {
    geocoder: Arc<dyn Geocoder>,
    default_timeout: Duration,
}

impl std::fmt::Debug for GeocodeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeExecutor")
            .field("geocoder", &"dyn Geocoder")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl GeocodeExecutor {
    /// Create an executor with the configured bounded-mode deadline
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &GeocodeConfig) -> Self {
        Self {
            geocoder,
            default_timeout: config.lookup_timeout(),
        }
    }

    /// The deadline used by [`Self::resolve_bounded`]
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Bounded mode: wait at most `timeout`, then cancel and give up
    #[instrument(skip(self), fields(request = %request))]
    pub async fn resolve_with_timeout(
        &self,
        request: GeocodeRequest,
        timeout: Duration,
    ) -> Option<GeocodeOutcome> {
        let mut task = LookupTask::spawn(Arc::clone(&self.geocoder), request);
        let waited = tokio::time::timeout(timeout, task.join()).await;
        match waited {
            Ok(result) => settle(result),
            Err(_) => {
                debug!(?timeout, "Geocode lookup timed out, cancelling");
                None
            },
        }
    }

    /// Bounded mode with the configured default deadline
    pub async fn resolve_bounded(&self, request: GeocodeRequest) -> Option<GeocodeOutcome> {
        self.resolve_with_timeout(request, self.default_timeout).await
    }

    /// Unbounded mode: wait until the lookup finishes or is interrupted
    #[instrument(skip(self), fields(request = %request))]
    pub async fn resolve(&self, request: GeocodeRequest) -> Option<GeocodeOutcome> {
        let mut task = LookupTask::spawn(Arc::clone(&self.geocoder), request);
        let result = task.join().await;
        settle(result)
    }

    /// Best-match address for a coordinate (bounded)
    pub async fn address_for(&self, coordinate: Coordinate) -> Option<Address> {
        self.resolve_bounded(GeocodeRequest::ByCoordinate(coordinate))
            .await
            .and_then(GeocodeOutcome::into_address)
    }

    /// Rendered address line for a coordinate (unbounded); empty when nothing is found
    pub async fn address_line_for(&self, coordinate: Coordinate) -> String {
        let address = self
            .resolve(GeocodeRequest::ByCoordinate(coordinate))
            .await
            .and_then(GeocodeOutcome::into_address);
        Address::render_optional(address.as_ref())
    }

    /// Rendered address line for a microdegree point (unbounded)
    ///
    /// A point outside the valid range is never sent to the provider and
    /// renders as an empty line.
    pub async fn address_line_for_point(&self, point: MicroPoint) -> String {
        match point.try_to_coordinate() {
            Ok(coordinate) => self.address_line_for(coordinate).await,
            Err(e) => {
                warn!(%point, error = %e, "Point outside coordinate range, skipping lookup");
                String::new()
            },
        }
    }

    /// Best-match position for an address text, as a microdegree point (bounded)
    pub async fn point_for_address(&self, text: &str) -> Option<MicroPoint> {
        self.resolve_bounded(GeocodeRequest::ByAddressText(text.to_string()))
            .await
            .and_then(GeocodeOutcome::into_coordinate)
            .map(MicroPoint::from)
    }
}

/// Log a finished lookup and reduce it to its value
fn settle(result: Result<GeocodeOutcome, GeocodingError>) -> Option<GeocodeOutcome> {
    match result {
        Ok(outcome) => Some(outcome),
        Err(e @ (GeocodingError::NoMatch(_) | GeocodingError::Cancelled(_))) => {
            debug!(error = %e, "Geocode lookup produced no result");
            None
        },
        Err(e) => {
            warn!(error = %e, "Geocode lookup failed");
            None
        },
    }
}

/// A spawned lookup; aborted when dropped
struct LookupTask {
    handle: JoinHandle<Result<GeocodeOutcome, GeocodingError>>,
}

impl LookupTask {
    fn spawn(geocoder: Arc<dyn Geocoder>, request: GeocodeRequest) -> Self {
        let handle = tokio::spawn(async move { lookup(geocoder.as_ref(), request).await });
        Self { handle }
    }

    async fn join(&mut self) -> Result<GeocodeOutcome, GeocodingError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(GeocodingError::Cancelled("task aborted".to_string())),
            Err(e) => Err(GeocodingError::Cancelled(format!("task failed: {e}"))),
        }
    }
}

impl Drop for LookupTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One provider call, first result wins
async fn lookup(
    geocoder: &dyn Geocoder,
    request: GeocodeRequest,
) -> Result<GeocodeOutcome, GeocodingError> {
    match request {
        GeocodeRequest::ByCoordinate(coordinate) => geocoder
            .lookup_by_coordinate(coordinate.latitude(), coordinate.longitude(), MAX_RESULTS)
            .await?
            .into_iter()
            .next()
            .map(GeocodeOutcome::Address)
            .ok_or_else(|| GeocodingError::NoMatch(coordinate.to_string())),
        GeocodeRequest::ByAddressText(text) => geocoder
            .lookup_by_text(&text, MAX_RESULTS)
            .await?
            .into_iter()
            .next()
            .map(GeocodeOutcome::Coordinate)
            .ok_or(GeocodingError::NoMatch(text)),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mockall::mock;
    use tokio::time::Instant;

    use super::*;

    mock! {
        pub Provider {}

        #[async_trait]
        impl Geocoder for Provider {
            async fn lookup_by_coordinate(&self, latitude: f64, longitude: f64, max_results: usize) -> Result<Vec<Address>, GeocodingError>;
            async fn lookup_by_text(&self, text: &str, max_results: usize) -> Result<Vec<Coordinate>, GeocodingError>;
        }
    }

    /// Provider that takes `delay` to answer and records completion
    struct SlowProvider {
        delay: Duration,
        calls: AtomicUsize,
        completed: Arc<AtomicBool>,
    }

    impl SlowProvider {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: AtomicUsize::new(0),
                completed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl Geocoder for SlowProvider {
        async fn lookup_by_coordinate(
            &self,
            _latitude: f64,
            _longitude: f64,
            _max_results: usize,
        ) -> Result<Vec<Address>, GeocodingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.completed.store(true, Ordering::SeqCst);
            Ok(vec![Address::from_lines([Some("Slow St".to_string())])])
        }

        async fn lookup_by_text(
            &self,
            _text: &str,
            _max_results: usize,
        ) -> Result<Vec<Coordinate>, GeocodingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.completed.store(true, Ordering::SeqCst);
            Ok(vec![Coordinate::new_unchecked(1.0, 2.0)])
        }
    }

    fn executor(provider: impl Geocoder + 'static) -> GeocodeExecutor {
        GeocodeExecutor::new(Arc::new(provider), &GeocodeConfig::default())
    }

    fn kyiv() -> Coordinate {
        Coordinate::new(50.45, 30.52).unwrap()
    }

    fn address(lines: &[&str]) -> Address {
        Address::from_lines(lines.iter().map(|l| Some((*l).to_string())))
    }

    #[test]
    fn default_timeout_is_five_seconds() {
        let executor = executor(MockProvider::new());
        assert_eq!(executor.default_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn reverse_lookup_takes_first_result() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_coordinate()
            .withf(|lat, lon, max| (*lat - 50.45).abs() < 1e-9 && (*lon - 30.52).abs() < 1e-9 && *max == 1)
            .times(1)
            .returning(|_, _, _| Ok(vec![address(&["Khreshchatyk 1", "Kyiv"]), address(&["Other"])]));

        let found = executor(mock).address_for(kyiv()).await;
        assert_eq!(found, Some(address(&["Khreshchatyk 1", "Kyiv"])));
    }

    #[tokio::test]
    async fn forward_lookup_takes_first_result() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_text()
            .withf(|text, max| text == "Khreshchatyk 1, Kyiv" && *max == 1)
            .returning(|_, _| Ok(vec![Coordinate::new_unchecked(50.447, 30.5227), Coordinate::new_unchecked(0.0, 0.0)]));

        let point = executor(mock).point_for_address("Khreshchatyk 1, Kyiv").await;
        assert_eq!(point, Some(MicroPoint::new(50_447_000, 30_522_700)));
    }

    #[tokio::test]
    async fn no_match_is_empty() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_coordinate()
            .returning(|_, _, _| Ok(Vec::new()));
        mock.expect_lookup_by_text().returning(|_, _| Ok(Vec::new()));

        let executor = executor(mock);
        assert_eq!(executor.address_for(kyiv()).await, None);
        assert_eq!(executor.point_for_address("nowhere").await, None);
        assert_eq!(executor.address_line_for(kyiv()).await, "");
    }

    #[tokio::test]
    async fn provider_failure_is_empty() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_coordinate()
            .returning(|_, _, _| Err(GeocodingError::ConnectionFailed("refused".to_string())));

        let outcome = executor(mock)
            .resolve(GeocodeRequest::ByCoordinate(kyiv()))
            .await;
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn provider_panic_is_empty() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_text()
            .returning(|_, _| panic!("provider crashed"));

        let outcome = executor(mock)
            .resolve(GeocodeRequest::ByAddressText("Lviv".to_string()))
            .await;
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn address_line_renders_present_lines() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_coordinate().returning(|_, _, _| {
            Ok(vec![Address::from_lines([
                Some("123 Main St".to_string()),
                None,
                Some("Springfield".to_string()),
            ])])
        });

        let line = executor(mock)
            .address_line_for_point(MicroPoint::new(50_450_000, 30_520_000))
            .await;
        assert_eq!(line, "123 Main St, Springfield");
    }

    #[tokio::test]
    async fn bounded_lookup_gives_up_after_timeout() {
        let provider = SlowProvider::new(Duration::from_secs(60));
        let executor = executor(provider);

        let started = Instant::now();
        let outcome = executor
            .resolve_with_timeout(GeocodeRequest::ByCoordinate(kyiv()), Duration::from_millis(100))
            .await;

        assert_eq!(outcome, None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn timeout_cancels_the_lookup() {
        let provider = SlowProvider::new(Duration::from_millis(300));
        let completed = Arc::clone(&provider.completed);
        let executor = executor(provider);

        let outcome = executor
            .resolve_with_timeout(
                GeocodeRequest::ByAddressText("Odesa".to_string()),
                Duration::from_millis(50),
            )
            .await;
        assert_eq!(outcome, None);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn dropping_unbounded_wait_cancels_the_lookup() {
        let provider = SlowProvider::new(Duration::from_millis(300));
        let completed = Arc::clone(&provider.completed);
        let executor = executor(provider);

        let interrupted = tokio::time::timeout(
            Duration::from_millis(50),
            executor.resolve(GeocodeRequest::ByCoordinate(kyiv())),
        )
        .await;
        assert!(interrupted.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn out_of_range_point_skips_the_provider() {
        let mut mock = MockProvider::new();
        mock.expect_lookup_by_coordinate().never();

        let line = executor(mock)
            .address_line_for_point(MicroPoint::new(i32::MAX, 0))
            .await;
        assert_eq!(line, "");
    }

    #[tokio::test]
    async fn bounded_lookup_returns_result_within_deadline() {
        let executor = executor(SlowProvider::new(Duration::from_millis(10)));
        let outcome = executor
            .resolve_with_timeout(GeocodeRequest::ByCoordinate(kyiv()), Duration::from_secs(5))
            .await;
        assert_eq!(outcome, Some(GeocodeOutcome::Address(address(&["Slow St"]))));
    }

    #[tokio::test]
    async fn identical_concurrent_requests_are_not_coalesced() {
        let provider = Arc::new(SlowProvider::new(Duration::from_millis(20)));
        let executor = GeocodeExecutor::new(Arc::clone(&provider) as Arc<dyn Geocoder>, &GeocodeConfig::default());

        let request = GeocodeRequest::ByCoordinate(kyiv());
        let (a, b) = tokio::join!(
            executor.resolve(request.clone()),
            executor.resolve(request)
        );

        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn works_from_a_blocking_context() {
        let executor = executor(SlowProvider::new(Duration::from_millis(1)));
        let outcome = tokio_test::block_on(executor.resolve_bounded(GeocodeRequest::ByCoordinate(kyiv())));
        assert!(outcome.is_some());
    }
}
