//! Resolution of a query point to a weather reading.

use chrono::Duration;

use crate::cache::GeoCache;
use crate::client::UpstreamClient;
use crate::error::WeatherError;
use crate::parse::parse_payload;
use crate::types::{Point, WeatherReading};

/// The single public entry point: cache lookup, then upstream fetch, parse
/// and store on a miss. No retries live here; transport-level retry, if
/// any, belongs to the [`UpstreamClient`] implementation.
pub struct WeatherResolver<C> {
    client: C,
    cache: GeoCache,
    radius_km: f64,
    ttl: Duration,
}

impl<C: UpstreamClient> WeatherResolver<C> {
    pub fn new(client: C, radius_km: f64, ttl: Duration) -> Self {
        Self {
            client,
            cache: GeoCache::new(),
            radius_km,
            ttl,
        }
    }

    /// Resolve the weather near `point`.
    ///
    /// Fails with [`WeatherError::NoDataAvailable`] when the upstream
    /// returns nothing and propagates the parser's bad-input failure
    /// unchanged.
    pub async fn resolve(&self, point: Point) -> Result<WeatherReading, WeatherError> {
        if let Some(hit) = self.cache.lookup(point, self.radius_km) {
            tracing::debug!(%point, "resolved from cache");
            return Ok(hit);
        }

        tracing::debug!(%point, "cache miss, fetching from upstream");
        let Some(raw) = self.client.fetch(point.latitude, point.longitude).await else {
            tracing::error!(%point, "failed to retrieve weather data");
            return Err(WeatherError::NoDataAvailable);
        };

        let reading = parse_payload(&raw)?;

        // Key by what the caller asked for, not the coordinates the
        // provider echoes back, so repeated identical queries are
        // guaranteed hits regardless of provider-reported drift.
        self.cache.store(point, reading.clone(), self.ttl);

        Ok(reading)
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PAYLOAD: &str = r#"{
        "coord": {"lat": 40.7128, "lon": -74.006},
        "weather": [{"id": 800, "description": "clear sky"}],
        "main": {"temp": 25, "humidity": 50},
        "wind": {"speed": 5},
        "clouds": {"all": 0},
        "sys": {"sunrise": 1633072800, "sunset": 1633116000}
    }"#;

    struct StubClient {
        payload: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl StubClient {
        fn new(payload: Option<&str>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    payload: payload.map(str::to_string),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl UpstreamClient for StubClient {
        async fn fetch(&self, _lat: f64, _lon: f64) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload.clone()
        }
    }

    fn resolver(client: StubClient) -> WeatherResolver<StubClient> {
        WeatherResolver::new(client, 1.0, Duration::minutes(5))
    }

    #[tokio::test]
    async fn test_miss_then_hit_fetches_exactly_once() {
        let (client, calls) = StubClient::new(Some(PAYLOAD));
        let resolver = resolver(client);
        let point = Point::new(40.7128, -74.006);

        let first = resolver.resolve(point).await.unwrap();
        let second = resolver.resolve(point).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nearby_query_hits_without_second_fetch() {
        let (client, calls) = StubClient::new(Some(PAYLOAD));
        let resolver = resolver(client);

        let first = resolver.resolve(Point::new(40.7128, -74.006)).await.unwrap();
        // ~0.55 km away, inside the 1 km radius
        let second = resolver.resolve(Point::new(40.7178, -74.006)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distant_query_fetches_again() {
        let (client, calls) = StubClient::new(Some(PAYLOAD));
        let resolver = resolver(client);

        resolver.resolve(Point::new(40.7128, -74.006)).await.unwrap();
        resolver.resolve(Point::new(41.7128, -74.006)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_upstream_is_no_data_available() {
        let (client, calls) = StubClient::new(None);
        let resolver = resolver(client);

        let err = resolver.resolve(Point::new(51.51, -0.13)).await.unwrap_err();
        assert!(matches!(err, WeatherError::NoDataAvailable));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload_propagates_and_caches_nothing() {
        let (client, _calls) = StubClient::new(Some(r#"{"invalid_json"}"#));
        let resolver = resolver(client);

        let err = resolver.resolve(Point::new(51.51, -0.13)).await.unwrap_err();
        assert!(matches!(err, WeatherError::MalformedInput(_)));
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_stores_under_query_point_not_provider_echo() {
        // The stub payload echoes coord (40.7128, -74.006); query somewhere
        // else entirely and the reading must still be cached at the query.
        let (client, calls) = StubClient::new(Some(PAYLOAD));
        let resolver = resolver(client);
        let query = Point::new(56.971, 24.1604);

        resolver.resolve(query).await.unwrap();

        assert!(resolver.cache().lookup(query, 1.0).is_some());
        assert!(resolver
            .cache()
            .lookup(Point::new(40.7128, -74.006), 1.0)
            .is_none());

        resolver.resolve(query).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
