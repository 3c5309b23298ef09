//! Geo-indexed, TTL-bounded cache of weather readings.
//!
//! Readings are cached at the resolution of the originating query point,
//! not snapped to a grid; repeated queries at slightly different
//! coordinates create multiple nearby entries and the radius search is
//! what collapses them into effective hits. The cache is a performance
//! optimization, never a correctness dependency: every lookup failure
//! mode degrades to a miss.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::geo::GeoIndex;
use crate::types::{Point, WeatherReading};

/// A cached reading plus its bookkeeping. Owned exclusively by the cache:
/// created on `store`, gone on TTL expiry or `clear`.
#[derive(Debug, Clone)]
struct CacheEntry {
    reading: WeatherReading,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    index: GeoIndex,
}

/// Shared in-process cache mapping geo-located keys to readings.
///
/// `lookup` takes a read lock, `store`/`clear` a write lock, so independent
/// resolve calls may use one instance concurrently. Same-point stores race
/// last-write-wins; lookup-then-store is not atomic and a duplicate
/// upstream fetch under that race is tolerated.
#[derive(Default)]
pub struct GeoCache {
    state: RwLock<CacheState>,
}

impl GeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nearest non-expired reading within `radius_km` of `query`, if any.
    pub fn lookup(&self, query: Point, radius_km: f64) -> Option<WeatherReading> {
        self.lookup_at(Utc::now(), query, radius_km)
    }

    /// Cache `reading` under `point`'s own coordinates for `ttl`.
    ///
    /// Overwrites any existing entry for the identical point.
    pub fn store(&self, point: Point, reading: WeatherReading, ttl: Duration) {
        self.store_at(Utc::now(), point, reading, ttl);
    }

    /// Drop all entries and index points.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.index.clear();
        tracing::debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup against an explicit clock. Expiry is lazy: entries are never
    /// swept, only filtered here when read past `expires_at`.
    fn lookup_at(
        &self,
        now: DateTime<Utc>,
        query: Point,
        radius_km: f64,
    ) -> Option<WeatherReading> {
        let state = self.state.read();

        let candidates = state.index.within_radius(query, radius_km);
        // Minimum distance wins; exact ties are broken arbitrarily, which
        // is acceptable since distances differing only in floating
        // rounding are practically equivalent.
        let nearest = candidates.into_iter().min_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        // Recovery boundary for the lookup path: an index pointer whose
        // entry is gone or lapsed must not produce a hit, and must not
        // fail the request either.
        let Some(entry) = state.entries.get(&nearest.key) else {
            tracing::warn!(key = %nearest.key, "stale index pointer, treating as miss");
            return None;
        };
        if entry.expires_at <= now {
            tracing::debug!(key = %nearest.key, "cached reading expired, treating as miss");
            return None;
        }

        tracing::debug!(
            key = %nearest.key,
            distance_km = nearest.distance_km,
            "cache hit"
        );
        Some(entry.reading.clone())
    }

    /// Store against an explicit clock.
    fn store_at(
        &self,
        now: DateTime<Utc>,
        point: Point,
        reading: WeatherReading,
        ttl: Duration,
    ) {
        let key = point.cache_key();
        let expires_at = now + ttl;

        let mut state = self.state.write();
        state.entries.insert(
            key.clone(),
            CacheEntry {
                reading,
                expires_at,
            },
        );
        state.index.insert(key.clone(), point);
        tracing::info!(%key, %expires_at, "cached weather reading");
    }
}
