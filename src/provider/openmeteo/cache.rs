use crate::provider::openmeteo::rest::{ForecastRequest, OpenMeteoClient};
use crate::provider::openmeteo::types::FetchedForecast;
use crate::provider::openmeteo::FetchError;
use crate::utils::config::FetchConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key: coordinates rounded to four decimals (about 11 m) plus the
/// request shape. Two requests for the same point, model set and horizon
/// share one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e4: i64,
    lon_e4: i64,
    models: String,
    forecast_days: u32,
}

impl CacheKey {
    pub fn for_request(request: &ForecastRequest) -> Self {
        Self {
            lat_e4: (request.latitude * 1e4).round() as i64,
            lon_e4: (request.longitude * 1e4).round() as i64,
            models: request.models_param(),
            forecast_days: request.forecast_days,
        }
    }
}

/// TTL cache of fetched snapshots, shared across concurrent invocations.
///
/// The core treats this as opaque: it asks for a snapshot and accepts
/// whatever comes back. Entries are evicted lazily on access.
pub struct FetchCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

struct CacheEntry {
    fetched_at: Instant,
    snapshot: Arc<FetchedForecast>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(Duration::from_secs(config.cache_ttl_secs))
    }

    /// Look up a live snapshot; expired entries are removed on the way.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<FetchedForecast>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.fetched_at.elapsed() <= self.ttl => {
                return Some(Arc::clone(&entry.snapshot));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: CacheKey, snapshot: FetchedForecast) -> Arc<FetchedForecast> {
        let snapshot = Arc::new(snapshot);
        self.entries.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                snapshot: Arc::clone(&snapshot),
            },
        );
        snapshot
    }

    /// Serve from cache or fetch and remember.
    pub async fn get_or_fetch(
        &self,
        client: &OpenMeteoClient,
        request: &ForecastRequest,
    ) -> Result<Arc<FetchedForecast>, FetchError> {
        let key = CacheKey::for_request(request);
        if let Some(snapshot) = self.get(&key) {
            debug!("Serving forecast from cache");
            return Ok(snapshot);
        }
        let fetched = client.fetch(request).await?;
        Ok(self.insert(key, fetched))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldKind, RawSeries, SourceDescriptor};
    use chrono::NaiveDate;

    fn snapshot() -> FetchedForecast {
        let start = NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let index = (0..2)
            .map(|i| start + chrono::Duration::hours(i))
            .collect();
        let mut builder = RawSeries::builder(index).unwrap();
        builder.add_source(SourceDescriptor::deterministic(
            "gfs_seamless",
            vec![FieldKind::Temperature],
        ));
        FetchedForecast {
            series: builder.build(),
            latitude: -2.5757,
            longitude: 140.5185,
            timezone: "Asia/Jayapura".to_string(),
            utc_offset_seconds: 32400,
        }
    }

    fn request() -> ForecastRequest {
        ForecastRequest {
            latitude: -2.5757,
            longitude: 140.5185,
            timezone: "Asia/Jayapura".to_string(),
            forecast_days: 3,
            sources: vec![SourceDescriptor::deterministic(
                "gfs_seamless",
                vec![FieldKind::Temperature],
            )],
        }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = FetchCache::new(Duration::from_secs(60));
        let key = CacheKey::for_request(&request());
        cache.insert(key.clone(), snapshot());
        assert!(cache.get(&key).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_evicted() {
        let cache = FetchCache::new(Duration::from_millis(10));
        let key = CacheKey::for_request(&request());
        cache.insert(key.clone(), snapshot());
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_nearby_coordinates_share_a_key() {
        let mut close = request();
        close.latitude = -2.57572; // rounds to the same 1e-4 cell
        assert_eq!(
            CacheKey::for_request(&request()),
            CacheKey::for_request(&close)
        );

        let mut far = request();
        far.latitude = -2.5800;
        assert_ne!(CacheKey::for_request(&request()), CacheKey::for_request(&far));
    }

    #[test]
    fn test_different_model_sets_do_not_collide() {
        let mut other = request();
        other.sources = vec![SourceDescriptor::deterministic(
            "ecmwf_ifs",
            vec![FieldKind::Temperature],
        )];
        assert_ne!(
            CacheKey::for_request(&request()),
            CacheKey::for_request(&other)
        );
    }
}
