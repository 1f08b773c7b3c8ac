//! Query service: the two city queries over a [`CityStore`].
//!
//! Outcomes are typed. A lookup miss is [`QueryError::CityNotFound`], bad input is
//! [`QueryError::Validation`], and transports decide how to present each.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::ServiceConfig;
use crate::search::{CityHit, match_by_name, rank_by_proximity, resolve_limit};
use crate::store::{CityStore, InMemoryCityStore, StoreStats};

pub use error::QueryError;
use error::Result;

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum QueryError {
        #[error("Did not find city_id={city_id}")]
        CityNotFound { city_id: i64 },
        #[error("{0}")]
        Validation(String),
        #[error("{0}")]
        Internal(String),
    }
    pub type Result<T> = std::result::Result<T, QueryError>;
}

/// Answers proximity and name queries against a shared, read-only store.
#[derive(Clone)]
pub struct CityService {
    store: Arc<dyn CityStore>,
    default_match_limit: usize,
}

impl std::fmt::Debug for CityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CityService")
            .field("stats", &self.store.stats())
            .field("default_match_limit", &self.default_match_limit)
            .finish()
    }
}

impl CityService {
    pub fn new(store: impl CityStore + 'static, default_match_limit: usize) -> Self {
        Self {
            store: Arc::new(store),
            default_match_limit,
        }
    }

    /// Loads the city table described by `config` and wraps it in a service.
    ///
    /// Blocking. polars drives its own tokio runtime while collecting, so this panics when
    /// called on a thread that is running async tasks; use [`CityService::load`] there.
    pub fn from_config(config: &ServiceConfig) -> crate::error::Result<Self> {
        let store = InMemoryCityStore::load(config)?;
        Ok(Self::new(store, config.default_match_limit))
    }

    /// [`CityService::from_config`] for async callers, run on the blocking pool.
    pub async fn load(config: ServiceConfig) -> crate::error::Result<Self> {
        tokio::task::spawn_blocking(move || Self::from_config(&config)).await?
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// The `top_k` cities closest to `city_id`, nearest first.
    ///
    /// The origin is looked up without the country restriction and is part of its own
    /// result when it passes the restriction. An empty restriction means none.
    #[instrument(name = "Proximity query", skip(self), level = "info")]
    pub fn proximity_query(
        &self,
        city_id: i64,
        top_k: i64,
        country_restriction: Option<&str>,
    ) -> Result<Vec<CityHit>> {
        let origin = u32::try_from(city_id)
            .ok()
            .and_then(|id| self.store.get_by_id(id))
            .ok_or(QueryError::CityNotFound { city_id })?;

        let country = normalize_country(country_restriction);
        let hits = rank_by_proximity(origin, self.store.scan(country), top_k);

        info!(hits = hits.len(), "Proximity query done");
        Ok(hits)
    }

    /// Cities whose ASCII name matches `name_match`, in ASCII name order.
    ///
    /// A missing or non-positive `top_k` falls back to the configured default limit.
    #[instrument(name = "Lexicographic query", skip(self), level = "info")]
    pub fn lexicographic_query(
        &self,
        name_match: &str,
        top_k: Option<i64>,
        country_restriction: Option<&str>,
    ) -> Result<Vec<CityHit>> {
        let limit = resolve_limit(top_k, self.default_match_limit);
        let country = normalize_country(country_restriction);
        let hits = match_by_name(name_match, self.store.scan(country), limit);

        info!(hits = hits.len(), limit, "Lexicographic query done");
        Ok(hits)
    }
}

fn normalize_country(country: Option<&str>) -> Option<&str> {
    country.filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityfinder_data_processing::CityRecord;

    fn city(id: u32, name: &str, country: &str, latitude: f64, longitude: f64) -> CityRecord {
        CityRecord {
            geoname_id: id,
            name: name.to_string(),
            asciiname: name.to_string(),
            country_code: country.to_string(),
            latitude,
            longitude,
            ..Default::default()
        }
    }

    fn service() -> CityService {
        let store = InMemoryCityStore::from_records(vec![
            city(1, "San Jose", "US", 37.3, -121.9),
            city(2, "San Francisco", "US", 37.8, -122.4),
            city(3, "Josean Sands", "US", 36.0, -120.0),
            city(4, "San Jacinto Jose", "US", 33.8, -117.0),
            city(5, "Tijuana", "MX", 32.5, -117.0),
        ])
        .unwrap();
        CityService::new(store, 3)
    }

    #[test]
    fn test_proximity_includes_origin_first() {
        let hits = service().proximity_query(1, 2, None).unwrap();

        assert_eq!(
            hits,
            vec![
                CityHit("San Jose".to_string(), 1),
                CityHit("San Francisco".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_proximity_unknown_city() {
        let service = service();

        assert_eq!(
            service.proximity_query(42, 5, None),
            Err(QueryError::CityNotFound { city_id: 42 })
        );
        assert_eq!(
            service.proximity_query(-1, 5, None),
            Err(QueryError::CityNotFound { city_id: -1 })
        );
        assert_eq!(
            service.proximity_query(i64::from(u32::MAX) + 1, 5, None),
            Err(QueryError::CityNotFound {
                city_id: i64::from(u32::MAX) + 1
            })
        );
        assert_eq!(
            QueryError::CityNotFound { city_id: 42 }.to_string(),
            "Did not find city_id=42"
        );
    }

    #[test]
    fn test_proximity_restriction_can_exclude_origin() {
        let hits = service().proximity_query(1, 10, Some("MX")).unwrap();

        assert_eq!(hits, vec![CityHit("Tijuana".to_string(), 5)]);
    }

    #[test]
    fn test_empty_restriction_is_no_restriction() {
        let service = service();

        assert_eq!(
            service.proximity_query(1, 10, Some("")).unwrap(),
            service.proximity_query(1, 10, None).unwrap()
        );
        assert_eq!(service.lexicographic_query("", None, Some("")).unwrap().len(), 3);
    }

    #[test]
    fn test_lexicographic_default_limit() {
        let service = service();

        assert_eq!(service.lexicographic_query("", None, None).unwrap().len(), 3);
        assert_eq!(service.lexicographic_query("", Some(0), None).unwrap().len(), 3);
        assert_eq!(service.lexicographic_query("", Some(5), None).unwrap().len(), 5);
    }

    #[test]
    fn test_lexicographic_order_and_restriction() {
        let service = service();

        let hits = service.lexicographic_query("san jose", None, None).unwrap();
        let ids: Vec<u32> = hits.iter().map(CityHit::geoname_id).collect();
        assert_eq!(ids, vec![4, 1]);

        assert!(
            service
                .lexicographic_query("san jose", None, Some("MX"))
                .unwrap()
                .is_empty()
        );
    }
}
