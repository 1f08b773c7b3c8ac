//! cityfinder - nearest-city and city-name lookups over GeoNames
//!
//! The GeoNames `cities*.txt` dump is loaded once into an in-memory, read-only store.
//! Two queries run over it:
//!
//! - **Proximity**: the `top_k` cities closest to a given city, optionally within one
//!   country. Distance is plain Euclidean distance on (latitude, longitude) degrees.
//! - **Lexicographic**: cities whose ASCII name contains the words of a query in order,
//!   sorted by ASCII name.
//!
//! Both are exposed through [`CityService`] and over HTTP by [`server`].
//!
//! ```rust,no_run
//! use cityfinder::{CityService, ServiceConfig};
//!
//! let config = ServiceConfig::builder().data_file("cities1000.txt").build();
//! let service = CityService::from_config(&config)?;
//!
//! // The five cities closest to San Jose, California (San Jose itself first)
//! let closest = service.proximity_query(5392171, 5, None)?;
//!
//! // Cities called "san ... jose" in the US, alphabetically
//! let named = service.lexicographic_query("san jose", Some(10), Some("US"))?;
//! # Ok::<(), cityfinder::error::CityFinderError>(())
//! ```
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
pub mod error;
pub mod search;
pub mod server;
mod service;
pub mod store;

pub use cityfinder_data_processing as data_processing;
pub use cityfinder_data_processing::{CityRecord, DataSource, LoadFilter};
pub use config::{DEFAULT_MATCH_LIMIT, ServiceConfig, ServiceConfigBuilder};
pub use search::CityHit;
pub use service::{CityService, QueryError};
pub use store::{CityStore, InMemoryCityStore, StoreStats};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for cityfinder.
///
/// `RUST_LOG` takes precedence over `level` when it is set. Calling this more than
/// once is harmless; only the first call installs the subscriber.
///
/// ```rust
/// use cityfinder::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), cityfinder::error::CityFinderError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::CityFinderError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?)
            .add_directive("hyper=warn".parse()?)
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_processing::{TestDataConfig, create_test_data};

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    fn sample_service() -> CityService {
        let file = create_test_data(&TestDataConfig::sample()).unwrap();
        let config = ServiceConfig::builder().data_file(file.path()).build();
        CityService::from_config(&config).unwrap()
    }

    #[test]
    fn test_init_logging_twice() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[test]
    fn test_service_from_test_data() {
        setup_test_env();

        let service = sample_service();
        assert_eq!(service.stats().cities, 40);
    }

    #[tokio::test]
    async fn test_load_inside_runtime() {
        setup_test_env();

        let file = create_test_data(&TestDataConfig::sample()).unwrap();
        let config = ServiceConfig::builder().data_file(file.path()).build();
        let service = CityService::load(config).await.unwrap();

        assert_eq!(service.stats().cities, 40);
    }

    #[test]
    fn test_san_jose_neighbours() {
        setup_test_env();

        let service = sample_service();
        let hits = service.proximity_query(5392171, 3, Some("US")).unwrap();

        assert_eq!(hits[0], CityHit("San Jose".to_string(), 5392171));
        assert_eq!(hits[1], CityHit("San Francisco".to_string(), 5391959));
    }

    #[test]
    fn test_load_filter_applies() {
        setup_test_env();

        let file = create_test_data(&TestDataConfig::sample()).unwrap();
        let config = ServiceConfig::builder()
            .data_file(file.path())
            .countries(["DE"])
            .build();
        let service = CityService::from_config(&config).unwrap();

        let hits = service.lexicographic_query("", None, None).unwrap();
        let names: Vec<&str> = hits.iter().map(CityHit::name).collect();
        assert_eq!(names, vec!["Berlin", "München"]);
    }
}
