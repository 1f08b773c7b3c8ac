use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use cityfinder_data_processing::{DataSource, LoadFilter};

use crate::error::{CityFinderError, Result};

/// Limit applied to name matches when the caller gives none.
pub const DEFAULT_MATCH_LIMIT: usize = 100;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to load the city table and serve queries over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
    /// GeoNames dump to load when no explicit `data_file` is given.
    pub data_source: DataSource,
    /// Explicit path to a `cities*.txt` dump. Bypasses the data directory and the parquet cache.
    pub data_file: Option<PathBuf>,
    pub load_filter: LoadFilter,
    /// Name-match limit used when a lexicographic query has no positive `top_k`.
    pub default_match_limit: usize,
    /// Upper bound on the time a single query may take.
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            data_source: DataSource::default(),
            data_file: None,
            load_filter: LoadFilter::default(),
            default_match_limit: DEFAULT_MATCH_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }
}

/// Builder for [`ServiceConfig`]
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Create a new builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn data_source(mut self, data_source: DataSource) -> Self {
        self.config.data_source = data_source;
        self
    }

    /// Load this dump file instead of resolving one from the data directory
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = Some(path.into());
        self
    }

    /// Only load cities with at least this population
    pub fn min_population(mut self, min_population: i64) -> Self {
        self.config.load_filter.min_population = Some(min_population);
        self
    }

    /// Only load cities from these countries
    pub fn countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let countries: Vec<String> = countries.into_iter().map(Into::into).collect();
        self.config.load_filter.countries = (!countries.is_empty()).then_some(countries);
        self
    }

    /// Set the limit used when a name query has no usable `top_k`
    pub fn default_match_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(CityFinderError::ConfigError(
                "default match limit must be greater than zero".to_string(),
            ));
        }
        self.config.default_match_limit = limit;
        Ok(self)
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(CityFinderError::ConfigError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        self.config.request_timeout = timeout;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();

        assert_eq!(config.default_match_limit, 100);
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.data_source, DataSource::Cities1000);
        assert!(config.data_file.is_none());
        assert!(config.load_filter.is_empty());
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = ServiceConfig::builder()
            .data_file("/tmp/cities.txt")
            .min_population(5000)
            .countries(["US", "FR"])
            .default_match_limit(10)
            .unwrap()
            .request_timeout(Duration::from_secs(2))
            .unwrap()
            .build();

        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/cities.txt")));
        assert_eq!(config.load_filter.min_population, Some(5000));
        assert_eq!(
            config.load_filter.countries,
            Some(vec!["US".to_string(), "FR".to_string()])
        );
        assert_eq!(config.default_match_limit, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_empty_country_list_means_no_filter() {
        let config = ServiceConfig::builder()
            .countries(Vec::<String>::new())
            .build();
        assert!(config.load_filter.countries.is_none());
    }

    #[test]
    fn test_rejects_zero_values() {
        assert!(matches!(
            ServiceConfig::builder().default_match_limit(0),
            Err(CityFinderError::ConfigError(_))
        ));
        assert!(ServiceConfig::builder()
            .request_timeout(Duration::ZERO)
            .is_err());
    }
}
