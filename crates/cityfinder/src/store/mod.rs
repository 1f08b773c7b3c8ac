//! Read-only record store over the loaded city table.
//!
//! Records are kept in ascending geonameid order. That order is the one every scan
//! yields, and it is the tie-break for every ranking built on top of a scan.

use ahash::AHashMap;
use cityfinder_data_processing::{CityData, CityRecord, DataError};
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::ServiceConfig;
use crate::error::Result;

pub type CitiesIter<'a> = Box<dyn Iterator<Item = &'a CityRecord> + 'a>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub cities: usize,
    /// Distinct non-empty country codes.
    pub countries: usize,
}

/// Lookup surface the query service runs against.
pub trait CityStore: Send + Sync {
    /// Exact lookup by geonameid. A miss is `None`, not an error.
    fn get_by_id(&self, id: u32) -> Option<&CityRecord>;

    /// All records, or only those whose country code equals `country` exactly,
    /// in ascending geonameid order.
    fn scan<'a>(&'a self, country: Option<&'a str>) -> CitiesIter<'a>;

    fn stats(&self) -> StoreStats;
}

/// Store that keeps every record in memory, with a hash index on geonameid.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCityStore {
    records: Vec<CityRecord>,
    index: AHashMap<u32, usize>,
}

impl InMemoryCityStore {
    /// Builds the store from already loaded records.
    ///
    /// The records are put in geonameid order; a repeated geonameid is rejected.
    pub fn from_records(mut records: Vec<CityRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.geoname_id);

        let mut index = AHashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if index.insert(record.geoname_id, pos).is_some() {
                return Err(DataError::DuplicateGeonameId(record.geoname_id).into());
            }
        }

        Ok(Self { records, index })
    }

    /// Loads the city table described by `config`.
    ///
    /// An explicit `data_file` is read directly. Otherwise the configured data source is
    /// resolved under the data directory, downloading it when allowed.
    ///
    /// Must not be called from an async context: polars and the downloader both block on
    /// a runtime of their own. Async callers go through `spawn_blocking`.
    #[instrument(name = "Load city store", skip_all, level = "info")]
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        let t_load = std::time::Instant::now();
        let data = match &config.data_file {
            Some(path) => CityData::from_path(path, config.load_filter.clone()),
            None => CityData::from_source(config.data_source, config.load_filter.clone())?,
        };

        let store = Self::from_records(data.load_records()?)?;
        info!(
            path = ?data.raw_path(),
            cities = store.len(),
            elapsed = ?t_load.elapsed(),
            "City store loaded"
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CityStore for InMemoryCityStore {
    fn get_by_id(&self, id: u32) -> Option<&CityRecord> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    fn scan<'a>(&'a self, country: Option<&'a str>) -> CitiesIter<'a> {
        match country {
            Some(code) => Box::new(self.records.iter().filter(move |r| r.country_code == code)),
            None => Box::new(self.records.iter()),
        }
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            cities: self.records.len(),
            countries: self
                .records
                .iter()
                .map(|r| r.country_code.as_str())
                .filter(|code| !code.is_empty())
                .unique()
                .count(),
        }
    }
}
