//! Ranking and matching over a candidate set of cities.
//!
//! Both rankers take candidates in store order and keep that order for ties.

mod name_match;
mod proximity;

use serde::Serialize;

pub use name_match::{match_by_name, matches_ordered, resolve_limit, tokenize};
pub use proximity::{planar_distance, rank_by_proximity};

/// A ranked city: display name and geonameid.
///
/// Serializes as a two element JSON array, `["San Jose", 5392171]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityHit(pub String, pub u32);

impl CityHit {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn geoname_id(&self) -> u32 {
        self.1
    }
}

impl From<&cityfinder_data_processing::CityRecord> for CityHit {
    fn from(record: &cityfinder_data_processing::CityRecord) -> Self {
        Self(record.name.clone(), record.geoname_id)
    }
}
