//! Loading pipeline for the GeoNames cities dumps.
//!
//! Reads a tab-separated `cities*.txt` dump with polars, drops rows that cannot be used
//! for proximity queries, orders the table by geonameid and hands out typed
//! [`CityRecord`]s. The processed table is cached as parquet under the data directory.
use once_cell::sync::Lazy;
use std::path::PathBuf;
use tracing::warn;

mod error;
pub mod processed;
pub mod raw;
pub mod records;
pub mod test_data;

pub use error::{DataError, Result};
pub use processed::CityData;
pub use raw::{DataSource, LoadFilter};
pub use records::CityRecord;
pub use test_data::{TestDataConfig, create_cities_file, create_test_data};

#[cfg(test)]
static TEST_DATA_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
    tempfile::TempDir::new().expect("Failed to create global temporary test data directory")
});

pub const DATA_DIR_DEFAULT: &str = "./cityfinder_data";

/// Global data directory path.
///
/// `DATA_DIR` wins when set. Otherwise the platform data directory is used with the
/// `system-dirs` feature, and `./cityfinder_data` without it.
pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(resolve_data_dir);

#[cfg(test)]
fn resolve_data_dir() -> PathBuf {
    let temp_dir = TEST_DATA_DIR.path().to_path_buf();
    warn!(temp_dir = ?temp_dir, "Using temporary data directory for tests");
    temp_dir
}

#[cfg(not(test))]
fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DATA_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(feature = "system-dirs")]
    let system_dir = directories::ProjectDirs::from("", "", "cityfinder")
        .map(|dirs| dirs.data_dir().to_path_buf());
    #[cfg(not(feature = "system-dirs"))]
    let system_dir: Option<PathBuf> = None;

    system_dir.unwrap_or_else(|| {
        warn!("DATA_DIR not set, falling back to {}", DATA_DIR_DEFAULT);
        PathBuf::from(DATA_DIR_DEFAULT)
    })
}

pub fn get_data_dir() -> PathBuf {
    DATA_DIR.clone()
}
