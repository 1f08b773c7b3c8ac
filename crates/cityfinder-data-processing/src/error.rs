use polars::prelude::PolarsError;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[cfg(feature = "download_data")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "download_data")]
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),
    #[error("Invalid modification date {value:?} for geonameid={geoname_id}: {source}")]
    InvalidDate {
        geoname_id: u32,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Duplicate geonameid={0} in city dump")]
    DuplicateGeonameId(u32),
    #[error("Required data file not found: {0}")]
    RequiredFilesNotFound(String),
}
