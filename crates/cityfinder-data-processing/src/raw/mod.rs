use polars::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, instrument, warn};

#[cfg(feature = "download_data")]
pub mod fetch;

pub use super::error::Result;

const GEONAMES_DUMP_URL: &str = "https://download.geonames.org/export/dump";

/// Which GeoNames cities dump to load.
///
/// The number is the population threshold GeoNames used when cutting the dump
/// (`cities1000` holds every populated place with at least 1000 inhabitants, plus
/// seats of administrative divisions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataSource {
    Cities500,
    #[default]
    Cities1000,
    Cities5000,
    Cities15000,
}

impl DataSource {
    fn stem(self) -> &'static str {
        match self {
            Self::Cities500 => "cities500",
            Self::Cities1000 => "cities1000",
            Self::Cities5000 => "cities5000",
            Self::Cities15000 => "cities15000",
        }
    }

    /// Name of the tab-separated dump inside the zip archive, e.g. `cities1000.txt`.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Cities500 => "cities500.txt",
            Self::Cities1000 => "cities1000.txt",
            Self::Cities5000 => "cities5000.txt",
            Self::Cities15000 => "cities15000.txt",
        }
    }

    pub fn geonames_url(self) -> String {
        format!("{GEONAMES_DUMP_URL}/{}.zip", self.stem())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cities500" | "500" => Ok(Self::Cities500),
            "cities1000" | "1000" => Ok(Self::Cities1000),
            "cities5000" | "5000" => Ok(Self::Cities5000),
            "cities15000" | "15000" => Ok(Self::Cities15000),
            other => Err(format!(
                "unknown data source {other:?}, expected one of cities500, cities1000, cities5000, cities15000"
            )),
        }
    }
}

/// Optional load-time restriction of the city table.
///
/// Applied while the dump is scanned, so filtered-out rows never reach the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadFilter {
    /// Drop cities with a population below this value (rows with no population are dropped too).
    pub min_population: Option<i64>,
    /// Keep only these ISO-3166 alpha-2 country codes (exact match).
    pub countries: Option<Vec<String>>,
}

impl LoadFilter {
    pub fn is_empty(&self) -> bool {
        self.min_population.is_none() && self.countries.as_ref().is_none_or(Vec::is_empty)
    }

    pub fn apply(&self, lf: LazyFrame) -> LazyFrame {
        let mut lf = lf;
        if let Some(min_population) = self.min_population {
            lf = lf.filter(col("population").gt_eq(lit(min_population)));
        }
        let country_predicate = self.countries.as_ref().and_then(|countries| {
            countries
                .iter()
                .map(|code| col("country_code").eq(lit(code.clone())))
                .reduce(|acc, next| acc.or(next))
        });
        if let Some(predicate) = country_predicate {
            lf = lf.filter(predicate);
        }
        lf
    }
}

/// Column layout of the GeoNames `cities*.txt` / `allCountries.txt` dumps.
///
/// `modification_date` is kept as text here and parsed with chrono when records are built,
/// so a malformed date is reported with the offending geonameid.
pub const CITIES_SCHEMA: [(PlSmallStr, DataType); 19] = [
    (PlSmallStr::from_static("geonameId"), DataType::UInt32),
    (PlSmallStr::from_static("name"), DataType::String),
    (PlSmallStr::from_static("asciiname"), DataType::String),
    (PlSmallStr::from_static("alternatenames"), DataType::String),
    (PlSmallStr::from_static("latitude"), DataType::Float64),
    (PlSmallStr::from_static("longitude"), DataType::Float64),
    (PlSmallStr::from_static("feature_class"), DataType::String),
    (PlSmallStr::from_static("feature_code"), DataType::String),
    (PlSmallStr::from_static("country_code"), DataType::String),
    (PlSmallStr::from_static("cc2"), DataType::String),
    (PlSmallStr::from_static("admin1_code"), DataType::String),
    (PlSmallStr::from_static("admin2_code"), DataType::String),
    (PlSmallStr::from_static("admin3_code"), DataType::String),
    (PlSmallStr::from_static("admin4_code"), DataType::String),
    (PlSmallStr::from_static("population"), DataType::Int64),
    (PlSmallStr::from_static("elevation"), DataType::Int32),
    (PlSmallStr::from_static("dem"), DataType::Int32),
    (PlSmallStr::from_static("timezone"), DataType::String),
    (PlSmallStr::from_static("modification_date"), DataType::String),
];

/// Lazily scans a GeoNames cities dump.
///
/// GeoNames does not quote fields, and names such as `'Ali Sabieh` or `"Kolonia"` carry
/// literal quote characters, so quoting is switched off entirely.
pub fn get_cities_lf(path: impl AsRef<Path>) -> Result<LazyFrame> {
    Ok(LazyCsvReader::new(path)
        .with_separator(b'\t')
        .with_has_header(false)
        .with_quote_char(None)
        .with_schema(Some(Schema::from_iter(CITIES_SCHEMA).into()))
        .finish()?)
}

/// Locate the raw dump for `data_source`, downloading it when it is missing.
///
/// Looks for `<DATA_DIR>/raw/<file_name>`. When the file is absent and the
/// `download_data` feature is enabled, the dump is fetched from GeoNames and stored there.
#[instrument(name = "Get GeoNames raw data", skip_all, fields(source = %data_source), level = "info")]
pub fn get_raw_data(data_source: DataSource) -> Result<PathBuf> {
    let raw_dir = crate::get_data_dir().join("raw");
    let path = raw_dir.join(data_source.file_name());
    info!("Checking for raw data in: {}", raw_dir.display());

    if path.exists() {
        info!(path = ?path, "Found existing raw data file");
        return Ok(path);
    }

    warn!(path = ?path, "Raw data file not found");

    #[cfg(feature = "download_data")]
    {
        info!("Attempting to download raw data as download_data feature is enabled.");
        fetch::download_data(data_source, &path)?;
        Ok(path)
    }
    #[cfg(not(feature = "download_data"))]
    {
        warn!("Download_data feature is disabled. Cannot download missing files.");
        Err(crate::DataError::RequiredFilesNotFound(
            path.display().to_string(),
        ))
    }
}
