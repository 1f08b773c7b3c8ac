use super::error::Result;
use crate::raw::{DataSource, LoadFilter, get_cities_lf, get_raw_data};
use crate::records::{CityRecord, records_from_df};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, instrument, warn};

/// The processed city table and where it comes from.
///
/// With a parquet cache the raw dump is parsed once; later loads scan the cached file
/// unless the dump is newer than the cache.
#[derive(Debug, Clone)]
pub struct CityData {
    raw_path: PathBuf,
    cache_path: Option<PathBuf>,
    filter: LoadFilter,
}

impl CityData {
    /// Resolve (and if needed download) the dump for `data_source` under the data directory,
    /// caching the processed table in `<DATA_DIR>/processed/`.
    pub fn from_source(data_source: DataSource, filter: LoadFilter) -> Result<Self> {
        let raw_path = get_raw_data(data_source)?;

        let processed_dir = crate::get_data_dir().join("processed");
        fs::create_dir_all(&processed_dir)?;
        let cache_path = processed_dir.join(format!("{data_source}.parquet"));

        Ok(Self {
            raw_path,
            cache_path: Some(cache_path),
            filter,
        })
    }

    /// Use an explicit dump file. Nothing is cached.
    pub fn from_path(path: impl Into<PathBuf>, filter: LoadFilter) -> Self {
        Self {
            raw_path: path.into(),
            cache_path: None,
            filter,
        }
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    /// Loads every record that passes the load filter, sorted by geonameid.
    #[instrument(name = "Load city records", skip_all, fields(path = ?self.raw_path), level = "info")]
    pub fn load_records(&self) -> Result<Vec<CityRecord>> {
        let t_load = std::time::Instant::now();
        let lf = self.processed_lf()?;
        let df = {
            let _span = info_span!("Collect city table").entered();
            self.filter.apply(lf).collect()?
        };
        info!(
            rows = df.height(),
            filtered = !self.filter.is_empty(),
            time_collected = ?t_load.elapsed(),
            "Collected city table into memory"
        );
        records_from_df(&df)
    }

    fn processed_lf(&self) -> Result<LazyFrame> {
        let Some(cache_path) = &self.cache_path else {
            return Ok(get_processed_lf(get_cities_lf(&self.raw_path)?));
        };

        if is_cache_fresh(&self.raw_path, cache_path) {
            info!(path = ?cache_path.file_name(), "Loading existing Parquet file");
            return Ok(LazyFrame::scan_parquet(cache_path, Default::default())?);
        }

        info!("Generating processed data from raw source");
        let transform_time = std::time::Instant::now();
        let mut df = get_processed_lf(get_cities_lf(&self.raw_path)?).collect()?;
        info!(
            transform_time = ?transform_time.elapsed(),
            "Transforming data took"
        );

        if let Err(e) = save_df_to_parquet(&mut df, cache_path) {
            warn!(error = %e, path = ?cache_path, "Could not write parquet cache, continuing without it");
        }
        Ok(df.lazy())
    }
}

/// Puts the raw table into store order: ascending geonameid.
pub fn get_processed_lf(cities_lf: LazyFrame) -> LazyFrame {
    cities_lf.sort(["geonameId"], SortMultipleOptions::default())
}

fn save_df_to_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let sink_time = std::time::Instant::now();
    let mut file = fs::File::create(path)?;
    ParquetWriter::new(&mut file).finish(df)?;

    info!(
        path = ?path.file_stem(),
        sink_time = ?sink_time.elapsed(),
        "Saved to parquet file"
    );
    Ok(())
}

fn is_cache_fresh(raw_path: &Path, cache_path: &Path) -> bool {
    let Ok(cache_time) = fs::metadata(cache_path).and_then(|m| m.modified()) else {
        return false;
    };
    fs::metadata(raw_path)
        .and_then(|m| m.modified())
        .is_ok_and(|raw_time| raw_time <= cache_time)
}
