//! Typed city records built from the processed city table.

use chrono::NaiveDate;
use itertools::izip;
use polars::prelude::DataFrame;
use tracing::{info, instrument, warn};

use crate::error::{DataError, Result};

/// Format of the `modification_date` column in the GeoNames dumps.
pub const MODIFICATION_DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of the GeoNames cities dump.
///
/// Records are immutable once loaded. Every record that leaves this crate has finite
/// coordinates and a unique `geoname_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRecord {
    pub geoname_id: u32,
    /// Display name (UTF-8).
    pub name: String,
    /// ASCII transliteration of `name`, used for name matching.
    pub asciiname: String,
    pub alternatenames: Vec<String>,
    /// Decimal degrees (WGS84).
    pub latitude: f64,
    /// Decimal degrees (WGS84).
    pub longitude: f64,
    pub feature_class: String,
    pub feature_code: String,
    /// ISO-3166 alpha-2 code, empty when GeoNames has none.
    pub country_code: String,
    pub cc2: String,
    pub admin1_code: String,
    pub admin2_code: String,
    pub admin3_code: String,
    pub admin4_code: String,
    pub population: i64,
    pub elevation: Option<i32>,
    pub dem: Option<i32>,
    pub timezone: String,
    pub modification_date: Option<NaiveDate>,
}

fn owned(value: Option<&str>) -> String {
    value.map(str::to_owned).unwrap_or_default()
}

/// Converts the processed city table into records sorted by `geoname_id`.
///
/// Rows without a geonameid or without finite coordinates are dropped and counted in a
/// warning. A geonameid that occurs twice is an error.
#[instrument(name = "Build city records", skip_all, fields(rows = df.height()), level = "info")]
pub fn records_from_df(df: &DataFrame) -> Result<Vec<CityRecord>> {
    let ids = df.column("geonameId")?.u32()?;
    let names = df.column("name")?.str()?;
    let asciinames = df.column("asciiname")?.str()?;
    let alternatenames = df.column("alternatenames")?.str()?;
    let latitudes = df.column("latitude")?.f64()?;
    let longitudes = df.column("longitude")?.f64()?;
    let feature_classes = df.column("feature_class")?.str()?;
    let feature_codes = df.column("feature_code")?.str()?;
    let country_codes = df.column("country_code")?.str()?;
    let cc2s = df.column("cc2")?.str()?;
    let admin1_codes = df.column("admin1_code")?.str()?;
    let admin2_codes = df.column("admin2_code")?.str()?;
    let admin3_codes = df.column("admin3_code")?.str()?;
    let admin4_codes = df.column("admin4_code")?.str()?;
    let populations = df.column("population")?.i64()?;
    let elevations = df.column("elevation")?.i32()?;
    let dems = df.column("dem")?.i32()?;
    let timezones = df.column("timezone")?.str()?;
    let modification_dates = df.column("modification_date")?.str()?;

    let mut records = Vec::with_capacity(df.height());
    let mut missing_id = 0usize;
    let mut missing_coordinates = 0usize;

    for (
        id,
        name,
        asciiname,
        alternates,
        latitude,
        longitude,
        feature_class,
        feature_code,
        country_code,
        cc2,
        admin1_code,
        admin2_code,
        admin3_code,
        admin4_code,
        population,
        elevation,
        dem,
        timezone,
        modification_date,
    ) in izip!(
        ids,
        names,
        asciinames,
        alternatenames,
        latitudes,
        longitudes,
        feature_classes,
        feature_codes,
        country_codes,
        cc2s,
        admin1_codes,
        admin2_codes,
        admin3_codes,
        admin4_codes,
        populations,
        elevations,
        dems,
        timezones,
        modification_dates,
    ) {
        let Some(geoname_id) = id else {
            missing_id += 1;
            continue;
        };
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            missing_coordinates += 1;
            continue;
        };
        if !latitude.is_finite() || !longitude.is_finite() {
            missing_coordinates += 1;
            continue;
        }

        let modification_date = modification_date
            .map(|value| {
                NaiveDate::parse_from_str(value, MODIFICATION_DATE_FORMAT).map_err(|source| {
                    DataError::InvalidDate {
                        geoname_id,
                        value: value.to_owned(),
                        source,
                    }
                })
            })
            .transpose()?;

        records.push(CityRecord {
            geoname_id,
            name: owned(name),
            asciiname: owned(asciiname),
            alternatenames: alternates
                .map(|a| {
                    a.split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            latitude,
            longitude,
            feature_class: owned(feature_class),
            feature_code: owned(feature_code),
            country_code: owned(country_code),
            cc2: owned(cc2),
            admin1_code: owned(admin1_code),
            admin2_code: owned(admin2_code),
            admin3_code: owned(admin3_code),
            admin4_code: owned(admin4_code),
            population: population.unwrap_or(0),
            elevation,
            dem,
            timezone: owned(timezone),
            modification_date,
        });
    }

    if missing_id > 0 {
        warn!(rows = missing_id, "Dropped rows without a geonameid");
    }
    if missing_coordinates > 0 {
        warn!(
            rows = missing_coordinates,
            "Dropped rows with missing or non-finite coordinates"
        );
    }

    records.sort_by_key(|r| r.geoname_id);
    if let Some(pair) = records
        .windows(2)
        .find(|pair| pair[0].geoname_id == pair[1].geoname_id)
    {
        return Err(DataError::DuplicateGeonameId(pair[0].geoname_id));
    }

    info!(records = records.len(), "City records ready");
    Ok(records)
}
