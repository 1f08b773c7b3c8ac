use std::net::SocketAddr;
use std::path::PathBuf;

use cityfinder::DataSource;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// CLI arguments for cityfinder
#[derive(Debug, Parser)]
#[command(
    name = "cityfinder",
    version,
    about = "Nearest-city and city-name lookups over the GeoNames cities dataset"
)]
pub struct CliArgs {
    /// Path to a GeoNames cities*.txt dump (default: resolved from --data-source under DATA_DIR)
    #[arg(long, env = "CITYFINDER_DATA_FILE", global = true)]
    pub data_file: Option<PathBuf>,

    /// Which GeoNames dump to load when no --data-file is given
    #[arg(long, default_value_t = DataSource::default(), global = true)]
    pub data_source: DataSource,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value_t = LevelFilter::INFO, global = true)]
    pub log_level: LevelFilter,

    /// Only load cities with at least this population
    #[arg(long, global = true)]
    pub min_population: Option<i64>,

    /// Comma-separated ISO2 country codes to load (e.g. US,CA,MX)
    #[arg(long, value_delimiter = ',', global = true)]
    pub countries: Vec<String>,

    /// Result limit for name queries without a positive top_k
    #[arg(long, default_value_t = cityfinder::DEFAULT_MATCH_LIMIT, global = true)]
    pub default_limit: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "CITYFINDER_BIND", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Per-request time limit in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },

    /// List the cities closest to a city
    Proximity {
        /// geonameid of the origin city
        city_id: i64,

        /// Number of cities to return (the origin counts)
        #[arg(short = 'k', long, default_value_t = 10, allow_negative_numbers = true)]
        top_k: i64,

        /// Only consider cities in this country (ISO2)
        #[arg(short = 'c', long)]
        country: Option<String>,
    },

    /// List cities whose ASCII name matches the given words, alphabetically
    Lexicographic {
        /// Words to match in order, e.g. "san jose"
        query: String,

        #[arg(short = 'k', long, allow_negative_numbers = true)]
        top_k: Option<i64>,

        /// Only consider cities in this country (ISO2)
        #[arg(short = 'c', long)]
        country: Option<String>,
    },

    /// Show a summary of the loaded city table
    Stats,
}
