//! cityfinder - command-line interface and HTTP server
//!
//! Usage examples
//! --------------
//!
//! - Serve the HTTP API on the default address (127.0.0.1:5000)
//!   $ cityfinder --data-file cities1000.txt serve
//!
//! - The 5 cities closest to San Jose, California
//!   $ cityfinder proximity 5392171 -k 5
//!
//! - US cities matching "san jose", alphabetically
//!   $ cityfinder lexicographic "san jose" -c US
//!
//! - Summary of the loaded table
//!   $ cityfinder --countries US,CA stats
//!
//! Without `--data-file`, the dump named by `--data-source` is looked up under
//! `DATA_DIR` and downloaded from GeoNames when missing.
mod args;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cityfinder::{CityHit, CityService, ServiceConfig, init_logging, server};
use tracing::info;

use crate::args::{CliArgs, Commands};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_level)?;

    let config = build_config(&args)?;

    // Loading is synchronous and finishes before anything is served.
    let service = CityService::from_config(&config).context("failed to load city data")?;
    info!(stats = ?service.stats(), "City data ready");

    match args.command {
        Commands::Serve { .. } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::serve(&config, Arc::new(service)))?;
        }

        Commands::Proximity {
            city_id,
            top_k,
            country,
        } => {
            let hits = service.proximity_query(city_id, top_k, country.as_deref())?;
            print_hits(&hits);
        }

        Commands::Lexicographic {
            query,
            top_k,
            country,
        } => {
            let hits = service.lexicographic_query(&query, top_k, country.as_deref())?;
            if hits.is_empty() {
                println!("No cities found matching: {query}");
            }
            print_hits(&hits);
        }

        Commands::Stats => {
            let stats = service.stats();
            println!("City table statistics:");
            println!("  Cities: {}", stats.cities);
            println!("  Countries: {}", stats.countries);
        }
    }

    Ok(())
}

fn build_config(args: &CliArgs) -> anyhow::Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .data_source(args.data_source)
        .countries(args.countries.iter().map(|c| c.trim()).filter(|c| !c.is_empty()))
        .default_match_limit(args.default_limit)?;

    if let Some(path) = &args.data_file {
        builder = builder.data_file(path);
    }
    if let Some(min_population) = args.min_population {
        builder = builder.min_population(min_population);
    }
    if let Commands::Serve { bind, timeout_secs } = &args.command {
        builder = builder
            .bind_addr(*bind)
            .request_timeout(Duration::from_secs(*timeout_secs))?;
    }

    Ok(builder.build())
}

fn print_hits(hits: &[CityHit]) {
    for hit in hits {
        println!("{}\t{}", hit.geoname_id(), hit.name());
    }
}
