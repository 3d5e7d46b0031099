//! taxometr CLI
//!
//! Command-line access to route lookup, route document parsing and
//! geocoding.

#![allow(clippy::print_stdout)]

mod config;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use domain::value_objects::{Coordinate, GeocodeOutcome, GeocodeRequest, MicroPoint};
use integration_route::{
    GeocodeExecutor, HttpRouteClient, MalformedPointPolicy, NominatimGeocoder, RouteClient,
    RouteParser, RouteRequestBuilder,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// taxometr CLI
#[derive(Parser)]
#[command(name = "taxometr-cli")]
#[command(author, version, about = "Route and address lookup for taxometr", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ./taxometr.toml when present)
    #[arg(short, long, env = "TAXOMETR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a driving route between two points
    ///
    /// Example: taxometr-cli route --from 50.45,30.52 --to 50.40,30.61
    Route {
        /// Start point as LAT,LON
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        from: Coordinate,

        /// Destination as LAT,LON
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        to: Coordinate,

        /// Language code for the directions
        #[arg(short, long, default_value = "en")]
        lang: String,

        /// Print the request URL without fetching it
        #[arg(long)]
        url_only: bool,
    },

    /// Parse a KML route document from disk
    Parse {
        /// Path to the KML file
        path: PathBuf,

        /// Stop at the first unreadable point instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Look up the address of a point
    Address {
        /// Point as LAT,LON
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        point: Coordinate,

        /// Give up after this many seconds (configured default when omitted)
        #[arg(short, long)]
        timeout_secs: Option<u64>,
    },

    /// Look up the position of an address
    Locate {
        /// Free-text address
        address: String,
    },
}

/// Parse `LAT,LON` into a validated coordinate
fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {value:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude {lat:?}: {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude {lon:?}: {e}"))?;
    Coordinate::new(lat, lon).map_err(|e| e.to_string())
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn geocode_executor(config: &AppConfig) -> anyhow::Result<GeocodeExecutor> {
    let geocoder = NominatimGeocoder::new(&config.nominatim)
        .map_err(|e| anyhow::anyhow!("Failed to initialize geocoder: {e}"))?;
    Ok(GeocodeExecutor::new(Arc::new(geocoder), &config.geocode))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter_from_verbosity(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path)),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;
    info!(
        route_url = %config.route.base_url,
        geocoder_url = %config.nominatim.base_url,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Route {
            from,
            to,
            lang,
            url_only,
        } => {
            if url_only {
                println!("{}", RouteRequestBuilder::new(&config.route).build_url(from, to, &lang));
                return Ok(());
            }

            let client = HttpRouteClient::new(&config.route)?;
            let route = client.fetch_route(from, to, &lang).await?;
            println!("{}", serde_json::to_string_pretty(&route)?);
        },

        Commands::Parse { path, strict } => {
            let file = File::open(&path).with_context(|| format!("Cannot open {}", path.display()))?;
            let policy = if strict {
                MalformedPointPolicy::Abort
            } else {
                MalformedPointPolicy::Skip
            };
            let route = RouteParser::new(policy).parse(BufReader::new(file));
            println!("{}", serde_json::to_string_pretty(&route)?);
        },

        Commands::Address {
            point,
            timeout_secs,
        } => {
            let executor = geocode_executor(&config)?;
            let timeout = timeout_secs.map_or(executor.default_timeout(), Duration::from_secs);
            let address = executor
                .resolve_with_timeout(GeocodeRequest::ByCoordinate(point), timeout)
                .await
                .and_then(GeocodeOutcome::into_address);

            match address {
                Some(address) => println!("{address}"),
                None => println!("No address found"),
            }
        },

        Commands::Locate { address } => {
            let executor = geocode_executor(&config)?;
            let found = executor
                .resolve_bounded(GeocodeRequest::ByAddressText(address))
                .await
                .and_then(GeocodeOutcome::into_coordinate);

            match found {
                Some(coordinate) => {
                    let point = MicroPoint::from(coordinate);
                    println!(
                        "{}, {} ({}, {})",
                        coordinate.latitude(),
                        coordinate.longitude(),
                        point.lat_e6(),
                        point.lon_e6()
                    );
                },
                None => println!("No position found"),
            }
        },
    }

    Ok(())
}
