use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use axum::serve;
use clap::Parser;
use station_walk::api::{AppState, build_router};
use station_walk::common::config::RoutingSettings;
use station_walk::loading::overpass::{DEFAULT_ENDPOINTS, OverpassClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Walking directions around transit stations, using live OpenStreetMap data
#[derive(Parser, Debug)]
#[command(name = "station-walk", version, about)]
struct Args {
    /// Address to serve the API on
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Overpass interpreter URL, may be repeated. Tried in the order given
    #[arg(long = "overpass-url", value_name = "URL")]
    overpass_urls: Vec<String>,

    /// Timeout for each request to an Overpass endpoint
    #[arg(long, default_value_t = 60)]
    fetch_timeout_secs: u64,

    /// Timeout for a whole API request, including every fetch
    #[arg(long, default_value_t = 120)]
    request_timeout_secs: u64,

    /// Cost multiplier for roads in the fallback graph
    #[arg(long, default_value_t = 3.0)]
    road_penalty: f64,

    /// Cost multiplier for pedestrian ways
    #[arg(long, default_value_t = 1.0)]
    pedestrian_weight: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let settings = RoutingSettings::new(args.pedestrian_weight, args.road_penalty)?;

    let endpoints = if args.overpass_urls.is_empty() {
        DEFAULT_ENDPOINTS.iter().map(|url| url.to_string()).collect()
    } else {
        args.overpass_urls
    };
    let client = OverpassClient::new(endpoints, Duration::from_secs(args.fetch_timeout_secs))?;

    info!(
        endpoints = ?client.endpoints(),
        road_penalty = settings.road_weight,
        "Using Overpass endpoints"
    );

    let state = AppState::new(client, settings);
    let router = build_router(state, Duration::from_secs(args.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("Listening on {}", args.bind);

    serve(listener, router).await?;

    Ok(())
}
