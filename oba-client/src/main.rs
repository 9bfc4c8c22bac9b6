use std::process::ExitCode;

use oba_client::clock::{Clock, SystemClock};
use oba_client::domain::{ServiceArea, StopId};
use oba_client::oba::{DEFAULT_API_KEY, MockTransport, ObaConfig, TransitClient, Transport};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Radius used for `OBA_NEAR` lookups, in meters.
const NEAR_RADIUS_M: u32 = 500;

/// Parse a "lat,lon" pair.
fn parse_location(s: &str) -> Option<(f64, f64)> {
    let (lat, lon) = s.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Build the client configuration from the environment.
fn config_from_env() -> Result<ObaConfig, String> {
    let api_key = std::env::var("OBA_API_KEY").unwrap_or_else(|_| {
        warn!("OBA_API_KEY not set, using the public test key");
        DEFAULT_API_KEY.to_string()
    });

    let mut config = ObaConfig::new(api_key);

    if let Ok(base_url) = std::env::var("OBA_BASE_URL") {
        config = config.with_base_url(base_url);
    }

    if let Ok(ids) = std::env::var("OBA_STOP_IDS") {
        let stop_ids = ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(StopId::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("OBA_STOP_IDS: {e}"))?;
        config = config.with_stop_ids(stop_ids);
    }

    Ok(config)
}

async fn run<T: Transport>(client: TransitClient<T>, stop_arg: Option<StopId>) -> ExitCode {
    println!("Fetching bus stations...");
    let batch = client.fetch_stations().await;

    if let Some(message) = batch.failure_message() {
        eprintln!("{message}");
        return ExitCode::FAILURE;
    }

    println!();
    println!("--- Bus stations ---");
    for (idx, station) in batch.stations.iter().enumerate() {
        println!("{}. {}", idx + 1, station.name());
        println!("   ID: {}", station.id());
        println!("   Code: {}", station.code().unwrap_or("N/A"));
        println!("   Location: {}, {}", station.lat(), station.lon());
        println!("   Direction: {}", station.direction().unwrap_or("N/A"));
    }
    for skipped in &batch.skipped {
        println!("   (skipped {}: {})", skipped.stop_id, skipped.reason);
    }
    println!("Total stations found: {}", batch.stations.len());

    if let Ok(near) = std::env::var("OBA_NEAR") {
        let Some((lat, lon)) = parse_location(&near) else {
            eprintln!("OBA_NEAR must be \"lat,lon\", got {near:?}");
            return ExitCode::FAILURE;
        };
        // Fall back to downtown when outside the service area
        let (lat, lon) = ServiceArea::default().clamp_location(lat, lon);

        println!();
        println!("--- Stops within {NEAR_RADIUS_M} m of {lat}, {lon} ---");
        match client.fetch_stations_near(lat, lon, NEAR_RADIUS_M).await {
            Ok(stations) => {
                for station in &stations {
                    println!("{station}");
                }
            }
            Err(e) => eprintln!("{}", e.user_message("nearby stops")),
        }
    }

    let Some(stop_id) = stop_arg.or_else(|| batch.stations.first().map(|s| s.id().clone())) else {
        println!("No station to show arrivals for.");
        return ExitCode::SUCCESS;
    };

    println!();
    println!("--- Arrivals at {stop_id} ---");
    match client.fetch_arrivals(&stop_id).await {
        Ok(arrivals) if arrivals.is_empty() => println!("No upcoming arrivals."),
        Ok(arrivals) => {
            let now = client.clock().now();
            for arrival in &arrivals {
                println!("{}", arrival.display_at(now));
            }

            if let Some(next) = arrivals.first() {
                println!();
                println!("Next: {} ({:?})", next.arriving_text(now), next.urgency(now));
                if let Some(time) = next.time_label(&chrono::Local) {
                    println!("   {time}");
                }
                if let Some(distance) = next.distance_text() {
                    println!("   {distance}");
                }
            }
        }
        Err(e) => {
            eprintln!("{}", e.user_message("arrivals"));
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match config_from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let stop_arg = match std::env::args().nth(1).map(|s| StopId::parse(&s)).transpose() {
        Ok(stop) => stop,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Serve canned responses instead of hitting the network
    if let Ok(dir) = std::env::var("OBA_MOCK_DIR") {
        info!(dir = %dir, "using mock OneBusAway data");
        let transport = match MockTransport::from_dir(&dir) {
            Ok(transport) => transport,
            Err(e) => {
                error!("failed to load mock data: {e}");
                return ExitCode::FAILURE;
            }
        };
        let client = TransitClient::with_transport(config, transport, SystemClock);
        return run(client, stop_arg).await;
    }

    let client = match TransitClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!("failed to create client: {e}");
            return ExitCode::FAILURE;
        }
    };

    run(client, stop_arg).await
}
