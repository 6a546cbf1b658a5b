//! Entry point for the Waypoint map controller.
//!
//! Connects to the NATS relay of a running map client and drives its
//! room-navigation behaviour: exit zones found in the map show a popup and a
//! confirmation prompt, and confirming the prompt moves the visitor to the
//! destination room.
//!
//! # Architecture
//!
//! ```text
//! map client --> NATS (zone/prompt events) --> ZoneRouter --> NATS (UI, room change)
//! ```
//!
//! All notifications funnel into one channel consumed by a single router
//! task, so controller state is never shared between tasks.

mod error;
mod nats_host;

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use waypoint_core::WaypointConfig;
use waypoint_core::config::{LogFormat, LoggingConfig};

use crate::error::BridgeError;
use crate::nats_host::{NatsHost, Subjects};

/// Application entry point.
///
/// Loads configuration, initializes logging, connects to NATS, then runs
/// the map script until the process is interrupted.
///
/// # Errors
///
/// Returns an error if configuration, the NATS connection, or the host
/// readiness handshake fails.
#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    let config = load_config()?;
    init_logging(&config.logging);

    info!(
        nats_url = config.infrastructure.nats_url,
        subject_prefix = config.bridge.subject_prefix,
        request_timeout_ms = config.bridge.request_timeout_ms,
        navigation_layer = config.navigation.layer_name,
        banner = config.presentation.banner.enabled,
        clock = config.clock.enabled,
        "waypoint-bridge starting"
    );

    let url = &config.infrastructure.nats_url;
    let client = async_nats::connect(url.as_str())
        .await
        .map_err(|e| BridgeError::Nats(format!("failed to connect to {url}: {e}")))?;
    info!("NATS connection established");

    let (tx, rx) = mpsc::channel(config.bridge.event_buffer.max(1));
    let host = NatsHost::new(
        client,
        Subjects::new(config.bridge.subject_prefix.clone()),
        Duration::from_millis(config.bridge.request_timeout_ms),
        tx,
    );
    let confirmations = host.forward_prompt_confirmations().await?;

    tokio::select! {
        result = waypoint_core::run_script(host, &config, rx) => result?,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        }
    }

    confirmations.abort();
    info!("waypoint-bridge stopped");
    Ok(())
}

/// Load `waypoint.yaml`, or the file named by `WAYPOINT_CONFIG`.
///
/// A missing file yields the defaults.
fn load_config() -> Result<WaypointConfig, BridgeError> {
    let path = std::env::var_os("WAYPOINT_CONFIG")
        .map_or_else(|| PathBuf::from("waypoint.yaml"), PathBuf::from);
    if path.exists() {
        Ok(WaypointConfig::from_file(&path)?)
    } else {
        let mut config = WaypointConfig::default();
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
