//! Mycolight - Real-time lighting engine
//!
//! Loads the rig configuration, starts the render loop and the OSC listener,
//! and runs until Ctrl+C.
//!
//! Usage: `mycolight [CONFIG]` where `CONFIG` is a `.toml` or `.json` file
//! (default `mycolight.toml`; a missing file runs the built-in rig).

#![warn(missing_docs)]

mod logging_setup;

use anyhow::{Context, Result};
use mycolight_control::{OscListener, Orchestrator, Transmitter};
use mycolight_core::{EngineConfig, EventBus};
use std::path::PathBuf;
use tracing::{error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "mycolight.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    // Logging comes from the config, so nothing is logged until it is loaded
    let found = config_path.exists();
    let config = if found {
        EngineConfig::load(&config_path)
            .with_context(|| format!("Failed to load configuration {:?}", config_path))?
            .sanitized()
    } else {
        EngineConfig::default()
    };

    let _log_guard = logging_setup::init(&config.logging)?;

    info!("==========================================");
    info!("===     Mycolight Session Started      ===");
    info!("==========================================");
    if found {
        info!("Configuration: {:?}", config_path);
    } else {
        warn!("{:?} not found, running the built-in rig", config_path);
    }

    let bus = EventBus::new(config.bus_capacity);
    let transmitter = Transmitter::from_destination(config.universe, config.destination.as_deref());
    info!("Output: {} ({:?})", transmitter.sink_name(), transmitter.mode());

    let (orchestrator, report) = Orchestrator::new(&config, bus.clone(), transmitter);
    if !report.is_clean() {
        // each rejection was already logged while building the rig
        warn!("Started with {} fixture(s) skipped", report.rejected.len());
    }
    let handle = orchestrator.spawn();

    let osc = if config.osc.enabled {
        let addr = format!("{}:{}", config.osc.bind_address, config.osc.port);
        match OscListener::bind(&addr, bus.clone()).await {
            Ok(listener) => Some(listener.spawn()),
            Err(e) => {
                // Lights keep running on scenes alone
                error!("OSC listener on {} unavailable: {}", addr, e);
                None
            }
        }
    } else {
        info!("OSC input disabled");
        None
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for Ctrl+C: {}", e);
    }
    info!("Shutting down");

    if let Some(osc) = osc {
        osc.stop().await;
    }
    let summary = handle.stop().await?;
    info!(
        "Rendered {} frames, final sequence {}",
        summary.frames, summary.final_sequence
    );

    Ok(())
}
