//! Mycolight Control - I/O Edge of the Render Engine
//!
//! This crate connects the pure engine in `mycolight-core` to the outside
//! world:
//! - **DMX**: Art-Net `ArtDmx` output
//! - **Output**: frame sinks with a simulation fallback
//! - **OSC**: UDP listener for audio and bio sensor bridges
//! - **Orchestrator**: the fixed-rate render loop and its lifecycle
//!
//! ## Feature Flags
//!
//! - `osc`: Enable OSC input (requires `rosc`), on by default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mycolight_control::{Orchestrator, Transmitter};
//! use mycolight_core::{EngineConfig, EventBus, EventPayload};
//!
//! # async fn run() -> mycolight_control::Result<()> {
//! let config = EngineConfig::default();
//! let bus = EventBus::new(config.bus_capacity);
//! let transmitter = Transmitter::from_destination(config.universe, config.destination.as_deref());
//! let (orchestrator, _report) = Orchestrator::new(&config, bus, transmitter);
//!
//! let handle = orchestrator.spawn();
//! handle.bus().emit(EventPayload::AudioBeat { intensity: 1.0 });
//! handle.stop().await?;
//! # Ok(())
//! # }
//! ```

// Core modules
/// Error types
pub mod error;
/// Frame sinks and the transmitter
pub mod output;

/// DMX output (Art-Net)
pub mod dmx;

#[cfg(feature = "osc")]
/// OSC input listener
pub mod osc;

/// Fixed-rate render loop
pub mod orchestrator;

// Re-exports
pub use error::{ControlError, Result};
pub use orchestrator::{Orchestrator, OrchestratorHandle, RunSummary};
pub use output::{FrameSink, OutputMode, SharedLog, SimulationLog, SimulationSink, Transmitter};

#[cfg(feature = "osc")]
pub use osc::{OscHandle, OscListener};
