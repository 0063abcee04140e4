//! Engine configuration
//!
//! One [`EngineConfig`] describes the rig (groups and their fixtures), the
//! loop timing, the output destination, scene tuning and the input and
//! logging blocks. Files are JSON or TOML, picked by extension. Every field
//! has a default, so partial files are fine.

use crate::bus::DEFAULT_CAPACITY;
use crate::error::{EngineError, Result};
use crate::logging::LogConfig;
use crate::scene::{SceneKind, SceneParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Refuse config files larger than this
const MAX_CONFIG_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Default Art-Net destination: limited broadcast on the Art-Net port
pub const DEFAULT_DESTINATION: &str = "255.255.255.255:6454";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default)]
    pub name: String,
    /// First DMX channel, 1-based
    pub address: u16,
    /// 3 for RGB, 4 for RGBW
    #[serde(default = "default_channels")]
    pub channels: u8,
}

fn default_channels() -> u8 {
    3
}

impl FixtureConfig {
    pub fn rgb(name: impl Into<String>, address: u16) -> Self {
        Self {
            name: name.into(),
            address,
            channels: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub fixtures: Vec<FixtureConfig>,
    /// Scene the group starts in
    #[serde(default = "default_scene")]
    pub scene: SceneKind,
}

fn default_scene() -> SceneKind {
    SceneKind::IDLE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render loop frequency
    pub tick_hz: f32,
    /// Seconds without activity before groups fall back to the idle scene
    pub idle_timeout_secs: f32,
    /// Seconds between idle checks
    pub idle_check_secs: f32,
    /// Global smoothing rate, per second
    pub smoothing_rate: f32,
    /// Art-Net universe (15-bit port address)
    pub universe: u16,
    /// `host:port` to send frames to; `None` runs in simulation
    pub destination: Option<String>,
    /// Per-subscriber event queue depth
    pub bus_capacity: usize,
    pub groups: Vec<GroupConfig>,
    pub scenes: SceneParams,
    pub osc: OscConfig,
    pub logging: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_hz: 40.0,
            idle_timeout_secs: 30.0,
            idle_check_secs: 1.0,
            smoothing_rate: 3.0,
            universe: 0,
            destination: Some(DEFAULT_DESTINATION.to_string()),
            bus_capacity: DEFAULT_CAPACITY,
            groups: default_groups(),
            scenes: SceneParams::default(),
            osc: OscConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Four mushrooms, three RGB fixtures each, packed from channel 1
fn default_groups() -> Vec<GroupConfig> {
    (0..4u16)
        .map(|g| GroupConfig {
            name: format!("Mushroom {}", g + 1),
            fixtures: (0..3u16)
                .map(|f| FixtureConfig::rgb(format!("M{}-{}", g + 1, f + 1), 1 + (g * 3 + f) * 3))
                .collect(),
            scene: SceneKind::IDLE,
        })
        .collect()
}

impl EngineConfig {
    pub const MAX_TICK_HZ: f32 = 1000.0;
    /// Upper bound for the idle timeout and the idle check period (one day)
    pub const MAX_IDLE_SECS: f32 = 86_400.0;
    pub const MAX_UNIVERSE: u16 = 0x7fff;

    /// Load from a `.json` or `.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(EngineError::Config(format!(
                "config file is {} bytes, limit is {}",
                size, MAX_CONFIG_FILE_SIZE
            )));
        }

        let content = fs::read_to_string(path)?;
        let config: EngineConfig = match extension(path) {
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            other => {
                return Err(EngineError::Config(format!(
                    "unsupported config format: {}",
                    other
                )))
            }
        };
        Ok(config)
    }

    /// Load `path`, or return defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write as `.json` or `.toml`, by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match extension(path) {
            "json" => serde_json::to_string_pretty(self)?,
            "toml" => toml::to_string_pretty(self)?,
            other => {
                return Err(EngineError::Config(format!(
                    "unsupported config format: {}",
                    other
                )))
            }
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Copy with every numeric field clamped to a usable range
    pub fn sanitized(&self) -> Self {
        let positive = |x: f32, min: f32, fallback: f32| {
            if x.is_finite() {
                x.max(min)
            } else {
                fallback
            }
        };
        let defaults = Self::default();
        Self {
            tick_hz: positive(self.tick_hz, 1.0, defaults.tick_hz).min(Self::MAX_TICK_HZ),
            idle_timeout_secs: positive(self.idle_timeout_secs, 0.1, defaults.idle_timeout_secs)
                .min(Self::MAX_IDLE_SECS),
            idle_check_secs: positive(self.idle_check_secs, 0.01, defaults.idle_check_secs)
                .min(Self::MAX_IDLE_SECS),
            smoothing_rate: positive(self.smoothing_rate, 0.01, defaults.smoothing_rate),
            universe: self.universe.min(Self::MAX_UNIVERSE),
            destination: self
                .destination
                .as_ref()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            bus_capacity: self.bus_capacity.max(1),
            groups: self.groups.clone(),
            scenes: self.scenes.sanitized(),
            osc: self.osc.clone(),
            logging: self.logging.clone(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        let hz = if self.tick_hz.is_finite() {
            self.tick_hz.clamp(1.0, Self::MAX_TICK_HZ)
        } else {
            Self::default().tick_hz
        };
        Duration::from_secs_f32(1.0 / hz)
    }

    pub fn idle_timeout(&self) -> Duration {
        seconds(self.idle_timeout_secs)
    }

    pub fn idle_check_interval(&self) -> Duration {
        seconds(self.idle_check_secs)
    }
}

fn seconds(secs: f32) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f32(secs.min(EngineConfig::MAX_IDLE_SECS))
    } else {
        Duration::ZERO
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
