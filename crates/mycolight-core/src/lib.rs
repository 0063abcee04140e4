//! Mycolight Core - Real-time Lighting Render Engine
//!
//! This crate contains the I/O-free heart of Mycolight:
//! - Typed events and the publish/subscribe bus
//! - HSV/RGB color model
//! - Scenes and the per-fixture smoother
//! - Identification flash overrides and blackout compositing
//! - Engine configuration and status snapshots
//!
//! Wire output and the render loop live in `mycolight-control`.

// Events & Transport
pub mod bus;
pub mod event;

// Color & Fixtures
pub mod color;
pub mod fixture;

// Scenes & Compositing
pub mod engine;
pub mod flash;
pub mod frame;
pub mod manager;
pub mod scene;

// Configuration & Diagnostics
pub mod config;
pub mod error;
pub mod logging;
pub mod status;

// --- Re-exports grouped by category ---

// Events & Transport
pub use bus::{EventBus, Subscription, DEFAULT_CAPACITY};
pub use event::{
    Axis, Button, ControllerInput, Event, EventFilter, EventKind, EventPayload, GroupTarget,
    Selection,
};

// Color & Fixtures
pub use color::{hsv_to_rgb, rgb_to_hsv, Hsv, Rgb};
pub use fixture::{ChannelLayout, Fixture};

// Scenes & Compositing
pub use engine::LightingEngine;
pub use flash::{FlashOverride, FlashRegistry, MAX_FLASH_DURATION};
pub use frame::{Compositor, CoverageMask, FrameBuffer, UNIVERSE_SIZE};
pub use manager::{BuildReport, Group, RejectedFixture, SceneManager};
pub use scene::{Scene, SceneBehavior, SceneContext, SceneKind, SceneParams};

// Configuration & Diagnostics
pub use config::{EngineConfig, FixtureConfig, GroupConfig, OscConfig};
pub use error::{EngineError, Result};
pub use logging::LogConfig;
pub use status::{Diagnostics, FixtureStatus, GroupStatus, StatusSnapshot};
