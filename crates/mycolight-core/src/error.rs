//! Error types for the render engine
use thiserror::Error;

/// Render engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Fixture failed construction-time validation
    #[error("Invalid fixture at address {address} ({channels} channels): {reason}")]
    InvalidFixture {
        /// Requested start address
        address: u16,
        /// Requested channel count
        channels: u8,
        /// Why the fixture was rejected
        reason: String,
    },

    /// Fixture channels collide with an already accepted fixture
    #[error("Fixture at address {address} overlaps channel {channel} of another fixture")]
    FixtureOverlap {
        /// Start address of the rejected fixture
        address: u16,
        /// First colliding DMX channel
        channel: u16,
    },

    /// Flash request refused at the registry boundary
    #[error("Flash request rejected: {0}")]
    FlashRejected(String),

    /// Group id that does not exist
    #[error("Unknown group: {0}")]
    UnknownGroup(usize),

    /// Configuration could not be parsed or applied
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
