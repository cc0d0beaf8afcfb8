//! Error types for blocksync.

use thiserror::Error;

/// Errors that can occur during a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Missing required setting '{0}'")]
    MissingSetting(&'static str),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Source calendar error: {0}")]
    Source(String),

    #[error("Destination calendar error: {0}")]
    Destination(String),

    #[error(
        "Identity collision: id {id} derived for both {existing} and {incoming}, refusing to drop an event"
    )]
    IdCollision {
        id: String,
        existing: String,
        incoming: String,
    },

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("{failed} of {attempted} destination changes failed")]
    ItemFailures { failed: usize, attempted: usize },
}

/// Result type alias for blocksync operations.
pub type SyncResult<T> = Result<T, SyncError>;
