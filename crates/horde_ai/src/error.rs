//! Error types for the AI runtime

use crate::species::SpeciesId;
use crate::spawner::AgentHandle;
use horde_core::HandleError;
use thiserror::Error;

/// AI runtime errors
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Pool for species '{species}' is exhausted (capacity {capacity})")]
    PoolExhausted { species: SpeciesId, capacity: usize },

    #[error("Agent handle {handle} does not resolve: {reason}")]
    StaleHandle {
        handle: AgentHandle,
        reason: HandleError,
    },

    #[error("Invalid profile for species '{species}': {reason}")]
    InvalidProfile { species: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
