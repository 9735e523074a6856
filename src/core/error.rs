use thiserror::Error;

use crate::core::types::EntityId;
use crate::phase::GamePhase;

#[derive(Error, Debug)]
pub enum SiegeError {
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    #[error("Villager {0:?} has no resource ledger slice")]
    MissingLedgerSlice(EntityId),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SiegeError>;
