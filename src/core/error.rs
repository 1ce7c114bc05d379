use thiserror::Error;

use crate::core::types::{CellCoord, EntityId};
use crate::ledger::LedgerError;
use crate::tiles::TileType;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Invalid placement at {coord}: {reason}")]
    InvalidPlacement {
        coord: CellCoord,
        reason: PlacementRejection,
    },

    #[error("No eligible worker for blueprint at {coord}")]
    NoEligibleWorker { coord: CellCoord },

    #[error("No resource available: {0}")]
    NoResourceAvailable(String),

    #[error("Ledger inconsistency: {0}")]
    LedgerInconsistency(#[from] LedgerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Why the placement layer's request was turned down
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementRejection {
    #[error("cell is outside the grid")]
    OutOfBounds,

    #[error("cell already holds {0:?}")]
    Occupied(TileType),

    #[error("{0:?} can only go on floor")]
    RequiresFloor(TileType),

    #[error("{0:?} cannot be placed")]
    NotPlaceable(TileType),

    #[error("nothing to remove")]
    NothingToRemove,
}

pub type Result<T> = std::result::Result<T, SimError>;
