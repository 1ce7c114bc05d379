//! Role state machine states

use serde::{Deserialize, Serialize};

use crate::core::types::CellCoord;
use crate::goods::{Crop, Item};
use crate::tiles::TileType;

/// Producer state, tagged by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleState {
    Fisher(FisherState),
    /// Crop is fixed at claim time from the plot subtype
    Farmer { crop: Crop, state: FarmerState },
    Chef(ChefState),
    Restocker { item: Item, state: RestockState },
    Courier(CourierState),
    Builder,
}

impl RoleState {
    /// Starting state for whoever claims a node of this tile type
    pub fn initial(tile: TileType) -> Option<Self> {
        let state = match tile {
            TileType::FishingRod => RoleState::Fisher(FisherState::ToWater),
            TileType::CropPlot(crop) => RoleState::Farmer {
                crop,
                state: FarmerState::ToPlot,
            },
            TileType::Fryer => RoleState::Chef(ChefState::Gather),
            TileType::StockTable(item) => RoleState::Restocker {
                item,
                state: RestockState::Check,
            },
            TileType::Cart => RoleState::Courier(CourierState::Idle),
            TileType::Workbench => RoleState::Builder,
            _ => return None,
        };
        Some(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FisherState {
    ToWater,
    /// Catch lands once the wait ends
    Fishing,
    ToRod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmerState {
    ToPlot,
    ToWater,
    Irrigating,
    Returning,
    Growing,
    Delivering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChefState {
    /// Pick the next missing ingredient
    Gather,
    Fetch { item: Item, table: CellCoord },
    ToFryer,
    Cooking,
    /// Holding a meal, looking for a register
    Deliver,
    ToRegister { register: CellCoord },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestockState {
    Check,
    ToRegister { register: CellCoord },
    ToTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourierState {
    Idle,
    ToPickup { from: CellCoord },
    ToDropoff { from: CellCoord, to: CellCoord, item: Item },
}

/// Consumer purchase cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandState {
    /// No queue slot yet
    Unbound,
    SeekRegister,
    ToQueue,
    ToRegister,
    ToHome,
}
