//! Tile cells and the types they can take

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;
use crate::goods::{Crop, Good, Item};
use crate::tiles::inventory::Inventory;

/// Terrain, furniture or resource node occupying a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Empty ground
    Grass,
    Water,
    Wall,
    Door,
    Floor,
    /// Queue slot a consumer reserves for good
    Carpet,
    Bed,
    DiningTable,
    FishingRod,
    CropPlot(Crop),
    Fryer,
    StockTable(Item),
    /// Sale node, owned by the household
    Register(Item),
    Cart,
    Workbench,
}

impl TileType {
    /// Claimable node kind, if any
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            TileType::FishingRod => Some(NodeKind::FishingRod),
            TileType::CropPlot(_) => Some(NodeKind::CropPlot),
            TileType::Fryer => Some(NodeKind::Fryer),
            TileType::StockTable(_) => Some(NodeKind::StockTable),
            TileType::Cart => Some(NodeKind::Cart),
            TileType::Workbench => Some(NodeKind::Workbench),
            _ => None,
        }
    }

    /// Walls and doors bound an enclosed region
    pub fn is_barrier(&self) -> bool {
        matches!(self, TileType::Wall | TileType::Door)
    }

    /// Ground something else can be placed on
    pub fn is_buildable_ground(&self) -> bool {
        matches!(self, TileType::Grass | TileType::Floor)
    }

    /// Placed as a blueprint and finished by a builder
    pub fn requires_construction(&self) -> bool {
        self.node_kind().is_some() || matches!(self, TileType::Register(_))
    }

    /// Goes only on floor (indoors)
    pub fn requires_floor(&self) -> bool {
        matches!(self, TileType::Carpet | TileType::Bed | TileType::DiningTable)
    }

    pub fn sells(&self) -> Option<Item> {
        match self {
            TileType::Register(item) => Some(*item),
            _ => None,
        }
    }

    /// Item a stock table holds
    pub fn stocks(&self) -> Option<Item> {
        match self {
            TileType::StockTable(item) => Some(*item),
            _ => None,
        }
    }

    /// Item that accumulates on a production node
    pub fn produces(&self) -> Option<Item> {
        match self {
            TileType::FishingRod => Some(Item::Fish),
            TileType::CropPlot(crop) => Some(crop.item()),
            _ => None,
        }
    }
}

/// Claimable node categories; occupancy and pricing are tracked per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    FishingRod,
    CropPlot,
    Fryer,
    StockTable,
    Cart,
    Workbench,
}

impl NodeKind {
    /// Good supplied by whoever claims this kind of node
    pub fn supplied_good(&self) -> Good {
        match self {
            NodeKind::FishingRod => Good::Fish,
            NodeKind::CropPlot => Good::Produce,
            NodeKind::Fryer => Good::Meal,
            NodeKind::StockTable => Good::Restock,
            NodeKind::Cart => Good::Delivery,
            NodeKind::Workbench => Good::Construction,
        }
    }
}

/// One grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub tile: TileType,
    pub inventory: Inventory,
    /// Producer bound to this node; `None` means unclaimed
    pub claimed: Option<EntityId>,
    /// Consumer holding this cell as its queue slot
    pub locked_demand: Option<EntityId>,
    /// Blueprint not yet built
    pub transparent: bool,
}

impl Cell {
    pub fn new(tile: TileType) -> Self {
        Self {
            tile,
            inventory: Inventory::new(),
            claimed: None,
            locked_demand: None,
            transparent: false,
        }
    }

    pub fn blueprint(tile: TileType) -> Self {
        Self {
            transparent: true,
            ..Self::new(tile)
        }
    }

    /// Built and usable
    pub fn is_operational(&self) -> bool {
        !self.transparent
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(TileType::Grass)
    }
}
