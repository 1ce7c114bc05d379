//! Tile grid, resource nodes, and region analysis

pub mod cell;
pub mod enclosure;
pub mod grid;
pub mod inventory;
pub mod layout;
pub mod occupancy;

pub use cell::{Cell, NodeKind, TileType};
pub use enclosure::{enclosed_region, is_enclosed, is_furnished};
pub use grid::{ClaimError, TileGrid};
pub use inventory::{Inventory, Stock, Taken};
pub use layout::{parse_layout, Layout};
pub use occupancy::{ClaimRank, OccupancyRegistry};
