pub mod config;
pub mod error;
pub mod types;

pub use config::{PriceList, PricingTiers, SimulationConfig, TierStep};
pub use error::{PlacementRejection, Result, SimError};
pub use types::{CellCoord, EntityId, Tick, Vec2};
