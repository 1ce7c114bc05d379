//! Entity-component store, components and the world that owns them

pub mod components;
pub mod store;
pub mod world;

pub use components::{
    Demand, Home, HouseholdAccount, HouseholdProxy, Money, Position, Supply, Unassigned, Velocity,
    Waiting,
};
pub use store::{Component, ComponentKind, ComponentMap, EntityStore};
pub use world::World;
