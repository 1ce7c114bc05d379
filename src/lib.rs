//! Village Economy - tile-claim economic simulation

pub mod construction;
pub mod core;
pub mod ecs;
pub mod goods;
pub mod ledger;
pub mod placement;
pub mod roles;
pub mod simulation;
pub mod tiles;
pub mod view;
