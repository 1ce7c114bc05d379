//! Role behavior engine
//!
//! Producers are dispatched through a registry keyed by the good they supply:
//! one handler per good, registered once. Consumers run through a single
//! handler with a per-item priority gate. Unassigned villagers go through the
//! fallback logic until they claim a node.

pub mod builder;
pub mod chef;
pub mod consumer;
pub mod courier;
pub mod fallback;
pub mod farmer;
pub mod fisher;
pub mod movement;
pub mod restocker;
pub mod state;

use ahash::{AHashMap, AHashSet};

use crate::construction::ConstructionTask;
use crate::core::error::{Result, SimError};
use crate::core::types::{CellCoord, EntityId};
use crate::ecs::components::Supply;
use crate::ecs::store::ComponentKind;
use crate::ecs::World;
use crate::goods::{Good, Item};
use crate::simulation::SimulationEvent;
use crate::tiles::TileType;

pub use state::{ChefState, CourierState, DemandState, FarmerState, FisherState, RestockState, RoleState};

/// One producer role's per-tick update
///
/// Handlers receive a working copy of the entity's `Supply`; it is written
/// back after the call.
pub trait ProducerRole {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply);
}

/// Producer handlers keyed by supplied good
pub struct RoleRegistry {
    producers: AHashMap<Good, Box<dyn ProducerRole>>,
}

impl RoleRegistry {
    /// Registry with no handlers
    pub fn new() -> Self {
        Self {
            producers: AHashMap::new(),
        }
    }

    /// Every built-in role
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Good::Fish, fisher::Fisher);
        registry.register(Good::Produce, farmer::Farmer);
        registry.register(Good::Meal, chef::Chef);
        registry.register(Good::Restock, restocker::Restocker);
        registry.register(Good::Delivery, courier::Courier);
        registry.register(Good::Construction, builder::Builder);
        registry
    }

    pub fn register(&mut self, good: Good, role: impl ProducerRole + 'static) {
        self.producers.insert(good, Box::new(role));
    }

    pub fn producer(&self, good: Good) -> Option<&dyn ProducerRole> {
        self.producers.get(&good).map(|role| role.as_ref())
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run every producer not suspended and not busy on a construction task
pub fn run_producers(world: &mut World, registry: &RoleRegistry, suspended: &AHashSet<EntityId>) {
    for id in world.store.query(&[ComponentKind::Supply, ComponentKind::Position]) {
        if suspended.contains(&id) || world.store.contains::<ConstructionTask>(id) {
            continue;
        }
        let Some(mut supply) = world.store.get::<Supply>(id).cloned() else {
            continue;
        };
        let Some(role) = registry.producer(supply.good) else {
            tracing::trace!(entity = %id, good = %supply.good, "no handler registered");
            continue;
        };

        role.update(world, id, &mut supply);

        // Placement may have stripped the role mid-update
        if let Some(slot) = world.store.get_mut::<Supply>(id) {
            *slot = supply;
        }
    }
}

/// Nearest water cell to an agent
pub(crate) fn nearest_water(world: &World, entity: EntityId) -> Result<CellCoord> {
    let pos = world.position(entity).ok_or(SimError::EntityNotFound(entity))?;
    world
        .grid
        .find_nearest_of_type(pos, TileType::Water)
        .ok_or_else(|| SimError::NoResourceAvailable("water".into()))
}

/// Pay a producer for `units` delivered units of `item`
///
/// The payer is the seller behind the register that will take the goods
/// (the emptiest one), or the household when there is no such register.
pub(crate) fn settle_delivery(world: &mut World, producer: EntityId, item: Item, wage: i64, units: i32) {
    if units <= 0 {
        return;
    }
    let register = world
        .grid
        .find_with_minimum_stock(|cell| cell.tile.sells() == Some(item), item);
    let payer = register
        .and_then(|coord| world.seller_of(coord))
        .or_else(|| world.household());

    let amount = wage * i64::from(units);
    let paid = match payer {
        Some(payer) => world.pay(payer, producer, amount),
        None => false,
    };
    world.emit(SimulationEvent::Delivered {
        entity: producer,
        item,
        units,
        paid: if paid { amount } else { 0 },
    });
}
