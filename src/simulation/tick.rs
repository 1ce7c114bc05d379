//! Tick system - orchestrates simulation updates
//!
//! One tick runs, in order:
//! waiting gate -> fallback -> producers -> consumers -> construction ->
//! movement -> spoilage -> tick counter.
//!
//! Everything is serial; within a phase entities are visited in ascending
//! id order, so the first writer wins any contested claim.

use ahash::AHashSet;
use serde::Serialize;

use crate::construction::run_construction;
use crate::core::types::{CellCoord, EntityId, Tick};
use crate::ecs::components::{Velocity, Waiting};
use crate::ecs::store::ComponentKind;
use crate::ecs::World;
use crate::goods::Item;
use crate::roles::consumer::run_consumers;
use crate::roles::fallback::run_fallback;
use crate::roles::{run_producers, RoleRegistry};
use crate::simulation::movement::integrate_movement;
use crate::simulation::spoilage::spoil_registers;
use crate::tiles::{NodeKind, TileType};

/// Events generated during a simulation tick
///
/// Returned by `run_simulation_tick` for logs, UIs and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// A villager claimed a node and took its role
    NodeClaimed {
        entity: EntityId,
        coord: CellCoord,
        kind: NodeKind,
        price: i64,
    },
    /// An occupant moved up a rank after someone vacated
    Repriced { entity: EntityId, price: i64 },
    /// A producer dropped goods at a node; `paid` is what it earned for it
    Delivered {
        entity: EntityId,
        item: Item,
        units: i32,
        paid: i64,
    },
    Purchased {
        entity: EntityId,
        register: CellCoord,
        item: Item,
        price: i64,
        spoiled: bool,
    },
    Consumed {
        entity: EntityId,
        item: Item,
        spoiled: bool,
    },
    Restocked {
        entity: EntityId,
        table: CellCoord,
        item: Item,
        units: i32,
        paid: i64,
    },
    Spoiled { register: CellCoord, item: Item },
    /// Something said out loud (wage complaints)
    Speech { entity: Option<EntityId>, text: String },
    BlueprintPlaced { site: CellCoord, tile: TileType },
    ConstructionStarted { entity: EntityId, site: CellCoord },
    ConstructionCompleted {
        entity: EntityId,
        site: CellCoord,
        paid: i64,
    },
    LaborerHired { entity: EntityId, wage: i64 },
    WorkerReleased { entity: EntityId, laborer: bool },
    /// An occupant lost its node to demolition
    RoleStripped { entity: EntityId, coord: CellCoord },
    /// An enclosed room now holds a bed and a dining table
    HouseUpgraded { coord: CellCoord },
}

/// Decrement every running countdown; returns the entities suspended this
/// tick. A countdown that has reached zero is removed and the entity acts.
pub fn waiting_gate(world: &mut World) -> AHashSet<EntityId> {
    let mut suspended = AHashSet::new();
    for id in world.store.query(&[ComponentKind::Waiting]) {
        let Some(waiting) = world.store.get_mut::<Waiting>(id) else {
            continue;
        };
        if waiting.until > 0 {
            waiting.until -= 1;
            suspended.insert(id);
        } else {
            world.store.detach::<Waiting>(id);
        }
    }
    suspended
}

fn zero_velocities(world: &mut World, suspended: &AHashSet<EntityId>) {
    for id in world.store.query(&[ComponentKind::Velocity]) {
        if suspended.contains(&id) {
            continue;
        }
        if let Some(velocity) = world.store.get_mut::<Velocity>(id) {
            *velocity = Velocity::default();
        }
    }
}

/// Run a single simulation tick
pub fn run_simulation_tick(world: &mut World, roles: &RoleRegistry) -> Vec<SimulationEvent> {
    let suspended = waiting_gate(world);
    zero_velocities(world, &suspended);

    run_fallback(world, &suspended);
    run_producers(world, roles, &suspended);
    run_consumers(world, &suspended);
    run_construction(world);

    integrate_movement(world);
    spoil_registers(world);

    tracing::trace!(tick = world.current_tick, "tick complete");
    world.tick();
    world.drain_events()
}

/// Run `ticks` ticks, collecting every event
pub fn run_ticks(world: &mut World, roles: &RoleRegistry, ticks: Tick) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(run_simulation_tick(world, roles));
    }
    events
}
