//! Placement layer entry points: place and remove nodes
//!
//! Terrain, furniture and carpets go down finished. Resource nodes and
//! registers go down as blueprints and are handed to the construction
//! pipeline. Removing anything retypes the cell to grass and unwinds every
//! binding that pointed at it.

use crate::construction::{abandon, commission, ConstructionTarget, ConstructionTask};
use crate::core::error::{PlacementRejection, Result, SimError};
use crate::core::types::{CellCoord, EntityId, Vec2};
use crate::ecs::components::{Demand, Supply, Unassigned, Waiting};
use crate::ecs::store::ComponentKind;
use crate::ecs::World;
use crate::roles::DemandState;
use crate::simulation::SimulationEvent;
use crate::tiles::{is_furnished, Cell, TileType};

/// What a successful placement produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placed {
    Built,
    /// Waiting on a builder; `worker` is set if one was put on it right away
    Blueprint { worker: Option<EntityId> },
}

pub fn place_node(world: &mut World, coord: CellCoord, tile: TileType) -> Result<Placed> {
    place(world, coord, tile, ConstructionTarget::Cell(coord))
}

/// Place at a world position (the input layer's free-form target)
pub fn place_node_at(world: &mut World, pos: Vec2, tile: TileType) -> Result<Placed> {
    let size = world.grid.tile_size;
    let width = world.grid.cols as f32 * size;
    let height = world.grid.rows as f32 * size;
    let inside = pos.x >= 0.0 && pos.y >= 0.0 && pos.x < width && pos.y < height;
    match world.grid.world_to_cell(pos) {
        Some(coord) if inside => place(world, coord, tile, ConstructionTarget::Point(pos)),
        nearest => Err(reject(
            nearest.unwrap_or(CellCoord::new(0, 0)),
            PlacementRejection::OutOfBounds,
        )),
    }
}

fn reject(coord: CellCoord, reason: PlacementRejection) -> SimError {
    tracing::warn!(%coord, %reason, "placement rejected");
    SimError::InvalidPlacement { coord, reason }
}

fn check(world: &World, coord: CellCoord, tile: TileType) -> std::result::Result<(), PlacementRejection> {
    let existing = world
        .grid
        .tile_at(coord)
        .ok_or(PlacementRejection::OutOfBounds)?;
    if tile == TileType::Grass {
        return Err(PlacementRejection::NotPlaceable(tile));
    }
    if tile.requires_floor() {
        if existing != TileType::Floor {
            return Err(PlacementRejection::RequiresFloor(existing));
        }
    } else if !existing.is_buildable_ground() || existing == tile {
        return Err(PlacementRejection::Occupied(existing));
    }
    Ok(())
}

fn place(world: &mut World, coord: CellCoord, tile: TileType, target: ConstructionTarget) -> Result<Placed> {
    check(world, coord, tile).map_err(|reason| reject(coord, reason))?;

    if tile.requires_construction() {
        world.grid.set_cell(coord, Cell::blueprint(tile));
        tracing::info!(%coord, ?tile, "blueprint placed");
        world.emit(SimulationEvent::BlueprintPlaced { site: coord, tile });
        let worker = commission(world, coord, target);
        return Ok(Placed::Blueprint { worker });
    }

    let furniture = matches!(tile, TileType::Bed | TileType::DiningTable);
    let was_furnished = furniture && is_furnished(&world.grid, coord);
    world.grid.set_cell(coord, Cell::new(tile));
    tracing::debug!(%coord, ?tile, "placed");
    if furniture && !was_furnished && is_furnished(&world.grid, coord) {
        tracing::info!(%coord, "house upgraded");
        world.emit(SimulationEvent::HouseUpgraded { coord });
    }
    Ok(Placed::Built)
}

/// Demolish whatever stands on `coord`
pub fn remove_node(world: &mut World, coord: CellCoord) -> Result<()> {
    let cell = world
        .grid
        .cell_at(coord)
        .ok_or_else(|| reject(coord, PlacementRejection::OutOfBounds))?;
    if cell.tile == TileType::Grass {
        return Err(reject(coord, PlacementRejection::NothingToRemove));
    }
    let tile = cell.tile;
    let locked = cell.locked_demand;

    if let Some((owner, repriced)) = world.grid.unclaim(coord) {
        strip_producer(world, owner, coord);
        for (entity, price) in repriced {
            reprice(world, entity, price);
        }
    }

    if let Some(consumer) = locked {
        if world.store.detach::<Demand>(consumer).is_some() {
            tracing::info!(entity = %consumer, %coord, "queue slot demolished");
            world.emit(SimulationEvent::RoleStripped {
                entity: consumer,
                coord,
            });
        }
    }

    if tile.sells().is_some() {
        release_register(world, coord);
    }

    if let Some(blueprint) = world.blueprints.remove(coord) {
        if let Some(worker) = blueprint.worker {
            abandon(world, worker);
        }
    }

    world.grid.set_cell(coord, Cell::default());
    tracing::info!(%coord, ?tile, "node removed");
    Ok(())
}

/// Take away a producer's role; it goes back to looking for work
fn strip_producer(world: &mut World, owner: EntityId, coord: CellCoord) {
    world.store.detach::<Supply>(owner);
    world.store.detach::<Waiting>(owner);
    if world.store.detach::<ConstructionTask>(owner).is_some() {
        world.blueprints.release_worker(owner);
    }
    world.store.attach(owner, Unassigned);
    tracing::info!(entity = %owner, %coord, "occupant stripped of role");
    world.emit(SimulationEvent::RoleStripped {
        entity: owner,
        coord,
    });
}

fn reprice(world: &mut World, entity: EntityId, price: i64) {
    let Some(supply) = world.store.get_mut::<Supply>(entity) else {
        return;
    };
    if supply.reservation_price != price {
        supply.reservation_price = price;
        world.emit(SimulationEvent::Repriced { entity, price });
    }
}

/// Consumers headed for a demolished register start looking again
fn release_register(world: &mut World, coord: CellCoord) {
    for id in world.store.query(&[ComponentKind::Demand]) {
        if let Some(demand) = world.store.get_mut::<Demand>(id) {
            if demand.locked_register == Some(coord) {
                demand.locked_register = None;
                if matches!(demand.state, DemandState::ToQueue | DemandState::ToRegister) {
                    demand.state = DemandState::SeekRegister;
                }
            }
        }
    }
}
