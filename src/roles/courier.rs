//! Courier: ferries harvests from production nodes to registers for a fee

use ordered_float::OrderedFloat;

use crate::core::types::{CellCoord, EntityId};
use crate::ecs::components::Supply;
use crate::ecs::World;
use crate::goods::Item;
use crate::roles::movement::arrive_precise;
use crate::roles::state::{CourierState, RoleState};
use crate::roles::ProducerRole;
use crate::simulation::SimulationEvent;
use crate::tiles::Inventory;

pub struct Courier;

impl ProducerRole for Courier {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply) {
        let RoleState::Courier(state) = &mut supply.role else {
            return;
        };

        match *state {
            CourierState::Idle => {
                if let Some(from) = fullest_source(world, entity) {
                    *state = CourierState::ToPickup { from };
                }
            }
            CourierState::ToPickup { from } => {
                if !arrive_precise(world, entity, from) {
                    return;
                }
                *state = pick_up(world, entity, from);
            }
            CourierState::ToDropoff { from, to, item } => {
                if world.grid.tile_at(to).and_then(|t| t.sells()) != Some(item) {
                    // Register vanished on the way; pick another or hold the load
                    if let Some(to) = emptiest_register(world, item) {
                        *state = CourierState::ToDropoff { from, to, item };
                    }
                    return;
                }
                if !arrive_precise(world, entity, to) {
                    return;
                }
                let units = world
                    .store
                    .get_mut::<Inventory>(entity)
                    .map_or(0, |inv| inv.take_all(item));
                if let Some(cell) = world.grid.cell_mut(to) {
                    cell.inventory.add(item, units);
                }
                supply.quantity += units;

                let fee = supply.reservation_price;
                let payer = world.grid.claimant(from).or_else(|| world.household());
                let paid = match payer {
                    Some(payer) => world.pay(payer, entity, fee),
                    None => false,
                };
                world.emit(SimulationEvent::Delivered {
                    entity,
                    item,
                    units,
                    paid: if paid { fee } else { 0 },
                });
                *state = CourierState::Idle;
            }
        }
    }
}

/// Production node holding the most fresh stock; nearest wins ties
fn fullest_source(world: &World, entity: EntityId) -> Option<CellCoord> {
    let pos = world.position(entity)?;
    world
        .grid
        .coords()
        .filter_map(|coord| {
            let cell = world.grid.cell_at(coord)?;
            let item = cell.tile.produces()?;
            let fresh = cell.inventory.fresh(item);
            (cell.is_operational() && fresh > 0).then_some((coord, fresh))
        })
        .min_by_key(|(coord, fresh)| {
            (
                std::cmp::Reverse(*fresh),
                OrderedFloat(world.grid.cell_center(*coord).distance(&pos)),
            )
        })
        .map(|(coord, _)| coord)
}

fn emptiest_register(world: &World, item: Item) -> Option<CellCoord> {
    world
        .grid
        .find_with_minimum_stock(|cell| cell.tile.sells() == Some(item), item)
}

/// Load up at a production node and pick the drop-off register
fn pick_up(world: &mut World, entity: EntityId, from: CellCoord) -> CourierState {
    let Some(item) = world.grid.tile_at(from).and_then(|t| t.produces()) else {
        return CourierState::Idle;
    };
    let Some(to) = emptiest_register(world, item) else {
        return CourierState::Idle;
    };
    let capacity = world.config.courier_capacity;
    let units = world
        .grid
        .cell_mut(from)
        .map_or(0, |cell| cell.inventory.remove(item, capacity));
    if units == 0 {
        return CourierState::Idle;
    }
    if let Some(inventory) = world.inventory_mut(entity) {
        inventory.add(item, units);
    }
    tracing::debug!(entity = %entity, %from, %to, %item, units, "courier loaded");
    CourierState::ToDropoff { from, to, item }
}
