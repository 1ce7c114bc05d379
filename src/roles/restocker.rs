//! Restocker: keeps one stock table topped up by buying back from a register

use crate::core::types::{CellCoord, EntityId};
use crate::ecs::components::Supply;
use crate::ecs::World;
use crate::goods::Item;
use crate::roles::movement::{arrive_precise, wait};
use crate::roles::state::{RestockState, RoleState};
use crate::roles::ProducerRole;
use crate::simulation::SimulationEvent;
use crate::tiles::Inventory;

pub struct Restocker;

impl ProducerRole for Restocker {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply) {
        let Some(table) = supply.node else {
            return;
        };
        let RoleState::Restocker { item, state } = &mut supply.role else {
            return;
        };
        let item = *item;

        match *state {
            RestockState::Check => {
                let on_table = world
                    .grid
                    .cell_at(table)
                    .map_or(0, |cell| cell.inventory.fresh(item));
                let source = if on_table < world.config.restock_low_water {
                    stocked_register(world, entity, item)
                } else {
                    None
                };
                match source {
                    Some(register) => *state = RestockState::ToRegister { register },
                    None => {
                        let ticks = world.config.restock_idle_ticks;
                        wait(world, entity, ticks);
                    }
                }
            }
            RestockState::ToRegister { register } => {
                if world.grid.tile_at(register).and_then(|t| t.sells()) != Some(item) {
                    *state = RestockState::Check;
                    return;
                }
                if !arrive_precise(world, entity, register) {
                    return;
                }
                if buy_back(world, entity, register, item) > 0 {
                    *state = RestockState::ToTable;
                } else {
                    *state = RestockState::Check;
                }
            }
            RestockState::ToTable => {
                if !arrive_precise(world, entity, table) {
                    return;
                }
                let units = world
                    .store
                    .get_mut::<Inventory>(entity)
                    .map_or(0, |inv| inv.take_all(item));
                if let Some(cell) = world.grid.cell_mut(table) {
                    cell.inventory.add(item, units);
                }
                supply.quantity += units;

                let wage = supply.reservation_price;
                let paid = match world.household() {
                    Some(household) => world.pay(household, entity, wage),
                    None => false,
                };
                world.emit(SimulationEvent::Restocked {
                    entity,
                    table,
                    item,
                    units,
                    paid: if paid { wage } else { 0 },
                });
                *state = RestockState::Check;
            }
        }
    }
}

/// Nearest built register of `item` with fresh units to spare
fn stocked_register(world: &World, entity: EntityId, item: Item) -> Option<CellCoord> {
    let pos = world.position(entity)?;
    world.grid.find_nearest(pos, |_, cell| {
        cell.is_operational() && cell.tile.sells() == Some(item) && cell.inventory.fresh(item) > 0
    })
}

/// Buy up to a batch of fresh stock, paying the register's seller.
/// Returns the units bought.
fn buy_back(world: &mut World, entity: EntityId, register: CellCoord, item: Item) -> i32 {
    let available = world
        .grid
        .cell_at(register)
        .map_or(0, |cell| cell.inventory.fresh(item).max(0));
    let units = world.config.restock_batch.min(available);
    if units <= 0 {
        return 0;
    }

    let cost = world.config.prices.sale_price(item) * i64::from(units);
    let Some(seller) = world.seller_of(register) else {
        return 0;
    };
    if !world.pay(entity, seller, cost) {
        tracing::debug!(entity = %entity, %register, cost, "restock buy-back unaffordable");
        return 0;
    }

    let bought = world
        .grid
        .cell_mut(register)
        .map_or(0, |cell| cell.inventory.remove(item, units));
    if let Some(inventory) = world.inventory_mut(entity) {
        inventory.add(item, bought);
    }
    bought
}
