//! Chef: assemble the recipe from stock tables, fry, sell the meal

use crate::core::types::{CellCoord, EntityId};
use crate::ecs::components::Supply;
use crate::ecs::World;
use crate::goods::{Item, MEAL_RECIPE};
use crate::roles::movement::{arrive_precise, wait};
use crate::roles::state::{ChefState, RoleState};
use crate::roles::{settle_delivery, ProducerRole};
use crate::tiles::{Inventory, TileType};

pub struct Chef;

impl ProducerRole for Chef {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply) {
        let Some(fryer) = supply.node else {
            return;
        };
        let RoleState::Chef(state) = &mut supply.role else {
            return;
        };

        match *state {
            ChefState::Gather => {
                let missing = MEAL_RECIPE
                    .into_iter()
                    .find(|item| world.carried(entity, *item) <= 0);
                match missing {
                    Some(item) => {
                        if let Some(table) = stocked_table(world, entity, item) {
                            *state = ChefState::Fetch { item, table };
                        }
                    }
                    None => *state = ChefState::ToFryer,
                }
            }
            ChefState::Fetch { item, table } => {
                if !arrive_precise(world, entity, table) {
                    return;
                }
                let taken = match world.grid.cell_mut(table) {
                    Some(cell) if cell.tile.stocks() == Some(item) => cell.inventory.remove(item, 1),
                    _ => 0,
                };
                if let Some(inventory) = world.inventory_mut(entity) {
                    inventory.add(item, taken);
                }
                *state = ChefState::Gather;
            }
            ChefState::ToFryer => {
                if arrive_precise(world, entity, fryer) {
                    let ticks = world.config.cook_ticks;
                    wait(world, entity, ticks);
                    *state = ChefState::Cooking;
                }
            }
            ChefState::Cooking => {
                if let Some(inventory) = world.store.get_mut::<Inventory>(entity) {
                    for ingredient in MEAL_RECIPE {
                        inventory.remove(ingredient, 1);
                    }
                    inventory.add(Item::Meal, 1);
                }
                tracing::debug!(entity = %entity, "meal cooked");
                *state = ChefState::Deliver;
            }
            ChefState::Deliver => {
                let register = world
                    .grid
                    .find_with_minimum_stock(|cell| cell.tile.sells() == Some(Item::Meal), Item::Meal);
                if let Some(register) = register {
                    *state = ChefState::ToRegister { register };
                }
            }
            ChefState::ToRegister { register } => {
                if world.grid.tile_at(register) != Some(TileType::Register(Item::Meal)) {
                    *state = ChefState::Deliver;
                    return;
                }
                if !arrive_precise(world, entity, register) {
                    return;
                }
                let meals = world
                    .store
                    .get_mut::<Inventory>(entity)
                    .map_or(0, |inv| inv.take_all(Item::Meal));
                if let Some(cell) = world.grid.cell_mut(register) {
                    cell.inventory.add(Item::Meal, meals);
                }
                supply.quantity += meals;
                settle_delivery(world, entity, Item::Meal, supply.reservation_price, meals);
                *state = ChefState::Gather;
            }
        }
    }
}

/// Nearest built stock table of `item` with fresh stock on it
fn stocked_table(world: &World, entity: EntityId, item: Item) -> Option<CellCoord> {
    let pos = world.position(entity)?;
    world.grid.find_nearest(pos, |_, cell| {
        cell.is_operational() && cell.tile.stocks() == Some(item) && cell.inventory.fresh(item) > 0
    })
}
