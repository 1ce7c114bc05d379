//! Fisher: walk to water, fish, bring the catch back to the rod

use crate::core::types::EntityId;
use crate::ecs::components::Supply;
use crate::ecs::World;
use crate::goods::Item;
use crate::roles::movement::{arrive_loose, arrive_precise, wait};
use crate::roles::state::{FisherState, RoleState};
use crate::roles::{nearest_water, settle_delivery, ProducerRole};
use crate::tiles::Inventory;

pub struct Fisher;

impl ProducerRole for Fisher {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply) {
        let Some(rod) = supply.node else {
            return;
        };
        let RoleState::Fisher(state) = &mut supply.role else {
            return;
        };

        match *state {
            FisherState::ToWater => {
                let water = match nearest_water(world, entity) {
                    Ok(water) => water,
                    Err(error) => {
                        tracing::trace!(entity = %entity, %error, "idle");
                        return;
                    }
                };
                if arrive_loose(world, entity, water) {
                    let ticks = world.config.fishing_ticks;
                    wait(world, entity, ticks);
                    *state = FisherState::Fishing;
                }
            }
            FisherState::Fishing => {
                if let Some(inventory) = world.inventory_mut(entity) {
                    inventory.add(Item::Fish, 1);
                }
                *state = FisherState::ToRod;
            }
            FisherState::ToRod => {
                if !arrive_precise(world, entity, rod) {
                    return;
                }
                let caught = world
                    .store
                    .get_mut::<Inventory>(entity)
                    .map_or(0, |inv| inv.take_all(Item::Fish));
                if let Some(cell) = world.grid.cell_mut(rod) {
                    cell.inventory.add(Item::Fish, caught);
                }
                supply.quantity += caught;
                tracing::debug!(entity = %entity, %rod, caught, "fish landed");
                settle_delivery(world, entity, Item::Fish, supply.reservation_price, caught);
                *state = FisherState::ToWater;
            }
        }
    }
}
