//! Farmer: plot, water, irrigate, back to the plot, grow, harvest, deliver

use crate::core::types::EntityId;
use crate::ecs::components::Supply;
use crate::ecs::World;
use crate::roles::movement::{arrive_loose, arrive_precise, wait};
use crate::roles::state::{FarmerState, RoleState};
use crate::roles::{nearest_water, settle_delivery, ProducerRole};
use crate::tiles::Inventory;

pub struct Farmer;

impl ProducerRole for Farmer {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply) {
        let Some(plot) = supply.node else {
            return;
        };
        let RoleState::Farmer { crop, state } = &mut supply.role else {
            return;
        };
        let item = crop.item();

        match *state {
            FarmerState::ToPlot => {
                if arrive_precise(world, entity, plot) {
                    *state = FarmerState::ToWater;
                }
            }
            FarmerState::ToWater => {
                let water = match nearest_water(world, entity) {
                    Ok(water) => water,
                    Err(error) => {
                        tracing::trace!(entity = %entity, %error, "idle");
                        return;
                    }
                };
                if arrive_loose(world, entity, water) {
                    let ticks = world.config.irrigate_ticks;
                    wait(world, entity, ticks);
                    *state = FarmerState::Irrigating;
                }
            }
            FarmerState::Irrigating => {
                *state = FarmerState::Returning;
            }
            FarmerState::Returning => {
                if arrive_precise(world, entity, plot) {
                    let ticks = world.config.grow_ticks;
                    wait(world, entity, ticks);
                    *state = FarmerState::Growing;
                }
            }
            FarmerState::Growing => {
                if let Some(inventory) = world.inventory_mut(entity) {
                    inventory.add(item, 1);
                }
                *state = FarmerState::Delivering;
            }
            FarmerState::Delivering => {
                if !arrive_precise(world, entity, plot) {
                    return;
                }
                let harvested = world
                    .store
                    .get_mut::<Inventory>(entity)
                    .map_or(0, |inv| inv.take_all(item));
                if let Some(cell) = world.grid.cell_mut(plot) {
                    cell.inventory.add(item, harvested);
                }
                supply.quantity += harvested;
                tracing::debug!(entity = %entity, %plot, %item, harvested, "harvest delivered");
                settle_delivery(world, entity, item, supply.reservation_price, harvested);
                *state = FarmerState::ToWater;
            }
        }
    }
}
