//! Consumer purchase cycle
//!
//! Bind a queue slot (a carpet, kept for life), pick a register that sells
//! the good, queue, buy, walk home, consume, repeat. Among consumers of one
//! item that have not bound a slot yet, only the highest bidder acts each
//! tick; ties go to the lowest id.

use ahash::{AHashMap, AHashSet};

use crate::core::types::{CellCoord, EntityId};
use crate::ecs::components::{Demand, Home};
use crate::ecs::store::ComponentKind;
use crate::ecs::World;
use crate::goods::Item;
use crate::roles::movement::{arrive_precise, steer};
use crate::roles::state::DemandState;
use crate::simulation::SimulationEvent;
use crate::tiles::{Inventory, Taken, TileType};

pub fn run_consumers(world: &mut World, suspended: &AHashSet<EntityId>) {
    let consumers: Vec<EntityId> = world
        .store
        .query(&[ComponentKind::Demand, ComponentKind::Position])
        .into_iter()
        .filter(|id| !suspended.contains(id))
        .collect();

    let leaders = unbound_leaders(world, &consumers);

    for id in consumers {
        let Some(mut demand) = world.store.get::<Demand>(id).cloned() else {
            continue;
        };
        if demand.locked_carpet.is_none() && leaders.get(&demand.good) != Some(&id) {
            continue;
        }

        update(world, id, &mut demand);

        if let Some(slot) = world.store.get_mut::<Demand>(id) {
            *slot = demand;
        }
    }
}

/// Highest-paying consumer per item among those without a queue slot
pub fn unbound_leaders(world: &World, consumers: &[EntityId]) -> AHashMap<Item, EntityId> {
    let mut best: AHashMap<Item, (i64, EntityId)> = AHashMap::new();
    for id in consumers {
        let Some(demand) = world.store.get::<Demand>(*id) else {
            continue;
        };
        if demand.locked_carpet.is_some() {
            continue;
        }
        let candidate = (demand.reservation_price, *id);
        best.entry(demand.good)
            .and_modify(|current| {
                if candidate.0 > current.0 || (candidate.0 == current.0 && candidate.1 < current.1) {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }
    best.into_iter().map(|(item, (_, id))| (item, id)).collect()
}

fn update(world: &mut World, id: EntityId, demand: &mut Demand) {
    match demand.state {
        DemandState::Unbound => {
            if let Some(carpet) = free_carpet(world, id) {
                if world.grid.lock(carpet, id) {
                    tracing::debug!(entity = %id, %carpet, "queue slot bound");
                    demand.locked_carpet = Some(carpet);
                    demand.state = DemandState::SeekRegister;
                }
            }
        }
        DemandState::SeekRegister => {
            if let Some(register) = affordable_register(world, id, demand) {
                demand.locked_register = Some(register);
                demand.state = DemandState::ToQueue;
            }
        }
        DemandState::ToQueue => {
            let Some(carpet) = demand.locked_carpet else {
                demand.state = DemandState::Unbound;
                return;
            };
            if arrive_precise(world, id, carpet) {
                demand.state = DemandState::ToRegister;
            }
        }
        DemandState::ToRegister => {
            let Some(register) = demand.locked_register else {
                demand.state = DemandState::SeekRegister;
                return;
            };
            if world.grid.tile_at(register) != Some(TileType::Register(demand.good)) {
                demand.locked_register = None;
                demand.state = DemandState::SeekRegister;
                return;
            }
            if arrive_precise(world, id, register) {
                purchase(world, id, demand, register);
            }
        }
        DemandState::ToHome => {
            let home = world
                .store
                .get::<Home>(id)
                .map(|h| h.0)
                .or_else(|| demand.locked_carpet.map(|c| world.grid.cell_center(c)));
            let Some(home) = home else {
                return;
            };
            let threshold = world.config.arrive_loose;
            if steer(world, id, home, threshold) {
                consume(world, id, demand);
            }
        }
    }
}

/// Nearest built carpet nobody has locked
fn free_carpet(world: &World, id: EntityId) -> Option<CellCoord> {
    let pos = world.position(id)?;
    world.grid.find_nearest(pos, |_, cell| {
        cell.tile == TileType::Carpet && cell.is_operational() && cell.locked_demand.is_none()
    })
}

/// Nearest register selling the good, if the consumer is willing and able to pay
fn affordable_register(world: &World, id: EntityId, demand: &Demand) -> Option<CellCoord> {
    let price = world.config.prices.sale_price(demand.good);
    if demand.reservation_price < price || !world.can_afford(id, price) {
        return None;
    }
    let pos = world.position(id)?;
    let item = demand.good;
    let max_back_orders = world.config.max_back_orders;
    world.grid.find_nearest(pos, |_, cell| {
        cell.is_operational()
            && cell.tile.sells() == Some(item)
            && cell.inventory.can_sell(item, max_back_orders)
    })
}

fn purchase(world: &mut World, id: EntityId, demand: &mut Demand, register: CellCoord) {
    let item = demand.good;
    let max_back_orders = world.config.max_back_orders;
    let sellable = world
        .grid
        .cell_at(register)
        .is_some_and(|cell| cell.inventory.can_sell(item, max_back_orders));
    let price = world.config.prices.sale_price(item);
    let paid = sellable
        && match world.seller_of(register) {
            Some(seller) => world.pay(id, seller, price),
            None => false,
        };
    if !paid {
        // Sold out or unaffordable: look again next tick
        demand.locked_register = None;
        demand.state = DemandState::SeekRegister;
        return;
    }

    let Some(taken) = world
        .grid
        .cell_mut(register)
        .and_then(|cell| cell.inventory.take_for_sale(item, max_back_orders))
    else {
        return;
    };
    if let Some(inventory) = world.store.get_mut::<Inventory>(id) {
        match taken {
            Taken::Fresh | Taken::BackOrder => inventory.add(item, 1),
            Taken::Spoiled => inventory.add_wasted(item, 1),
        }
    }

    let spoiled = taken == Taken::Spoiled;
    world.reputation += if spoiled {
        world.config.reputation_spoiled
    } else {
        world.config.reputation_fresh
    };
    demand.quantity += 1;
    demand.state = DemandState::ToHome;

    tracing::debug!(entity = %id, %register, %item, ?taken, price, "purchase");
    world.emit(SimulationEvent::Purchased {
        entity: id,
        register,
        item,
        price,
        spoiled,
    });
}

/// Eat (or throw out) what was bought, then shop again. Only the register
/// binding is reset; the queue slot stays.
fn consume(world: &mut World, id: EntityId, demand: &mut Demand) {
    let item = demand.good;
    let spoiled = world.store.get_mut::<Inventory>(id).and_then(|inventory| {
        if inventory.remove(item, 1) == 1 {
            Some(false)
        } else if inventory.discard_wasted(item) {
            Some(true)
        } else {
            None
        }
    });

    if let Some(spoiled) = spoiled {
        demand.satisfaction += if spoiled {
            world.config.satisfaction_spoiled
        } else {
            world.config.satisfaction_fresh
        };
        world.emit(SimulationEvent::Consumed {
            entity: id,
            item,
            spoiled,
        });
    }
    demand.locked_register = None;
    demand.state = DemandState::SeekRegister;
}
