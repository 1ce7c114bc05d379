//! Unassigned villagers walk to the nearest free node and claim it

use ahash::AHashSet;
use ordered_float::OrderedFloat;

use crate::core::types::{CellCoord, EntityId};
use crate::ecs::components::{Supply, Unassigned};
use crate::ecs::store::ComponentKind;
use crate::ecs::World;
use crate::roles::movement::arrive_precise;
use crate::roles::state::RoleState;
use crate::simulation::SimulationEvent;
use crate::tiles::{ClaimError, ClaimRank};

pub fn run_fallback(world: &mut World, suspended: &AHashSet<EntityId>) {
    for id in world.store.query(&[ComponentKind::Unassigned, ComponentKind::Position]) {
        if suspended.contains(&id) {
            continue;
        }
        let Some(target) = nearest_free_node(world, id) else {
            continue;
        };
        if arrive_precise(world, id, target) {
            // Another villager may have claimed it earlier this tick
            if let Err(reason) = assign_role(world, id, target) {
                tracing::debug!(entity = %id, %target, ?reason, "claim lost");
            }
        }
    }
}

/// Closest built, unclaimed node of an eligible kind within the scan radius.
/// Ties go to the kind listed first in the config.
fn nearest_free_node(world: &World, id: EntityId) -> Option<CellCoord> {
    let pos = world.position(id)?;
    let eligible = &world.config.fallback_nodes;
    let radius = world.config.fallback_scan_radius;

    world
        .grid
        .coords()
        .filter_map(|coord| {
            let cell = world.grid.cell_at(coord)?;
            let kind = cell.tile.node_kind()?;
            let preference = eligible.iter().position(|k| *k == kind)?;
            if !cell.is_operational() || cell.claimed.is_some() {
                return None;
            }
            let distance = world.grid.cell_center(coord).distance(&pos);
            (distance <= radius).then_some((coord, OrderedFloat(distance), preference))
        })
        .min_by_key(|(_, distance, preference)| (*distance, *preference))
        .map(|(coord, _, _)| coord)
}

/// Claim `coord` for `id` and turn it into that node's producer
pub fn assign_role(world: &mut World, id: EntityId, coord: CellCoord) -> Result<ClaimRank, ClaimError> {
    let tile = world.grid.tile_at(coord).ok_or(ClaimError::OutOfBounds)?;
    let kind = tile.node_kind().ok_or(ClaimError::NotClaimable)?;
    let role = RoleState::initial(tile).ok_or(ClaimError::NotClaimable)?;
    let rank = world.grid.claim(coord, id)?;

    world.store.attach(
        id,
        Supply {
            good: kind.supplied_good(),
            reservation_price: rank.price,
            quantity: 0,
            node: Some(coord),
            role,
        },
    );
    world.store.detach::<Unassigned>(id);

    tracing::info!(entity = %id, %coord, ?kind, price = rank.price, "node claimed");
    world.emit(SimulationEvent::NodeClaimed {
        entity: id,
        coord,
        kind,
        price: rank.price,
    });
    Ok(rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::goods::Good;
    use crate::roles::RoleRegistry;
    use crate::simulation::run_simulation_tick;
    use crate::tiles::parse_layout;

    #[test]
    fn test_villager_claims_nearest_node() {
        let layout = parse_layout("F....O").unwrap();
        let mut world = World::from_layout(layout, SimulationConfig::default());
        let id = world.spawn_villager(world.grid.cell_center(CellCoord::new(0, 4)));

        let roles = RoleRegistry::standard();
        let mut claimed = false;
        for _ in 0..20 {
            let events = run_simulation_tick(&mut world, &roles);
            claimed |= events
                .iter()
                .any(|e| matches!(e, SimulationEvent::NodeClaimed { entity, .. } if *entity == id));
        }

        assert!(claimed);
        assert!(!world.store.contains::<Unassigned>(id));
        let supply = world.store.get::<Supply>(id).unwrap();
        assert_eq!(supply.good, Good::Meal);
        assert_eq!(supply.node, Some(CellCoord::new(0, 5)));
        assert_eq!(world.grid.claimant(CellCoord::new(0, 5)), Some(id));
    }

    #[test]
    fn test_claims_go_to_distinct_nodes() {
        let layout = parse_layout("F.F").unwrap();
        let mut world = World::from_layout(layout, SimulationConfig::default());
        let a = world.spawn_villager(world.grid.cell_center(CellCoord::new(0, 0)));
        let b = world.spawn_villager(world.grid.cell_center(CellCoord::new(0, 0)));

        let roles = RoleRegistry::standard();
        for _ in 0..20 {
            run_simulation_tick(&mut world, &roles);
        }

        let prices: Vec<i64> = [a, b]
            .iter()
            .map(|id| world.store.get::<Supply>(*id).unwrap().reservation_price)
            .collect();
        assert_eq!(prices, vec![13, 18]);
        assert_eq!(world.grid.claimant(CellCoord::new(0, 0)), Some(a));
        assert_eq!(world.grid.claimant(CellCoord::new(0, 2)), Some(b));
    }

    #[test]
    fn test_ignores_nodes_outside_radius_and_blueprints() {
        let layout = parse_layout("F.........").unwrap();
        let config = SimulationConfig {
            fallback_scan_radius: 50.0,
            ..SimulationConfig::default()
        };
        let mut world = World::from_layout(layout, config);
        let far = world.spawn_villager(world.grid.cell_center(CellCoord::new(0, 9)));
        assert_eq!(nearest_free_node(&world, far), None);

        let near = world.spawn_villager(world.grid.cell_center(CellCoord::new(0, 1)));
        assert_eq!(nearest_free_node(&world, near), Some(CellCoord::new(0, 0)));

        world.grid.cell_mut(CellCoord::new(0, 0)).unwrap().transparent = true;
        assert_eq!(nearest_free_node(&world, near), None);
    }

    #[test]
    fn test_assign_rejects_non_nodes() {
        let layout = parse_layout("~F").unwrap();
        let mut world = World::from_layout(layout, SimulationConfig::default());
        let id = world.spawn_villager(world.grid.cell_center(CellCoord::new(0, 0)));
        assert_eq!(
            assign_role(&mut world, id, CellCoord::new(0, 0)),
            Err(ClaimError::NotClaimable)
        );
        assert!(world.store.contains::<Unassigned>(id));
    }
}
