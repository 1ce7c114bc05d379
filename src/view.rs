//! Read-only views for the rendering and dialogue layers

use serde::Serialize;

use crate::core::error::{Result, SimError};
use crate::core::types::{CellCoord, EntityId, Vec2};
use crate::ecs::components::{Demand, Supply};
use crate::ecs::World;
use crate::goods::Item;
use crate::tiles::{enclosed_region, is_furnished, Stock, TileType};

/// What the renderer needs to draw one cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub tile: TileType,
    pub transparent: bool,
    pub items: Vec<(Item, Stock)>,
    /// Wage of whoever works this node
    pub claimant_price: Option<i64>,
}

pub fn tile_view(world: &World, coord: CellCoord) -> Option<TileView> {
    let cell = world.grid.cell_at(coord)?;
    let claimant_price = cell
        .claimed
        .and_then(|owner| world.store.get::<Supply>(owner))
        .map(|supply| supply.reservation_price);
    Some(TileView {
        tile: cell.tile,
        transparent: cell.transparent,
        items: cell.inventory.entries(),
        claimant_price,
    })
}

/// Flavor inputs for ambient dialogue at a spot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbienceView {
    pub indoors: bool,
    /// Size of the enclosed room, if indoors
    pub room_cells: usize,
    pub furnished: bool,
    pub household_money: i64,
    pub reputation: i64,
}

pub fn ambience_at(world: &World, pos: Vec2) -> AmbienceView {
    let coord = world.grid.world_to_cell(pos);
    let room = coord.and_then(|coord| enclosed_region(&world.grid, coord));
    AmbienceView {
        indoors: room.is_some(),
        room_cells: room.map_or(0, |cells| cells.len()),
        furnished: coord.is_some_and(|coord| is_furnished(&world.grid, coord)),
        household_money: world.household().map_or(0, |h| world.money(h)),
        reputation: world.reputation,
    }
}

/// One agent as seen from outside
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub id: EntityId,
    pub position: Vec2,
    pub money: i64,
    pub role: String,
    pub wage: Option<i64>,
    pub satisfaction: Option<u32>,
}

pub fn agent_view(world: &World, id: EntityId) -> Result<AgentView> {
    let position = world.position(id).ok_or(SimError::EntityNotFound(id))?;
    let supply = world.store.get::<Supply>(id);
    let demand = world.store.get::<Demand>(id);
    let role = match (supply, demand) {
        (Some(supply), _) => supply.good.to_string(),
        (None, Some(demand)) => format!("buys {}", demand.good),
        (None, None) => "unassigned".to_string(),
    };
    Ok(AgentView {
        id,
        position,
        money: world.money(id),
        role,
        wage: supply.map(|s| s.reservation_price),
        satisfaction: demand.map(|d| d.satisfaction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::roles::fallback::assign_role;
    use crate::tiles::parse_layout;

    #[test]
    fn test_tile_view_shows_claimant_wage() {
        let layout = parse_layout("F<register:fish>").unwrap();
        let mut world = World::from_layout(layout, SimulationConfig::default());
        let rod = CellCoord::new(0, 0);
        let id = world.spawn_villager(world.grid.cell_center(rod));
        assign_role(&mut world, id, rod).unwrap();
        world.grid.cell_mut(rod).unwrap().inventory.add(Item::Fish, 2);

        let view = tile_view(&world, rod).unwrap();
        assert_eq!(view.tile, TileType::FishingRod);
        assert_eq!(view.claimant_price, Some(13));
        assert_eq!(view.items.len(), 1);
        assert!(tile_view(&world, CellCoord::new(3, 3)).is_none());
    }

    #[test]
    fn test_ambience_indoors() {
        let layout = parse_layout("#####\n#b_t#\n#####").unwrap();
        let mut world = World::from_layout(layout, SimulationConfig::default());
        world.spawn_household();

        let inside = world.grid.cell_center(CellCoord::new(1, 2));
        let view = ambience_at(&world, inside);
        assert!(view.indoors);
        assert!(view.furnished);
        assert_eq!(view.room_cells, 3);
        assert_eq!(view.household_money, 500);
    }

    #[test]
    fn test_ambience_on_empty_map() {
        let world = World::new(0, 0, SimulationConfig::default());
        let view = ambience_at(&world, Vec2::new(5.0, 5.0));
        assert!(!view.indoors);
        assert_eq!(view.room_cells, 0);
        assert!(!view.furnished);
    }

    #[test]
    fn test_agent_view() {
        let mut world = World::new(4, 4, SimulationConfig::default());
        let id = world.spawn_consumer(Vec2::ZERO, Item::Meal, 20, 40);
        let view = agent_view(&world, id).unwrap();
        assert_eq!(view.role, "buys meal");
        assert_eq!(view.money, 40);
        assert!(matches!(
            agent_view(&world, EntityId(99)),
            Err(SimError::EntityNotFound(_))
        ));
    }
}
