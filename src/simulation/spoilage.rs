//! Perishables sitting on registers go off over time

use crate::core::types::CellCoord;
use crate::ecs::World;
use crate::goods::Item;
use crate::simulation::SimulationEvent;

/// Every `spoil_interval` ticks, each built register turns one fresh unit
/// of each perishable it holds into waste
pub fn spoil_registers(world: &mut World) {
    let tick = world.current_tick;
    if tick == 0 || tick % world.config.spoil_interval != 0 {
        return;
    }

    let registers: Vec<CellCoord> = world
        .grid
        .coords()
        .filter(|coord| {
            world
                .grid
                .cell_at(*coord)
                .is_some_and(|cell| cell.is_operational() && cell.tile.sells().is_some())
        })
        .collect();

    for register in registers {
        let Some(cell) = world.grid.cell_mut(register) else {
            continue;
        };
        let spoiled: Vec<Item> = Item::ALL
            .into_iter()
            .filter(|item| item.is_perishable())
            .filter(|item| cell.inventory.spoil_one(*item))
            .collect();
        for item in spoiled {
            tracing::debug!(%register, %item, "stock spoiled");
            world.emit(SimulationEvent::Spoiled { register, item });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::tiles::parse_layout;

    #[test]
    fn test_spoils_on_interval_only() {
        let layout = parse_layout("<register:fish><register:potato>").unwrap();
        let config = SimulationConfig {
            spoil_interval: 10,
            ..SimulationConfig::default()
        };
        let mut world = World::from_layout(layout, config);
        let fish = CellCoord::new(0, 0);
        let potato = CellCoord::new(0, 1);
        world.grid.cell_mut(fish).unwrap().inventory.add(Item::Fish, 2);
        world.grid.cell_mut(potato).unwrap().inventory.add(Item::Potato, 2);

        world.current_tick = 9;
        spoil_registers(&mut world);
        assert_eq!(world.grid.cell_at(fish).unwrap().inventory.wasted(Item::Fish), 0);

        world.current_tick = 10;
        spoil_registers(&mut world);
        let stock = world.grid.cell_at(fish).unwrap().inventory.stock(Item::Fish);
        assert_eq!((stock.fresh, stock.wasted), (1, 1));
        // Potatoes keep
        assert_eq!(world.grid.cell_at(potato).unwrap().inventory.wasted(Item::Potato), 0);
        assert_eq!(world.drain_events().len(), 1);
    }
}
