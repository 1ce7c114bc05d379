//! Region enclosure analysis
//!
//! Flood fill from a cell treating walls and doors as barriers. A region is
//! enclosed only if the fill never steps off the grid; touching the edge means
//! "outdoors".

use std::collections::BTreeSet;

use crate::core::types::CellCoord;
use crate::tiles::cell::TileType;
use crate::tiles::grid::TileGrid;

/// Cells reachable from `start` without crossing a barrier, or `None` if the
/// fill escapes the grid (or `start` is itself a barrier or out of bounds)
pub fn enclosed_region(grid: &TileGrid, start: CellCoord) -> Option<BTreeSet<CellCoord>> {
    let tile = grid.tile_at(start)?;
    if tile.is_barrier() {
        return None;
    }

    let mut region = BTreeSet::new();
    let mut stack = vec![(start.row as i64, start.col as i64)];

    while let Some((row, col)) = stack.pop() {
        if row < 0 || col < 0 || row >= grid.rows as i64 || col >= grid.cols as i64 {
            return None;
        }
        let coord = CellCoord::new(row as usize, col as usize);
        if region.contains(&coord) {
            continue;
        }
        match grid.tile_at(coord) {
            Some(t) if t.is_barrier() => continue,
            Some(_) => {}
            None => return None,
        }
        region.insert(coord);
        stack.extend([(row - 1, col), (row + 1, col), (row, col - 1), (row, col + 1)]);
    }

    Some(region)
}

pub fn is_enclosed(grid: &TileGrid, start: CellCoord) -> bool {
    enclosed_region(grid, start).is_some()
}

/// An enclosed region holding both a bed and a dining table counts as a house
pub fn is_furnished(grid: &TileGrid, start: CellCoord) -> bool {
    let Some(region) = enclosed_region(grid, start) else {
        return false;
    };
    let has = |wanted: TileType| region.iter().any(|c| grid.tile_at(*c) == Some(wanted));
    has(TileType::Bed) && has(TileType::DiningTable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PricingTiers;
    use crate::tiles::cell::Cell;

    /// 7x7 grid with a 5x5 walled room in the middle (interior 3x3)
    fn walled_room() -> TileGrid {
        let mut grid = TileGrid::new(7, 7, 16.0, PricingTiers::default());
        for i in 1..=5 {
            for coord in [
                CellCoord::new(1, i),
                CellCoord::new(5, i),
                CellCoord::new(i, 1),
                CellCoord::new(i, 5),
            ] {
                grid.set_cell(coord, Cell::new(TileType::Wall));
            }
        }
        grid
    }

    #[test]
    fn test_room_interior_is_enclosed() {
        let grid = walled_room();
        let region = enclosed_region(&grid, CellCoord::new(3, 3)).unwrap();
        assert_eq!(region.len(), 9);
        assert!(region.contains(&CellCoord::new(2, 2)));
        assert!(!region.contains(&CellCoord::new(1, 1)));
    }

    #[test]
    fn test_outside_is_not_enclosed() {
        let grid = walled_room();
        assert!(!is_enclosed(&grid, CellCoord::new(0, 0)));
    }

    #[test]
    fn test_doors_count_as_walls() {
        let mut grid = walled_room();
        grid.set_cell(CellCoord::new(1, 3), Cell::new(TileType::Door));
        assert!(is_enclosed(&grid, CellCoord::new(3, 3)));
    }

    #[test]
    fn test_gap_in_wall_leaks() {
        let mut grid = walled_room();
        grid.set_cell(CellCoord::new(1, 3), Cell::new(TileType::Floor));
        assert!(!is_enclosed(&grid, CellCoord::new(3, 3)));
    }

    #[test]
    fn test_barrier_start_is_not_enclosed() {
        let grid = walled_room();
        assert!(enclosed_region(&grid, CellCoord::new(1, 1)).is_none());
    }

    #[test]
    fn test_single_cell_room_against_edge() {
        // The grid edge is not a wall; only in-bounds walls enclose
        let mut grid = TileGrid::new(3, 3, 16.0, PricingTiers::default());
        for coord in grid.coords().collect::<Vec<_>>() {
            if coord != CellCoord::new(1, 1) {
                grid.set_cell(coord, Cell::new(TileType::Wall));
            }
        }
        let region = enclosed_region(&grid, CellCoord::new(1, 1)).unwrap();
        assert_eq!(region.len(), 1);

        // Opening onto the border cell escapes once the fill steps off-grid
        grid.set_cell(CellCoord::new(0, 1), Cell::new(TileType::Floor));
        assert!(!is_enclosed(&grid, CellCoord::new(1, 1)));
    }

    #[test]
    fn test_furnished_house() {
        let mut grid = walled_room();
        grid.set_cell(CellCoord::new(2, 2), Cell::new(TileType::Bed));
        assert!(!is_furnished(&grid, CellCoord::new(3, 3)));

        grid.set_cell(CellCoord::new(4, 4), Cell::new(TileType::DiningTable));
        assert!(is_furnished(&grid, CellCoord::new(3, 3)));
    }

    #[test]
    fn test_enumeration_is_idempotent() {
        let grid = walled_room();
        let first = enclosed_region(&grid, CellCoord::new(2, 3));
        let second = enclosed_region(&grid, CellCoord::new(2, 3));
        assert_eq!(first, second);
    }
}
