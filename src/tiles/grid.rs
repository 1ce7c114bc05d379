//! Tile grid holding cells, claims and locks

use ordered_float::OrderedFloat;

use crate::core::config::PricingTiers;
use crate::core::types::{CellCoord, EntityId, Vec2};
use crate::goods::Item;
use crate::tiles::cell::{Cell, NodeKind, TileType};
use crate::tiles::occupancy::{ClaimRank, OccupancyRegistry};

/// Why a claim did not go through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    OutOfBounds,
    NotClaimable,
    AlreadyClaimed(EntityId),
    Unbuilt,
}

/// Row-major grid of cells with square tiles of `tile_size` world units
#[derive(Debug, Clone)]
pub struct TileGrid {
    pub rows: usize,
    pub cols: usize,
    pub tile_size: f32,
    cells: Vec<Cell>,
    occupancy: OccupancyRegistry,
}

impl TileGrid {
    pub fn new(rows: usize, cols: usize, tile_size: f32, tiers: PricingTiers) -> Self {
        Self {
            rows,
            cols,
            tile_size,
            cells: vec![Cell::default(); rows * cols],
            occupancy: OccupancyRegistry::new(tiers),
        }
    }

    #[inline]
    pub fn in_bounds(&self, coord: CellCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    #[inline]
    pub fn cell_at(&self, coord: CellCoord) -> Option<&Cell> {
        if self.in_bounds(coord) {
            Some(&self.cells[coord.row * self.cols + coord.col])
        } else {
            None
        }
    }

    #[inline]
    pub fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        if self.in_bounds(coord) {
            Some(&mut self.cells[coord.row * self.cols + coord.col])
        } else {
            None
        }
    }

    /// Overwrite a cell wholesale; out-of-bounds writes are dropped
    pub fn set_cell(&mut self, coord: CellCoord, cell: Cell) -> bool {
        match self.cell_mut(coord) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn tile_at(&self, coord: CellCoord) -> Option<TileType> {
        self.cell_at(coord).map(|c| c.tile)
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| CellCoord::new(row, col)))
    }

    /// Convert world position to the cell under it (clamped to the grid).
    /// `None` only for a grid with no cells.
    pub fn world_to_cell(&self, pos: Vec2) -> Option<CellCoord> {
        if self.rows == 0 || self.cols == 0 {
            return None;
        }
        let col = (pos.x / self.tile_size).floor() as i64;
        let row = (pos.y / self.tile_size).floor() as i64;
        Some(CellCoord::new(
            row.clamp(0, self.rows as i64 - 1) as usize,
            col.clamp(0, self.cols as i64 - 1) as usize,
        ))
    }

    /// Cell center in world coordinates
    pub fn cell_center(&self, coord: CellCoord) -> Vec2 {
        Vec2::new(
            (coord.col as f32 + 0.5) * self.tile_size,
            (coord.row as f32 + 0.5) * self.tile_size,
        )
    }

    /// Nearest cell (by center distance) satisfying `filter`; ties go to the
    /// first cell in row-major order
    pub fn find_nearest<F>(&self, pos: Vec2, filter: F) -> Option<CellCoord>
    where
        F: Fn(CellCoord, &Cell) -> bool,
    {
        self.coords()
            .filter(|coord| filter(*coord, &self.cells[coord.row * self.cols + coord.col]))
            .min_by_key(|coord| OrderedFloat(self.cell_center(*coord).distance(&pos)))
    }

    pub fn find_nearest_of_type(&self, pos: Vec2, tile: TileType) -> Option<CellCoord> {
        self.find_nearest(pos, |_, cell| cell.tile == tile)
    }

    /// Built cell matching `filter` holding the fewest fresh units of `item`
    ///
    /// Routes deliveries to the emptiest node so stock spreads out instead of
    /// piling up on one. Ties go to the first cell in row-major order.
    pub fn find_with_minimum_stock<F>(&self, filter: F, item: Item) -> Option<CellCoord>
    where
        F: Fn(&Cell) -> bool,
    {
        self.coords()
            .filter(|coord| {
                let cell = &self.cells[coord.row * self.cols + coord.col];
                cell.is_operational() && filter(cell)
            })
            .min_by_key(|coord| self.cells[coord.row * self.cols + coord.col].inventory.fresh(item))
    }

    /// Bind an entity to a node and rank it among occupants of that kind
    pub fn claim(&mut self, coord: CellCoord, entity: EntityId) -> Result<ClaimRank, ClaimError> {
        let cell = self.cell_mut(coord).ok_or(ClaimError::OutOfBounds)?;
        let kind = cell.tile.node_kind().ok_or(ClaimError::NotClaimable)?;
        if cell.transparent {
            return Err(ClaimError::Unbuilt);
        }
        if let Some(owner) = cell.claimed {
            return Err(ClaimError::AlreadyClaimed(owner));
        }
        cell.claimed = Some(entity);
        Ok(self.occupancy.claim(kind, entity))
    }

    /// Release a node's claim; returns the former claimant and the new prices
    /// of the remaining occupants of that kind
    pub fn unclaim(&mut self, coord: CellCoord) -> Option<(EntityId, Vec<(EntityId, i64)>)> {
        let cell = self.cell_mut(coord)?;
        let owner = cell.claimed.take()?;
        let kind = cell.tile.node_kind()?;
        Some((owner, self.occupancy.vacate(kind, owner)))
    }

    pub fn claimant(&self, coord: CellCoord) -> Option<EntityId> {
        self.cell_at(coord).and_then(|c| c.claimed)
    }

    /// Reserve a queue slot for a consumer; fails if already locked
    pub fn lock(&mut self, coord: CellCoord, consumer: EntityId) -> bool {
        match self.cell_mut(coord) {
            Some(cell) if cell.locked_demand.is_none() => {
                cell.locked_demand = Some(consumer);
                true
            }
            _ => false,
        }
    }

    pub fn locked_by(&self, coord: CellCoord) -> Option<EntityId> {
        self.cell_at(coord).and_then(|c| c.locked_demand)
    }

    pub fn occupancy(&self) -> &OccupancyRegistry {
        &self.occupancy
    }

    pub fn occupant_count(&self, kind: NodeKind) -> usize {
        self.occupancy.count(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goods::Crop;

    fn grid() -> TileGrid {
        TileGrid::new(6, 8, 16.0, PricingTiers::default())
    }

    #[test]
    fn test_cell_access_bounds() {
        let mut grid = grid();
        assert!(grid.cell_at(CellCoord::new(5, 7)).is_some());
        assert!(grid.cell_at(CellCoord::new(6, 0)).is_none());
        assert!(!grid.set_cell(CellCoord::new(0, 8), Cell::new(TileType::Wall)));
    }

    #[test]
    fn test_world_cell_round_trip() {
        let grid = grid();
        let coord = CellCoord::new(2, 3);
        let center = grid.cell_center(coord);
        assert_eq!(center, Vec2::new(56.0, 40.0));
        assert_eq!(grid.world_to_cell(center), Some(coord));

        // Clamped outside the grid
        assert_eq!(grid.world_to_cell(Vec2::new(-50.0, 9999.0)), Some(CellCoord::new(5, 0)));
    }

    #[test]
    fn test_empty_grid_has_no_cell_under_anything() {
        let grid = TileGrid::new(0, 0, 16.0, PricingTiers::default());
        assert_eq!(grid.world_to_cell(Vec2::ZERO), None);
        assert_eq!(grid.coords().count(), 0);
    }

    #[test]
    fn test_find_nearest_of_type() {
        let mut grid = grid();
        grid.set_cell(CellCoord::new(0, 0), Cell::new(TileType::Water));
        grid.set_cell(CellCoord::new(5, 7), Cell::new(TileType::Water));

        let near_far_corner = grid.cell_center(CellCoord::new(4, 6));
        assert_eq!(
            grid.find_nearest_of_type(near_far_corner, TileType::Water),
            Some(CellCoord::new(5, 7))
        );
        assert_eq!(grid.find_nearest_of_type(near_far_corner, TileType::Fryer), None);
    }

    #[test]
    fn test_find_with_minimum_stock() {
        let mut grid = grid();
        let a = CellCoord::new(1, 1);
        let b = CellCoord::new(1, 4);
        let c = CellCoord::new(3, 3);
        for coord in [a, b] {
            grid.set_cell(coord, Cell::new(TileType::Register(Item::Fish)));
        }
        // Unbuilt registers are never chosen
        grid.set_cell(c, Cell::blueprint(TileType::Register(Item::Fish)));

        grid.cell_mut(a).unwrap().inventory.add(Item::Fish, 3);
        grid.cell_mut(b).unwrap().inventory.add(Item::Fish, 1);

        let target = grid.find_with_minimum_stock(|cell| cell.tile.sells() == Some(Item::Fish), Item::Fish);
        assert_eq!(target, Some(b));
    }

    #[test]
    fn test_claim_and_unclaim() {
        let mut grid = grid();
        let plot = CellCoord::new(2, 2);
        grid.set_cell(plot, Cell::new(TileType::CropPlot(Crop::Potato)));

        let rank = grid.claim(plot, EntityId(7)).unwrap();
        assert_eq!(rank.price, 13);
        assert_eq!(grid.claimant(plot), Some(EntityId(7)));
        assert_eq!(grid.claim(plot, EntityId(8)), Err(ClaimError::AlreadyClaimed(EntityId(7))));

        let (owner, repriced) = grid.unclaim(plot).unwrap();
        assert_eq!(owner, EntityId(7));
        assert!(repriced.is_empty());
        assert_eq!(grid.claimant(plot), None);
    }

    #[test]
    fn test_claim_rejects_unclaimable_and_unbuilt() {
        let mut grid = grid();
        assert_eq!(grid.claim(CellCoord::new(0, 0), EntityId(1)), Err(ClaimError::NotClaimable));

        grid.set_cell(CellCoord::new(0, 1), Cell::blueprint(TileType::Fryer));
        assert_eq!(grid.claim(CellCoord::new(0, 1), EntityId(1)), Err(ClaimError::Unbuilt));
    }

    #[test]
    fn test_lock_is_exclusive() {
        let mut grid = grid();
        let slot = CellCoord::new(3, 3);
        grid.set_cell(slot, Cell::new(TileType::Carpet));
        assert!(grid.lock(slot, EntityId(1)));
        assert!(!grid.lock(slot, EntityId(2)));
        assert_eq!(grid.locked_by(slot), Some(EntityId(1)));
    }
}
