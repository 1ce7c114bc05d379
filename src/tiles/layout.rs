//! ASCII village layouts
//!
//! One character per cell from the legend below, or a bracketed token for
//! cells that carry an item:
//!
//! ```text
//! .  grass      ~  water      #  wall       +  door
//! _  floor      =  carpet     b  bed        t  dining table
//! F  fishing rod             P / C / K  potato / carrot / cabbage plot
//! O  fryer      H  cart       W  workbench
//! <register:meal>  <table:fish>  (any item name)
//! ```
//!
//! Every row must have the same width. Layout nodes start built.

use nom::branch::alt;
use nom::character::complete::{alpha1, anychar, char, line_ending, multispace0};
use nom::combinator::{all_consuming, map_opt};
use nom::multi::{many1, separated_list1};
use nom::sequence::{delimited, separated_pair, terminated};
use nom::{IResult, Parser};

use crate::core::config::PricingTiers;
use crate::core::error::{Result, SimError};
use crate::core::types::CellCoord;
use crate::goods::{Crop, Item};
use crate::tiles::cell::{Cell, TileType};
use crate::tiles::grid::TileGrid;

/// Parsed layout, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub rows: usize,
    pub cols: usize,
    pub tiles: Vec<TileType>,
}

impl Layout {
    pub fn tile(&self, coord: CellCoord) -> Option<TileType> {
        (coord.row < self.rows && coord.col < self.cols)
            .then(|| self.tiles[coord.row * self.cols + coord.col])
    }

    pub fn into_grid(self, tile_size: f32, tiers: PricingTiers) -> TileGrid {
        let mut grid = TileGrid::new(self.rows, self.cols, tile_size, tiers);
        for (idx, tile) in self.tiles.into_iter().enumerate() {
            let coord = CellCoord::new(idx / self.cols, idx % self.cols);
            grid.set_cell(coord, Cell::new(tile));
        }
        grid
    }
}

fn legend_tile(c: char) -> Option<TileType> {
    let tile = match c {
        '.' => TileType::Grass,
        '~' => TileType::Water,
        '#' => TileType::Wall,
        '+' => TileType::Door,
        '_' => TileType::Floor,
        '=' => TileType::Carpet,
        'b' => TileType::Bed,
        't' => TileType::DiningTable,
        'F' => TileType::FishingRod,
        'P' => TileType::CropPlot(Crop::Potato),
        'C' => TileType::CropPlot(Crop::Carrot),
        'K' => TileType::CropPlot(Crop::Cabbage),
        'O' => TileType::Fryer,
        'H' => TileType::Cart,
        'W' => TileType::Workbench,
        _ => return None,
    };
    Some(tile)
}

fn named_tile((kind, item): (&str, &str)) -> Option<TileType> {
    let item = Item::from_name(item)?;
    match kind {
        "register" => Some(TileType::Register(item)),
        "table" => Some(TileType::StockTable(item)),
        _ => None,
    }
}

fn legend_token(input: &str) -> IResult<&str, TileType> {
    map_opt(anychar, legend_tile).parse(input)
}

fn named_token(input: &str) -> IResult<&str, TileType> {
    map_opt(
        delimited(char('<'), separated_pair(alpha1, char(':'), alpha1), char('>')),
        named_tile,
    )
    .parse(input)
}

fn row(input: &str) -> IResult<&str, Vec<TileType>> {
    many1(alt((named_token, legend_token))).parse(input)
}

fn rows(input: &str) -> IResult<&str, Vec<Vec<TileType>>> {
    all_consuming(terminated(separated_list1(line_ending, row), multispace0)).parse(input)
}

/// Parse an ASCII layout
pub fn parse_layout(input: &str) -> Result<Layout> {
    let (_, parsed) = rows(input.trim_start()).map_err(|e| SimError::Layout(e.to_string()))?;

    let cols = parsed.first().map_or(0, Vec::len);
    if let Some(bad) = parsed.iter().position(|r| r.len() != cols) {
        return Err(SimError::Layout(format!(
            "row {} has {} cells, expected {}",
            bad,
            parsed[bad].len(),
            cols
        )));
    }

    Ok(Layout {
        rows: parsed.len(),
        cols,
        tiles: parsed.into_iter().flatten().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legend() {
        let layout = parse_layout("~~F.\n#+_=\n").unwrap();
        assert_eq!(layout.rows, 2);
        assert_eq!(layout.cols, 4);
        assert_eq!(layout.tile(CellCoord::new(0, 2)), Some(TileType::FishingRod));
        assert_eq!(layout.tile(CellCoord::new(1, 3)), Some(TileType::Carpet));
    }

    #[test]
    fn test_parse_named_tokens() {
        let layout = parse_layout("<register:meal>.<table:fish>").unwrap();
        assert_eq!(layout.cols, 3);
        assert_eq!(layout.tiles[0], TileType::Register(Item::Meal));
        assert_eq!(layout.tiles[2], TileType::StockTable(Item::Fish));
    }

    #[test]
    fn test_unknown_character_rejected() {
        assert!(matches!(parse_layout("..X."), Err(SimError::Layout(_))));
        assert!(matches!(parse_layout("<register:caviar>"), Err(SimError::Layout(_))));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = parse_layout("...\n..").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_into_grid_builds_cells() {
        let grid = parse_layout("P.\n.O").unwrap().into_grid(16.0, PricingTiers::default());
        let plot = grid.cell_at(CellCoord::new(0, 0)).unwrap();
        assert_eq!(plot.tile, TileType::CropPlot(Crop::Potato));
        assert!(plot.is_operational());
        assert_eq!(grid.tile_at(CellCoord::new(1, 1)), Some(TileType::Fryer));
    }
}
