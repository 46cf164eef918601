/// Grid model: the terrain layer.
///
/// Built once when a level loads and never mutated afterwards. Entities
/// are not stored here; the grid only answers "what the cell IS"
/// (open or blocking) and "is this cell on the map at all".

use super::entity::Pos;
use super::tile::Tile;

#[derive(Clone, Debug)]
pub struct Grid {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Build a grid from rows of tiles. Ragged rows are padded on the
    /// right with `Tile::Open` so the grid is always rectangular.
    pub fn new(mut tiles: Vec<Vec<Tile>>) -> Self {
        let height = tiles.len();
        let width = tiles.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut tiles {
            row.resize(width, Tile::Open);
        }
        Grid { tiles, width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.height
            && (pos.col as usize) < self.width
    }

    /// Tile at `pos`, or None off the map.
    #[inline]
    pub fn tile_at(&self, pos: Pos) -> Option<Tile> {
        if self.in_bounds(pos) {
            Some(self.tiles[pos.row as usize][pos.col as usize])
        } else {
            None
        }
    }

    /// Blocking terrain. Off-map cells are not terrain and report false;
    /// border checks go through `in_bounds`.
    #[inline]
    pub fn is_blocking(&self, pos: Pos) -> bool {
        self.tile_at(pos).map_or(false, Tile::is_blocking)
    }
}
