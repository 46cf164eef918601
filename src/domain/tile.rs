/// Terrain tiles and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Open,
    Tree, // Blocking
}

impl Tile {
    /// Does this tile stop movement? (walls for players, enemies and fireballs)
    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Tree)
    }
}
