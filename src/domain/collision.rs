/// Collision resolver: the single answer to "what is at this cell".
///
/// ## Precedence
///
/// Checked in this order, first match wins:
///   1. Target off the map        → `Hit::OutOfBorder`
///   2. Target is blocking terrain → `Hit::Tree`
///   3. First active candidate on the target (caller order) → its kind
///   4. Nothing                    → `None`
///
/// Terrain always beats entities: a fireball flying into a tree explodes
/// even if an enemy somehow shares that cell.

use super::entity::{Entity, EntityKind, Pos};
use super::grid::Grid;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Hit {
    OutOfBorder,
    Tree,
    Player,
    Enemy,
    Door,
    Fireball,
}

impl Hit {
    /// Terrain or border, i.e. not an entity.
    pub fn is_obstacle(self) -> bool {
        matches!(self, Hit::OutOfBorder | Hit::Tree)
    }
}

impl From<EntityKind> for Hit {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Hit::Player,
            EntityKind::Enemy => Hit::Enemy,
            EntityKind::Door => Hit::Door,
            EntityKind::Fireball => Hit::Fireball,
        }
    }
}

/// Classify `target` against the grid and an ordered set of candidates.
/// Retired candidates never match.
pub fn classify<'a, I>(grid: &Grid, target: Pos, candidates: I) -> Option<Hit>
where
    I: IntoIterator<Item = &'a Entity>,
{
    if !grid.in_bounds(target) {
        return Some(Hit::OutOfBorder);
    }
    if grid.is_blocking(target) {
        return Some(Hit::Tree);
    }
    candidates
        .into_iter()
        .find(|e| e.occupies(target))
        .map(|e| e.kind.into())
}
