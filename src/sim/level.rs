/// Level loader.
///
/// ## Sources (priority order):
///   1. The configured level file (`map.txt` by default)
///   2. Built-in embedded level, when that file does not exist
///
/// ## Format:
///   One line per grid row, one character per column.
///
/// ## Tile legend:
///   't' = Tree (blocking)      'p' = Player spawn (exactly one)
///   'e' = Enemy spawn          'd' = Door (exactly one)
///   anything else = open ground
///
/// Spawn cells are open ground once their entity has been placed.
/// Short rows are padded with open ground; trailing blank lines are dropped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::entity::{Entity, Pos};
use crate::domain::grid::Grid;
use crate::domain::tile::Tile;
use crate::sim::world::World;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level has no rows")]
    Empty,
    #[error("level has no player spawn ('p')")]
    MissingPlayer,
    #[error("level has more than one player spawn: {first:?} and {second:?}")]
    DuplicatePlayer { first: Pos, second: Pos },
    #[error("level has no door ('d')")]
    MissingDoor,
    #[error("level has more than one door: {first:?} and {second:?}")]
    DuplicateDoor { first: Pos, second: Pos },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured level, falling back to the embedded one when the
/// file is absent. Idle chance is taken from the speed settings.
pub fn load_level(config: &GameConfig) -> Result<World, LevelError> {
    let world = match read_level_file(&config.level_file)? {
        Some(text) => {
            info!(path = %config.level_file.display(), "loading level file");
            parse_level(&text)?
        }
        None => {
            warn!(path = %config.level_file.display(), "level file not found, using built-in level");
            parse_level(EMBEDDED_LEVEL)?
        }
    };
    Ok(world.with_enemy_idle_chance(config.speed.enemy_idle_chance))
}

/// Parse level text into a fresh world.
pub fn parse_level(text: &str) -> Result<World, LevelError> {
    let mut rows: Vec<&str> = text.lines().collect();
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let mut tiles = Vec::with_capacity(rows.len());
    let mut player: Option<Pos> = None;
    let mut door: Option<Pos> = None;
    let mut enemies = vec![];

    for (r, row) in rows.iter().enumerate() {
        let mut line = Vec::with_capacity(row.len());
        for (c, ch) in row.chars().enumerate() {
            let pos = Pos::new(r as i32, c as i32);
            let tile = match ch {
                't' => Tile::Tree,
                'e' => {
                    enemies.push(Entity::enemy(pos));
                    Tile::Open
                }
                'p' => {
                    if let Some(first) = player {
                        return Err(LevelError::DuplicatePlayer { first, second: pos });
                    }
                    player = Some(pos);
                    Tile::Open
                }
                'd' => {
                    if let Some(first) = door {
                        return Err(LevelError::DuplicateDoor { first, second: pos });
                    }
                    door = Some(pos);
                    Tile::Open
                }
                _ => Tile::Open,
            };
            line.push(tile);
        }
        tiles.push(line);
    }

    let player = player.ok_or(LevelError::MissingPlayer)?;
    let door = door.ok_or(LevelError::MissingDoor)?;

    Ok(World::new(
        Grid::new(tiles),
        Entity::player(player),
        Entity::door(door),
        enemies,
    ))
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

/// `Ok(None)` when the file does not exist; other I/O errors propagate.
fn read_level_file(path: &Path) -> Result<Option<String>, LevelError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LevelError::Io { path: path.to_path_buf(), source }),
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback level
// ══════════════════════════════════════════════════════════════

const EMBEDDED_LEVEL: &str = "\
tttttttttttttttttttt
t.....e......t....dt
t.tttt.ttttt.t.tt..t
t.t..........t..t..t
t.t.tttt.ttt.tt.t.et
t...t..e...t....t..t
tt.tt.tttt.tttt.tt.t
t......t..e.....t..t
t.tttt.t.tttttt.t.tt
t.t..e.t......t....t
t.t.tttttttt..tttt.t
tp.................t
tttttttttttttttttttt
";
