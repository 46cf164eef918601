/// World: the complete state of a running game.
///
/// ## Layers
///
///   - `grid`: terrain as loaded. **Never mutated** after load.
///   - `door`: stationary, set once at load.
///   - `player`: replaced by its committed candidate each tick.
///   - `enemies`: retired in place, never removed mid-game.
///   - `fireballs`: appended on fire, retired in place.
///   - `explosions`: render-only markers, rebuilt every tick.
///
/// Queries that feed the renderer and the collision resolver go through
/// the `*_at` helpers so retired entities are skipped in one place.

use crate::domain::entity::{Entity, Pos};
use crate::domain::grid::Grid;

pub const DEFAULT_ENEMY_IDLE_CHANCE: f64 = 0.8;

/// Clamp to `0..=1`; NaN and infinities fall back to the default.
pub fn idle_probability(chance: f64) -> f64 {
    if chance.is_finite() {
        chance.clamp(0.0, 1.0)
    } else {
        DEFAULT_ENEMY_IDLE_CHANCE
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
    LevelPassed,
}

#[derive(Clone, Debug)]
pub struct World {
    pub grid: Grid,
    pub player: Entity,
    pub door: Entity,
    pub enemies: Vec<Entity>,
    pub fireballs: Vec<Entity>,
    pub explosions: Vec<Pos>,

    /// Probability that an enemy sits still for a tick.
    pub enemy_idle_chance: f64,

    pub phase: Phase,
    pub tick: u64,
}

impl World {
    pub fn new(grid: Grid, player: Entity, door: Entity, enemies: Vec<Entity>) -> Self {
        World {
            grid,
            player,
            door,
            enemies,
            fireballs: Vec::new(),
            explosions: Vec::new(),
            enemy_idle_chance: DEFAULT_ENEMY_IDLE_CHANCE,
            phase: Phase::Playing,
            tick: 0,
        }
    }

    pub fn with_enemy_idle_chance(mut self, chance: f64) -> Self {
        self.enemy_idle_chance = idle_probability(chance);
        self
    }

    pub fn is_over(&self) -> bool {
        self.phase != Phase::Playing
    }

    // ── Occupancy queries (active entities only) ──

    pub fn explosion_at(&self, pos: Pos) -> bool {
        self.explosions.contains(&pos)
    }

    pub fn enemy_at(&self, pos: Pos) -> bool {
        self.enemies.iter().any(|e| e.occupies(pos))
    }

    pub fn fireball_at(&self, pos: Pos) -> bool {
        self.fireballs.iter().any(|f| f.occupies(pos))
    }

    pub fn live_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_active()).count()
    }

    pub fn live_fireballs(&self) -> usize {
        self.fireballs.iter().filter(|f| f.is_active()).count()
    }

    /// Retire every active enemy on `pos`. Returns the indices hit.
    pub fn retire_enemies_at(&mut self, pos: Pos) -> Vec<usize> {
        let mut hit = Vec::new();
        for (i, enemy) in self.enemies.iter_mut().enumerate() {
            if enemy.occupies(pos) {
                enemy.retire();
                hit.push(i);
            }
        }
        hit
    }
}
