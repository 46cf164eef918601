/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use crate::domain::entity::Pos;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    EnemyMoved { index: usize, to: Pos },
    /// Enemy walked into a fireball.
    EnemyBurned { index: usize, at: Pos },
    /// Fireball flew into an enemy.
    EnemyShot { index: usize, at: Pos },
    FireballLaunched { at: Pos },
    /// Fire pressed with no room to launch; the shot pops on the player.
    FireballFizzled { at: Pos },
    Explosion { at: Pos },
    PlayerMoved { to: Pos },
    PlayerBlocked { at: Pos },
    PlayerCaught { at: Pos },
    LevelPassed,
}
