/// The step function: advances the world by one tick.
///
/// Processing order (fixed, later stages see earlier stages' results):
///   1. Clear explosions
///   2. Enemy movement (may end the tick: enemy catches player)
///   3. Fireball flight
///   4. Command: fire a new fireball, or pick the player's candidate cell
///   5. Player move resolution (skipped after firing)
///
/// Rendering is the caller's job once `step` returns.
///
/// Collision queries go through `collision::classify`: border and terrain
/// first, then the candidate entities in the order each stage lists them.

use rand::Rng;

use crate::domain::collision::{classify, Hit};
use crate::domain::entity::{Command, Dir, Entity, FIRE_DIR};
use super::event::GameEvent;
use super::world::{idle_probability, Phase, World};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Continue,
    GameOver,
    LevelPassed,
}

impl From<Phase> for Outcome {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Playing => Outcome::Continue,
            Phase::GameOver => Outcome::GameOver,
            Phase::LevelPassed => Outcome::LevelPassed,
        }
    }
}

/// Result of one `step` call.
#[derive(Clone, Debug)]
pub struct Tick {
    pub outcome: Outcome,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Run one tick. Once the world has reached a terminal phase this is a
/// no-op that keeps reporting the same outcome.
pub fn step<R: Rng + ?Sized>(world: &mut World, command: Option<Command>, rng: &mut R) -> Tick {
    if world.is_over() {
        return Tick { outcome: world.phase.into(), events: vec![] };
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.explosions.clear();

    if resolve_enemies(world, rng, &mut events) {
        world.phase = Phase::GameOver;
        return Tick { outcome: Outcome::GameOver, events };
    }

    resolve_fireballs(world, &mut events);

    let dir = match command {
        Some(Command::Fire) => {
            launch_fireball(world, &mut events);
            return Tick { outcome: Outcome::Continue, events };
        }
        Some(Command::Move(dir)) => Some(dir),
        None => None,
    };

    let outcome = resolve_player(world, dir, &mut events);
    match outcome {
        Outcome::GameOver => world.phase = Phase::GameOver,
        Outcome::LevelPassed => world.phase = Phase::LevelPassed,
        Outcome::Continue => {}
    }
    Tick { outcome, events }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Move every active enemy in collection order. Returns true if one of
/// them walked into the player.
fn resolve_enemies<R: Rng + ?Sized>(world: &mut World, rng: &mut R, events: &mut Vec<GameEvent>) -> bool {
    // the field is public; never hand gen_bool a NaN
    let idle_chance = idle_probability(world.enemy_idle_chance);

    for i in 0..world.enemies.len() {
        if !world.enemies[i].is_active() { continue; }
        if rng.gen_bool(idle_chance) { continue; }

        let dir = Dir::ALL[rng.gen_range(0..Dir::ALL.len())];
        let to = world.enemies[i].pos.step(dir);

        // fireballs first, then door, then player
        let hit = classify(
            &world.grid,
            to,
            world.fireballs.iter().chain([&world.door, &world.player]),
        );

        match hit {
            Some(Hit::Player) => {
                events.push(GameEvent::PlayerCaught { at: to });
                return true;
            }
            Some(Hit::Fireball) => {
                world.enemies[i].retire();
                events.push(GameEvent::EnemyBurned { index: i, at: to });
            }
            // border, tree, door: the move is cancelled
            Some(_) => {}
            None => {
                world.enemies[i].pos = to;
                events.push(GameEvent::EnemyMoved { index: i, to });
            }
        }
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Fireballs
// ══════════════════════════════════════════════════════════════

fn resolve_fireballs(world: &mut World, events: &mut Vec<GameEvent>) {
    for i in 0..world.fireballs.len() {
        let fireball = &world.fireballs[i];
        if !fireball.is_active() { continue; }
        let Some(heading) = fireball.heading else { continue };

        let from = fireball.pos;
        let to = from.step(heading);

        // enemies first, then door
        let hit = classify(
            &world.grid,
            to,
            world.enemies.iter().chain([&world.door]),
        );

        match hit {
            Some(Hit::Door | Hit::Tree | Hit::OutOfBorder) => {
                world.explosions.push(from);
                world.fireballs[i].retire();
                events.push(GameEvent::Explosion { at: from });
            }
            Some(Hit::Enemy) => {
                // kills everything on the cell and keeps flying
                for index in world.retire_enemies_at(to) {
                    events.push(GameEvent::EnemyShot { index, at: to });
                }
                world.fireballs[i].pos = to;
            }
            _ => {
                world.fireballs[i].pos = to;
            }
        }
    }
}

/// Spawn a fireball on the player and advance it one cell right away.
///
/// Anything in the way of that first step (door, tree, border) pops the
/// shot on the player's own cell and no fireball is created.
fn launch_fireball(world: &mut World, events: &mut Vec<GameEvent>) {
    let origin = world.player.pos;
    let mut fireball = Entity::fireball(origin, FIRE_DIR);
    fireball.pos = origin.step(FIRE_DIR);

    if classify(&world.grid, fireball.pos, [&world.door]).is_some() {
        world.explosions.push(origin);
        events.push(GameEvent::FireballFizzled { at: origin });
        return;
    }

    let at = fireball.pos;
    world.fireballs.push(fireball);
    events.push(GameEvent::FireballLaunched { at });
    for index in world.retire_enemies_at(at) {
        events.push(GameEvent::EnemyShot { index, at });
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut World, dir: Option<Dir>, events: &mut Vec<GameEvent>) -> Outcome {
    let Some(dir) = dir else { return Outcome::Continue };
    let to = world.player.pos.step(dir);

    // enemies first, then door
    let hit = classify(
        &world.grid,
        to,
        world.enemies.iter().chain([&world.door]),
    );

    match hit {
        Some(Hit::Door) => {
            events.push(GameEvent::LevelPassed);
            Outcome::LevelPassed
        }
        Some(Hit::Enemy) => {
            events.push(GameEvent::PlayerCaught { at: to });
            Outcome::GameOver
        }
        Some(h) if h.is_obstacle() => {
            events.push(GameEvent::PlayerBlocked { at: world.player.pos });
            Outcome::Continue
        }
        _ => {
            world.player = Entity::player(to);
            events.push(GameEvent::PlayerMoved { to });
            Outcome::Continue
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::domain::entity::Pos;
    use crate::domain::grid::tests::grid_from;

    /// Every roll is zero: an enemy that moves always picks `Dir::ALL[0]` (Up).
    fn always_up() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Build a world from a diagram.
    /// Legend: 't'=Tree 'p'=Player 'd'=Door 'e'=Enemy 'f'=Fireball heading Up
    fn world_from(rows: &[&str], idle_chance: f64) -> World {
        let grid = grid_from(rows);
        let mut player = None;
        let mut door = None;
        let mut enemies = vec![];
        let mut fireballs = vec![];
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                let pos = Pos::new(r as i32, c as i32);
                match ch {
                    'p' => player = Some(Entity::player(pos)),
                    'd' => door = Some(Entity::door(pos)),
                    'e' => enemies.push(Entity::enemy(pos)),
                    'f' => fireballs.push(Entity::fireball(pos, Dir::Up)),
                    _ => {}
                }
            }
        }
        let mut w = World::new(grid, player.unwrap(), door.unwrap(), enemies)
            .with_enemy_idle_chance(idle_chance);
        w.fireballs = fireballs;
        w
    }

    const STILL: f64 = 1.0;
    const RESTLESS: f64 = 0.0;

    // ── Win / lose ──

    #[test]
    fn walking_into_door_passes_level() {
        let mut w = world_from(&[
            ".....",
            ".....",
            "...pd",
        ], STILL);
        assert_eq!(w.player.pos, Pos::new(2, 3));
        let tick = step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::LevelPassed);
        assert_eq!(w.phase, Phase::LevelPassed);
        assert!(tick.events.contains(&GameEvent::LevelPassed));
        assert!(!tick.events.iter().any(|e| matches!(e, GameEvent::PlayerCaught { .. })));
    }

    #[test]
    fn enemy_catching_player_ends_tick_before_input() {
        let mut w = world_from(&[
            "...",
            ".pd",
            ".e.",
        ], RESTLESS);
        // the key would win the level if the player step ever ran
        let tick = step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::GameOver);
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(w.player.pos, Pos::new(1, 1));
        assert!(!tick.events.contains(&GameEvent::LevelPassed));
        assert_eq!(tick.events.last(), Some(&GameEvent::PlayerCaught { at: Pos::new(1, 1) }));
    }

    #[test]
    fn enemy_catch_skips_fireball_stage() {
        let mut w = world_from(&[
            "d...",
            ".p.f",
            ".e..",
        ], RESTLESS);
        step(&mut w, None, &mut always_up());
        assert_eq!(w.fireballs[0].pos, Pos::new(1, 3));
        assert!(w.fireballs[0].is_active());
    }

    #[test]
    fn walking_into_enemy_is_game_over() {
        let mut w = world_from(&[
            "....",
            ".pe.",
            "...d",
        ], STILL);
        let tick = step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::GameOver);
        assert_eq!(w.player.pos, Pos::new(1, 1));
    }

    #[test]
    fn finished_world_does_not_advance() {
        let mut w = world_from(&["pd"], STILL);
        step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        let before = w.tick;
        let tick = step(&mut w, Some(Command::Move(Dir::Left)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::LevelPassed);
        assert!(tick.events.is_empty());
        assert_eq!(w.tick, before);
    }

    // ── Player movement ──

    #[test]
    fn player_moves_into_open_cell() {
        let mut w = world_from(&["p..d"], STILL);
        let tick = step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::Continue);
        assert_eq!(w.player.pos, Pos::new(0, 1));
        assert!(tick.events.contains(&GameEvent::PlayerMoved { to: Pos::new(0, 1) }));
    }

    #[test]
    fn tree_blocks_player() {
        let mut w = world_from(&["pt.d"], STILL);
        let tick = step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::Continue);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert!(tick.events.contains(&GameEvent::PlayerBlocked { at: Pos::new(0, 0) }));
    }

    #[test]
    fn border_blocks_player() {
        let mut w = world_from(&["p..d"], STILL);
        for dir in [Dir::Up, Dir::Left, Dir::Down] {
            let tick = step(&mut w, Some(Command::Move(dir)), &mut always_up());
            assert_eq!(tick.outcome, Outcome::Continue);
            assert_eq!(w.player.pos, Pos::new(0, 0));
        }
    }

    #[test]
    fn no_command_leaves_player_in_place() {
        let mut w = world_from(&["p..d"], STILL);
        let tick = step(&mut w, None, &mut always_up());
        assert_eq!(tick.outcome, Outcome::Continue);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert!(tick.events.is_empty());
    }

    #[test]
    fn player_walks_through_fireballs() {
        let mut w = world_from(&[
            "...",
            "p..",
            ".fd",
        ], STILL);
        // fireball flies up to (1,1), then the player steps onto it
        let tick = step(&mut w, Some(Command::Move(Dir::Right)), &mut always_up());
        assert_eq!(tick.outcome, Outcome::Continue);
        assert_eq!(w.player.pos, Pos::new(1, 1));
        assert_eq!(w.fireballs[0].pos, Pos::new(1, 1));
        assert!(w.fireballs[0].is_active());
    }

    // ── Enemies ──

    #[test]
    fn idle_enemies_stay_put() {
        let mut w = world_from(&[
            "...",
            ".e.",
            "p.d",
        ], STILL);
        for _ in 0..20 {
            step(&mut w, None, &mut StdRng::seed_from_u64(7));
        }
        assert_eq!(w.enemies[0].pos, Pos::new(1, 1));
    }

    #[test]
    fn enemy_moves_into_open_cell() {
        let mut w = world_from(&[
            "...",
            ".e.",
            "p.d",
        ], RESTLESS);
        let tick = step(&mut w, None, &mut always_up());
        assert_eq!(w.enemies[0].pos, Pos::new(0, 1));
        assert!(tick.events.contains(&GameEvent::EnemyMoved { index: 0, to: Pos::new(0, 1) }));
    }

    #[test]
    fn tree_border_and_door_cancel_enemy_moves() {
        for rows in [
            &[".t.", ".e.", "p.d"][..],
            &[".e.", "...", "p.d"][..],
            &[".d.", ".e.", "p.."][..],
        ] {
            let mut w = world_from(rows, RESTLESS);
            let start = w.enemies[0].pos;
            let tick = step(&mut w, None, &mut always_up());
            assert_eq!(tick.outcome, Outcome::Continue);
            assert_eq!(w.enemies[0].pos, start);
            assert!(w.enemies[0].is_active());
        }
    }

    #[test]
    fn enemy_walking_into_fireball_is_retired_in_place() {
        let mut w = world_from(&[
            "...",
            ".f.",
            ".e.",
            "p.d",
        ], RESTLESS);
        let tick = step(&mut w, None, &mut always_up());
        assert!(!w.enemies[0].is_active());
        assert_eq!(w.enemies[0].pos, Pos::new(2, 1));
        assert!(tick.events.contains(&GameEvent::EnemyBurned { index: 0, at: Pos::new(1, 1) }));
        // the fireball was not consumed
        assert!(w.fireballs[0].is_active());
        assert_eq!(w.fireballs[0].pos, Pos::new(0, 1));
    }

    #[test]
    fn enemy_retired_this_tick_is_invisible_to_later_fireballs() {
        let mut w = world_from(&[
            "p..d",
            "....",
            ".e..",
            "....",
        ], RESTLESS);
        // fireball heading down, right above the enemy
        w.fireballs.push(Entity::fireball(Pos::new(1, 1), Dir::Down));
        let tick = step(&mut w, None, &mut always_up());
        assert!(!w.enemies[0].is_active());
        // fireball flies onto the retired enemy's cell without "hitting" it
        assert_eq!(w.fireballs[0].pos, Pos::new(2, 1));
        assert!(!tick.events.iter().any(|e| matches!(e, GameEvent::EnemyShot { .. })));
    }

    #[test]
    fn enemies_may_share_a_cell() {
        let mut w = world_from(&[
            "...",
            ".e.",
            "p.d",
        ], RESTLESS);
        w.enemies.push(Entity::enemy(Pos::new(1, 1)));
        step(&mut w, None, &mut always_up());
        assert_eq!(w.enemies[0].pos, Pos::new(0, 1));
        assert_eq!(w.enemies[1].pos, Pos::new(0, 1));
    }

    #[test]
    fn nan_idle_chance_does_not_stall_the_tick() {
        let mut w = world_from(&[
            "...",
            ".e.",
            "p.d",
        ], f64::NAN);
        let tick = step(&mut w, None, &mut StdRng::seed_from_u64(3));
        assert_eq!(tick.outcome, Outcome::Continue);

        // set directly on the public field as well
        w.enemy_idle_chance = f64::NAN;
        step(&mut w, None, &mut StdRng::seed_from_u64(4));
        assert_eq!(w.tick, 2);
    }

    // ── Fireballs ──

    #[test]
    fn fireball_hitting_wall_explodes_at_pre_move_position() {
        let mut w = world_from(&[
            ".t.",
            ".f.",
            "p.d",
        ], STILL);
        let tick = step(&mut w, None, &mut always_up());
        assert_eq!(w.explosions, vec![Pos::new(1, 1)]);
        assert!(!w.fireballs[0].is_active());
        assert_eq!(w.fireballs[0].pos, Pos::new(1, 1));
        assert_eq!(tick.events, vec![GameEvent::Explosion { at: Pos::new(1, 1) }]);
    }

    #[test]
    fn fireball_leaving_the_map_explodes() {
        let mut w = world_from(&[
            ".f.",
            "p.d",
        ], STILL);
        step(&mut w, None, &mut always_up());
        assert_eq!(w.explosions, vec![Pos::new(0, 1)]);
        assert!(!w.fireballs[0].is_active());
    }

    #[test]
    fn fireball_hitting_door_explodes() {
        let mut w = world_from(&[
            ".d.",
            ".f.",
            "p..",
        ], STILL);
        step(&mut w, None, &mut always_up());
        assert_eq!(w.explosions, vec![Pos::new(1, 1)]);
        assert!(!w.fireballs[0].is_active());
    }

    #[test]
    fn explosions_last_one_tick() {
        let mut w = world_from(&[
            ".t.",
            ".f.",
            "p.d",
        ], STILL);
        step(&mut w, None, &mut always_up());
        assert_eq!(w.explosions.len(), 1);
        let tick = step(&mut w, None, &mut always_up());
        assert!(w.explosions.is_empty());
        assert!(tick.events.is_empty());
    }

    #[test]
    fn fireball_kills_every_coincident_enemy_and_flies_on() {
        let mut w = world_from(&[
            ".....",
            ".....",
            ".e...",
            ".f...",
            "p...d",
        ], STILL);
        w.enemies.push(Entity::enemy(Pos::new(2, 1)));

        let tick = step(&mut w, None, &mut always_up());
        assert_eq!(w.live_enemies(), 0);
        assert!(w.fireballs[0].is_active());
        assert_eq!(w.fireballs[0].pos, Pos::new(2, 1));
        let shot = tick.events.iter()
            .filter(|e| matches!(e, GameEvent::EnemyShot { .. }))
            .count();
        assert_eq!(shot, 2);

        step(&mut w, None, &mut always_up());
        assert_eq!(w.fireballs[0].pos, Pos::new(1, 1));
    }

    #[test]
    fn fireball_over_open_ground_keeps_flying() {
        let mut w = world_from(&[
            "...",
            "...",
            ".f.",
            "p.d",
        ], STILL);
        step(&mut w, None, &mut always_up());
        assert_eq!(w.fireballs[0].pos, Pos::new(1, 1));
        step(&mut w, None, &mut always_up());
        assert_eq!(w.fireballs[0].pos, Pos::new(0, 1));
        step(&mut w, None, &mut always_up());
        assert!(!w.fireballs[0].is_active());
        assert_eq!(w.explosions, vec![Pos::new(0, 1)]);
    }

    // ── Firing ──

    #[test]
    fn firing_at_adjacent_door_fizzles_in_place() {
        let mut w = world_from(&[
            ".d.",
            ".p.",
            "...",
        ], STILL);
        let tick = step(&mut w, Some(Command::Fire), &mut always_up());
        assert_eq!(tick.outcome, Outcome::Continue);
        assert_eq!(w.explosions, vec![Pos::new(1, 1)]);
        assert!(w.fireballs.is_empty());
        assert_eq!(w.player.pos, Pos::new(1, 1));
        assert!(tick.events.contains(&GameEvent::FireballFizzled { at: Pos::new(1, 1) }));
    }

    #[test]
    fn firing_into_tree_or_border_fizzles_too() {
        for rows in [&[".t.", ".p.", "..d"][..], &[".p.", "..d"][..]] {
            let mut w = world_from(rows, STILL);
            let origin = w.player.pos;
            step(&mut w, Some(Command::Fire), &mut always_up());
            assert_eq!(w.explosions, vec![origin]);
            assert!(w.fireballs.is_empty());
        }
    }

    #[test]
    fn fired_fireball_starts_one_cell_ahead() {
        let mut w = world_from(&[
            "...",
            "...",
            ".p.",
            "..d",
        ], STILL);
        let tick = step(&mut w, Some(Command::Fire), &mut always_up());
        assert_eq!(w.fireballs.len(), 1);
        assert_eq!(w.fireballs[0].pos, Pos::new(1, 1));
        assert_eq!(w.fireballs[0].heading, Some(FIRE_DIR));
        assert!(tick.events.contains(&GameEvent::FireballLaunched { at: Pos::new(1, 1) }));
        // firing replaces the move
        assert_eq!(w.player.pos, Pos::new(2, 1));
    }

    #[test]
    fn point_blank_shot_kills_enemies_on_spawn_cell() {
        let mut w = world_from(&[
            "...",
            ".e.",
            ".p.",
            "..d",
        ], STILL);
        w.enemies.push(Entity::enemy(Pos::new(1, 1)));
        let tick = step(&mut w, Some(Command::Fire), &mut always_up());
        assert_eq!(w.live_enemies(), 0);
        assert!(w.fireballs[0].is_active());
        let shot: Vec<_> = tick.events.iter()
            .filter_map(|e| match e {
                GameEvent::EnemyShot { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(shot, vec![0, 1]);
    }

    // ── Invariants over random play ──

    #[test]
    fn random_play_keeps_invariants() {
        let rows = [
            "..t.....e.",
            ".e..t.....",
            "....e...t.",
            "t.....e...",
            "...p.....d",
        ];
        let commands = [
            None,
            Some(Command::Fire),
            Some(Command::Move(Dir::Up)),
            Some(Command::Move(Dir::Down)),
            Some(Command::Move(Dir::Left)),
            Some(Command::Move(Dir::Right)),
        ];

        for seed in 0..40u64 {
            let mut w = world_from(&rows, 0.5);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut live = w.live_enemies();

            for _ in 0..200 {
                let cmd = commands[rng.gen_range(0..commands.len())];
                let tick = step(&mut w, cmd, &mut rng);

                // explosions are exactly this tick's markers
                let produced = tick.events.iter()
                    .filter(|e| matches!(e, GameEvent::Explosion { .. } | GameEvent::FireballFizzled { .. }))
                    .count();
                assert_eq!(w.explosions.len(), produced);

                // retirement is permanent
                let now = w.live_enemies();
                assert!(now <= live);
                live = now;

                // active entities stay on open, in-bounds cells
                for e in w.enemies.iter().chain(&w.fireballs).filter(|e| e.is_active()) {
                    assert!(w.grid.in_bounds(e.pos));
                    assert!(!w.grid.is_blocking(e.pos));
                }
                assert!(w.grid.in_bounds(w.player.pos));
                assert!(!w.grid.is_blocking(w.player.pos));

                if tick.outcome != Outcome::Continue {
                    break;
                }
            }
        }
    }
}
