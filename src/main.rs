/// Entry point and frame loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::io::Write;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info};

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::load_level;
use sim::step::{self, Outcome};
use sim::world::World;
use ui::gamepad::GamepadState;
use ui::input::{Action, Controls, InputSource, KeyboardInput, Keymap};
use ui::renderer::{Renderer, MSG_DIED, MSG_PASSED};
use ui::sound::{sfx_for_tick, SoundEngine};
use ui::terminal::TerminalGuard;

/// How long the final frame stays up before the terminal is handed back.
const FINAL_HOLD: Duration = Duration::from_millis(1500);

fn main() {
    let config = GameConfig::load();

    if let Err(e) = logging::init(&config) {
        eprintln!("Warning: could not open log file: {e}");
    }

    let mut world = match load_level(&config) {
        Ok(w) => w,
        Err(e) => {
            error!(%e, "level load failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    info!(
        width = world.grid.width(),
        height = world.grid.height(),
        enemies = world.enemies.len(),
        "level ready"
    );

    let mut gamepad = GamepadState::new();
    gamepad.load_button_config(&config.gamepad);
    if gamepad.connected {
        info!("gamepad connected");
    }
    let keyboard = KeyboardInput::new(Keymap::from_config(&config.keys));
    let mut controls = Controls::new(keyboard, gamepad);

    let sound = SoundEngine::new();

    let result = match TerminalGuard::acquire() {
        Ok(_guard) => {
            let mut renderer = Renderer::new();
            let mut rng = rand::thread_rng();
            let result = game_loop(
                &mut world, &mut renderer, &mut controls, &mut rng, sound.as_ref(), &config,
            );
            if matches!(result, Ok(Some(_))) {
                std::thread::sleep(FINAL_HOLD);
            }
            result
            // _guard dropped here: terminal restored before anything is printed
        }
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            std::process::exit(1);
        }
    };

    match result {
        Ok(Some(Outcome::GameOver)) => println!("{MSG_DIED}"),
        Ok(Some(Outcome::LevelPassed)) => println!("{MSG_PASSED}"),
        Ok(_) => println!("Bye!"),
        Err(e) => {
            error!(%e, "frame loop failed");
            eprintln!("Game error: {e}");
            std::process::exit(1);
        }
    }
    println!("Ticks played: {}", world.tick);
}

/// Run until the level ends (`Some(outcome)`) or the player quits (`None`).
fn game_loop<W: Write, R: Rng + ?Sized>(
    world: &mut World,
    renderer: &mut Renderer<W>,
    input: &mut dyn InputSource,
    rng: &mut R,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<Option<Outcome>, Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    renderer.render(world)?;

    loop {
        std::thread::sleep(tick_rate);

        let command = match input.poll_action()? {
            Some(Action::Quit) => {
                info!(tick = world.tick, "player quit");
                return Ok(None);
            }
            Some(Action::Play(cmd)) => Some(cmd),
            None => None,
        };

        let tick = step::step(world, command, rng);
        log_events(world.tick, &tick.events);
        if let Some(sfx) = sound {
            for effect in sfx_for_tick(&tick.events) {
                sfx.play(effect);
            }
        }

        renderer.render(world)?;

        if tick.outcome != Outcome::Continue {
            info!(tick = world.tick, outcome = ?tick.outcome, "level over");
            return Ok(Some(tick.outcome));
        }
    }
}

fn log_events(tick: u64, events: &[GameEvent]) {
    for event in events {
        debug!(tick, ?event);
    }
}
