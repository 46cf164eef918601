/// Keyboard input.
///
/// One action per tick: every pending terminal event is drained, and the
/// first key press since the previous tick decides the command. Later
/// presses in the same window are dropped, like a single non-blocking read.
/// Quit (q / Esc / Ctrl+C) wins wherever it appears in the window, since
/// raw mode swallows SIGINT.
///
/// Bindings come from `[keys]` in config.toml.

use std::io;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::KeyConfig;
use crate::domain::entity::{Command, Dir};
use super::gamepad::GamepadState;

/// What the frame loop should do with this tick's input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Play(Command),
    Quit,
}

/// Anything that can hand the frame loop at most one action per tick.
pub trait InputSource {
    fn poll_action(&mut self) -> io::Result<Option<Action>>;
}

// ── Key bindings ──

pub struct Keymap {
    bindings: Vec<(KeyCode, Command)>,
}

impl Keymap {
    pub fn from_config(cfg: &KeyConfig) -> Self {
        let mut bindings = vec![];
        let groups: [(&[String], Command); 5] = [
            (&cfg.up, Command::Move(Dir::Up)),
            (&cfg.down, Command::Move(Dir::Down)),
            (&cfg.left, Command::Move(Dir::Left)),
            (&cfg.right, Command::Move(Dir::Right)),
            (&cfg.fire, Command::Fire),
        ];
        for (names, command) in groups {
            for code in names.iter().filter_map(|n| parse_key(n)) {
                // first binding of a key wins
                if !bindings.iter().any(|(c, _)| *c == code) {
                    bindings.push((code, command));
                }
            }
        }
        Keymap { bindings }
    }

    pub fn lookup(&self, code: KeyCode) -> Option<Command> {
        let code = match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        self.bindings.iter().find(|(c, _)| *c == code).map(|(_, cmd)| *cmd)
    }
}

/// Parse a key name from config. Single characters are case-insensitive.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c.to_ascii_lowercase()));
    }
    match name.to_ascii_lowercase().as_str() {
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "space" => Some(KeyCode::Char(' ')),
        "enter" => Some(KeyCode::Enter),
        "tab" => Some(KeyCode::Tab),
        _ => None,
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Pick this tick's action from the keys pressed since the last tick.
pub fn first_action<I>(keys: I, keymap: &Keymap) -> Option<Action>
where
    I: IntoIterator<Item = KeyEvent>,
{
    let mut first: Option<KeyEvent> = None;
    for key in keys {
        if key.kind == KeyEventKind::Release { continue; }
        if is_quit(&key) {
            return Some(Action::Quit);
        }
        if first.is_none() {
            first = Some(key);
        }
    }
    first
        .and_then(|k| keymap.lookup(k.code))
        .map(Action::Play)
}

// ── Terminal keyboard ──

pub struct KeyboardInput {
    keymap: Keymap,
    pending: Vec<KeyEvent>,
}

impl KeyboardInput {
    pub fn new(keymap: Keymap) -> Self {
        KeyboardInput { keymap, pending: Vec::with_capacity(8) }
    }

    /// Read all available events without blocking.
    fn drain_events(&mut self) -> io::Result<()> {
        self.pending.clear();
        while poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.pending.push(key);
            }
        }
        Ok(())
    }
}

impl InputSource for KeyboardInput {
    fn poll_action(&mut self) -> io::Result<Option<Action>> {
        self.drain_events()?;
        Ok(first_action(self.pending.drain(..), &self.keymap))
    }
}

// ── Keyboard + gamepad ──

/// Keyboard first; the gamepad only speaks when the keyboard had nothing.
/// Quit from either device wins.
pub struct Controls {
    keyboard: KeyboardInput,
    gamepad: GamepadState,
}

impl Controls {
    pub fn new(keyboard: KeyboardInput, gamepad: GamepadState) -> Self {
        Controls { keyboard, gamepad }
    }
}

impl InputSource for Controls {
    fn poll_action(&mut self) -> io::Result<Option<Action>> {
        self.gamepad.update();
        let from_pad = self.gamepad.take_action();
        let from_keys = self.keyboard.poll_action()?;
        Ok(merge_actions(from_keys, from_pad))
    }
}

/// Combine one tick's keyboard and gamepad actions.
pub fn merge_actions(keys: Option<Action>, pad: Option<Action>) -> Option<Action> {
    if keys == Some(Action::Quit) || pad == Some(Action::Quit) {
        return Some(Action::Quit);
    }
    keys.or(pad)
}
