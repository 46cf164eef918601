/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml (`[gamepad]`).
/// Default mapping:
///   D-pad / Left Stick    →  Move
///   A / X                 →  Fire
///   Select                →  Quit
///
/// Like the keyboard, the pad yields at most one action per tick: the
/// first edge seen since the previous tick. Compiled without the
/// "gamepad" feature, the tracker never reports anything.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::{Command, Dir};
use super::input::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (face, shoulder and meta buttons).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping.
struct ActionMap {
    fire: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            fire: vec![Btn::A, Btn::X],
            quit: vec![Btn::Select],
        }
    }
}

impl ActionMap {
    fn action_for(&self, btn: Btn) -> Option<Action> {
        if self.quit.contains(&btn) {
            Some(Action::Quit)
        } else if self.fire.contains(&btn) {
            Some(Action::Play(Command::Fire))
        } else {
            None
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Stick direction currently past the deadzone (for edge detection).
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_dir: Option<Dir>,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    /// First action seen since the last `take_action`.
    pending: Option<Action>,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            stick_dir: None,
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            pending: None,
            connected,
        }
    }

    /// Load button mapping from config. Empty or unparseable lists keep
    /// the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let fire = parse_list(&cfg.fire);
        if !fire.is_empty() { self.action_map.fire = fire; }
        let quit = parse_list(&cfg.quit);
        if !quit.is_empty() { self.action_map.quit = quit; }
    }

    pub fn update(&mut self) {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    /// Hand over this tick's action, if any, and reset.
    pub fn take_action(&mut self) -> Option<Action> {
        self.pending.take()
    }

    /// Record an action. Quit overrides; otherwise the first one sticks.
    fn offer(&mut self, action: Action) {
        if action == Action::Quit || self.pending.is_none() {
            self.pending = Some(action);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, btn: Btn) {
        if let Some(action) = self.action_map.action_for(btn) {
            self.offer(action);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press_dir(&mut self, dir: Dir) {
        self.offer(Action::Play(Command::Move(dir)));
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    match btn {
                        Button::DPadUp => self.press_dir(Dir::Up),
                        Button::DPadDown => self.press_dir(Dir::Down),
                        Button::DPadLeft => self.press_dir(Dir::Left),
                        Button::DPadRight => self.press_dir(Dir::Right),
                        other => {
                            if let Some(b) = Btn::from_gilrs(other) {
                                self.press(b);
                            }
                        }
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                    self.update_stick();
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                    self.stick_dir = None;
                }
                _ => {}
            }
        }
    }

    /// Turn the analog stick into a digital direction, firing on the edge.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update_stick(&mut self) {
        let dir = stick_direction(self.stick_x, self.stick_y);
        if dir.is_some() && dir != self.stick_dir {
            if let Some(d) = dir {
                self.press_dir(d);
            }
        }
        self.stick_dir = dir;
    }
}

/// Dominant stick axis past the deadzone. Positive Y is up (gilrs).
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<Dir> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    if x.abs() >= y.abs() {
        Some(if x < 0.0 { Dir::Left } else { Dir::Right })
    } else {
        Some(if y > 0.0 { Dir::Up } else { Dir::Down })
    }
}
