/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub keys: KeyConfig,
    pub gamepad: GamepadConfig,
    pub level_file: PathBuf,
    /// Where tracing output goes. None = logging off.
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub enemy_idle_chance: f64, // probability an enemy skips its move, 0..=1
}

/// Keyboard bindings as key names: single characters, or
/// "Up"/"Down"/"Left"/"Right"/"Space"/"Enter".
#[derive(Clone, Debug)]
pub struct KeyConfig {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub fire: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub fire: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    keys: TomlKeys,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_enemy_idle")]
    enemy_idle_chance: f64,
}

#[derive(Deserialize, Debug)]
struct TomlKeys {
    #[serde(default = "default_up")]
    up: Vec<String>,
    #[serde(default = "default_down")]
    down: Vec<String>,
    #[serde(default = "default_left")]
    left: Vec<String>,
    #[serde(default = "default_right")]
    right: Vec<String>,
    #[serde(default = "default_fire")]
    fire: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_fire")]
    fire: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_level_file")]
    level_file: String,
    #[serde(default)]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 500 }
fn default_enemy_idle() -> f64 { 0.8 }

fn default_up() -> Vec<String> { vec!["w".into(), "Up".into()] }
fn default_down() -> Vec<String> { vec!["s".into(), "Down".into()] }
fn default_left() -> Vec<String> { vec!["a".into(), "Left".into()] }
fn default_right() -> Vec<String> { vec!["d".into(), "Right".into()] }
fn default_fire() -> Vec<String> { vec!["Space".into()] }

fn default_pad_fire() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }
fn default_level_file() -> String { "map.txt".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            enemy_idle_chance: default_enemy_idle(),
        }
    }
}

impl Default for TomlKeys {
    fn default() -> Self {
        TomlKeys {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
            fire: default_fire(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            fire: default_pad_fire(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_file: default_level_file(),
            log_file: String::new(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no file search).
    #[cfg(test)]
    fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        Ok(GameConfig::from_toml(toml::from_str(text)?, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let idle = cfg.speed.enemy_idle_chance;
        let enemy_idle_chance = if idle.is_finite() {
            idle.clamp(0.0, 1.0)
        } else {
            default_enemy_idle()
        };

        let log_file = if cfg.general.log_file.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(cfg.general.log_file.trim()))
        };

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: cfg.speed.tick_rate_ms.max(1),
                enemy_idle_chance,
            },
            keys: KeyConfig {
                up: cfg.keys.up,
                down: cfg.keys.down,
                left: cfg.keys.left,
                right: cfg.keys.right,
                fire: cfg.keys.fire,
            },
            gamepad: GamepadConfig {
                fire: cfg.gamepad.fire,
                quit: cfg.gamepad.quit,
            },
            level_file: resolve_level_file(&cfg.general.level_file, search_dirs),
            log_file,
        }
    }
}

/// Absolute paths are used as-is. Relative paths are searched in the
/// candidate dirs; if none has the file, the path stays relative to CWD.
fn resolve_level_file(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (symlinks resolved)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    // logging is not up yet; the terminal is still ours to write to
                    eprintln!("Warning: config.toml parse error: {e}");
                    eprintln!("Using default settings.");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                eprintln!("Warning: could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}
