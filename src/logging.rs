/// File-backed tracing.
///
/// The game owns the terminal, so log lines can never go to stdout or
/// stderr. A subscriber is installed only when `general.log_file` is set;
/// otherwise every event is dropped. Filter with `RUST_LOG` (default `info`).

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;

pub fn init(config: &GameConfig) -> io::Result<()> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(());
    };
    init_file(path)
}

fn init_file(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // a second init (tests) leaves the first subscriber in place
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(())
}
