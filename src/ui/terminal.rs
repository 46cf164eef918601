/// Scoped terminal ownership.
///
/// `TerminalGuard::acquire` switches to raw mode, the alternate screen and
/// a hidden cursor. Dropping the guard undoes all three, so the terminal is
/// restored on every exit path out of the frame loop, panics included.

use std::io;

use crossterm::{
    cursor, execute,
    style::ResetColor,
    terminal::{self, Clear, ClearType},
};

pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = TerminalGuard { _private: () };
        // from here on a failure still restores raw mode via Drop
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = execute!(
            io::stdout(),
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        ) {
            tracing::error!(?err, "failed to leave alternate screen");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
    }
}
