use std::io::{self, IsTerminal};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Holds the terminal in raw mode and restores it on drop.
///
/// Raw mode is only entered when standard input is a terminal; with piped
/// input the guard is inert.
#[derive(Debug)]
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    /// Switches the terminal to raw mode when stdin is interactive.
    ///
    /// # Errors
    ///
    /// Returns the terminal error when raw mode cannot be entered.
    pub fn enter() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            log::debug!("stdin is not a terminal; leaving line discipline untouched");
            return Ok(Self::inactive());
        }
        enable_raw_mode()?;
        log::debug!("terminal switched to raw mode");
        Ok(Self { active: true })
    }

    /// A guard that restores nothing.
    #[must_use]
    pub const fn inactive() -> Self {
        Self { active: false }
    }

    /// True while raw mode is held by this guard.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = disable_raw_mode() {
            log::warn!("failed to restore terminal mode: {err}");
        }
    }
}
