//! Local terminal handling.
//!
//! The session needs byte-exact keystrokes (Ctrl+C included), so stdin is put
//! into raw mode for its lifetime and restored afterwards.

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::os::fd::AsFd;

/// Enter and leave raw mode around a session
pub trait TerminalMode {
    fn enter_raw(&mut self) -> io::Result<()>;

    /// Put the terminal back the way it was. Calling this more than once,
    /// or without a prior [`enter_raw`](Self::enter_raw), is a no-op.
    fn restore(&mut self) -> io::Result<()>;
}

/// Raw mode on the process's controlling terminal, via crossterm.
///
/// Does nothing when stdin is not a terminal (piped input). Raw mode is also
/// left on drop, so a panic does not strand the user in a raw terminal.
#[derive(Debug, Default)]
pub struct RawTerminal {
    active: bool,
}

impl RawTerminal {
    pub fn new() -> Self {
        Self { active: false }
    }
}

impl TerminalMode for RawTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        if !io::stdin().is_terminal() {
            tracing::debug!("stdin is not a terminal, leaving mode unchanged");
            return Ok(());
        }
        enable_raw_mode()?;
        self.active = true;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
        }
    }
}

/// Unbuffered handle on stdin.
///
/// `std::io::Stdin` reads ahead into its own buffer, which hides pending bytes
/// from readiness polling. A duplicated descriptor reads exactly what is asked.
pub fn stdin_handle() -> io::Result<File> {
    let fd = io::stdin().as_fd().try_clone_to_owned()?;
    Ok(File::from(fd))
}
