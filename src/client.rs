//! Session lifecycle: banner, raw mode, the run loop, and the one cleanup
//! path every ending goes through.

use crate::bridge::{self, Session, Termination};
use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::terminal::{self, RawTerminal, TerminalMode};

use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;

pub const CLOSURE_NOTICE: &str = "Connection closed.";

/// Lines shown before connecting
pub fn write_banner<W: Write>(out: &mut W, config: &ClientConfig) -> io::Result<()> {
    writeln!(out, "Connecting to {}...", config.server.target())?;
    writeln!(out, "Use Ctrl+C to disconnect")?;
    writeln!(out)?;
    out.flush()
}

/// Report how the client ended: the error line when there was one, then the
/// closure notice.
///
/// A failed connect never entered raw mode, so its error starts on the
/// current line. Lines end in CRLF because the terminal may have just left
/// raw mode.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &ClientResult<Termination>) -> io::Result<()> {
    match outcome {
        Err(err @ ClientError::Connection { .. }) => write!(out, "Error: {err}\r\n")?,
        Err(err) => write!(out, "\r\nError: {err}\r\n")?,
        Ok(_) => write!(out, "\r\n")?,
    }
    write!(out, "{CLOSURE_NOTICE}\r\n")?;
    out.flush()
}

/// Run a connected session inside raw mode, then clean up.
///
/// The socket is closed and the terminal restored exactly once, whatever
/// ended the session. A run error takes precedence over a restore error.
pub fn run_session<I, O, T>(
    session: &mut Session<I, O>,
    terminal: &mut T,
) -> ClientResult<Termination>
where
    I: Read + AsRawFd,
    O: Write,
    T: TerminalMode,
{
    let result = terminal
        .enter_raw()
        .map_err(ClientError::Terminal)
        .and_then(|()| session.run());

    session.close();
    let restored = terminal.restore().map_err(ClientError::Terminal);

    let stats = session.stats();
    match &result {
        Ok(reason) => tracing::info!(
            ?reason,
            connected_at = %stats.connected_at,
            elapsed_secs = stats.elapsed().as_secs_f64(),
            bytes_sent = stats.bytes_sent,
            bytes_displayed = stats.bytes_displayed,
            negotiations = stats.negotiations_received,
            replies = stats.replies_sent,
            "session finished"
        ),
        Err(e) => tracing::error!(error = %e, bytes_sent = stats.bytes_sent, "session failed"),
    }

    let termination = result?;
    restored?;
    Ok(termination)
}

/// Connect to the configured server and bridge it to stdin/stdout.
pub fn run(config: &ClientConfig) -> ClientResult<Termination> {
    let stream = bridge::connect(&config.server)?;

    let input = terminal::stdin_handle()?;
    let mut session = Session::new(stream, input, io::stdout(), config.session.clone())?;
    session.watch_signals()?;

    let mut terminal = RawTerminal::new();
    run_session(&mut session, &mut terminal)
}
