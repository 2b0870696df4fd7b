//! # Connection Bridge
//!
//! A [`Session`] owns the server socket and the local input, and shuttles
//! bytes between them from a single-threaded readiness loop:
//!
//! ```text
//! local input --------------------------------------------> socket (raw)
//! socket --> Classifier --> payload ----------------------> display
//!                      \--> negotiation --> Policy --> reply --> socket
//! ```
//!
//! Only bytes from the server are interpreted as Telnet. Local input is
//! forwarded as typed, unless the session is configured to escape IAC.
//!
//! The readiness wait is bounded by the poll interval so termination intent
//! (disconnect key, interrupt signal) is always observed promptly.

use crate::config::{ServerConfig, SessionConfig};
use crate::errors::{ClientError, ClientResult};

use jiff::Timestamp;
use mio::net::TcpStream;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_mio::v1_0::Signals;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::thread;
use std::time::{Duration, Instant};
use telnet_negotiation::{Classifier, Negotiation, NegotiationPolicy};

const SOCKET: Token = Token(0);
const LOCAL_INPUT: Token = Token(1);
const SIGNALS: Token = Token(2);

const EVENTS_CAPACITY: usize = 8;

/// Pause between attempts when the socket send buffer is full
const WRITE_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Why a session ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Local input reached end of file
    LocalEof,
    /// The disconnect byte was typed
    DisconnectKey,
    /// The server closed the connection
    PeerClosed,
    /// SIGINT or SIGTERM arrived
    Interrupted,
}

/// Counters kept for the end-of-session summary
#[derive(Debug, Clone, Copy)]
pub struct SessionStats {
    pub connected_at: Timestamp,
    /// Local input bytes written to the socket (after escaping)
    pub bytes_sent: u64,
    /// Payload bytes written to the display
    pub bytes_displayed: u64,
    pub negotiations_received: u64,
    pub replies_sent: u64,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            connected_at: Timestamp::now(),
            bytes_sent: 0,
            bytes_displayed: 0,
            negotiations_received: 0,
            replies_sent: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Timestamp::now()
            .duration_since(self.connected_at)
            .try_into()
            .unwrap_or_default()
    }
}

/// Open a blocking connection to the server.
///
/// Every resolved address is tried in order with the configured timeout.
/// The returned stream has Nagle's algorithm disabled.
pub fn connect(server: &ServerConfig) -> ClientResult<std::net::TcpStream> {
    let target = server.target();
    let connection_error = |source: io::Error| ClientError::Connection {
        target: target.clone(),
        source,
    };

    let addrs = (server.host.as_str(), server.port)
        .to_socket_addrs()
        .map_err(connection_error)?;

    let mut last_error = None;
    for addr in addrs {
        tracing::debug!(%addr, "connecting");
        match std::net::TcpStream::connect_timeout(&addr, server.connect_timeout) {
            Ok(stream) => {
                stream.set_nodelay(true).map_err(connection_error)?;
                tracing::info!(%addr, "connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(connection_error(last_error.unwrap_or_else(|| {
        io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")
    })))
}

/// Write all of `data`, riding out a full send buffer.
///
/// `WouldBlock` is retried until `deadline` passes without progress; a
/// zero-length write or a stalled deadline is reported as
/// [`ClientError::ShortWrite`].
pub fn write_fully<W: Write>(writer: &mut W, data: &[u8], deadline: Duration) -> ClientResult<()> {
    let mut written = 0;
    let mut stalled_since: Option<Instant> = None;

    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => {
                return Err(ClientError::ShortWrite {
                    written,
                    expected: data.len(),
                });
            }
            Ok(n) => {
                written += n;
                stalled_since = None;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                let since = *stalled_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= deadline {
                    return Err(ClientError::ShortWrite {
                        written,
                        expected: data.len(),
                    });
                }
                thread::sleep(WRITE_RETRY_INTERVAL);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn not_connected() -> ClientError {
    ClientError::Io(io::Error::new(ErrorKind::NotConnected, "session is closed"))
}

/// One connection between local input, the display, and a server
///
/// `I` is the local input (stdin in the binary, a socket pair in tests) and
/// `O` is where payload is displayed.
pub struct Session<I, O>
where
    I: Read + AsRawFd,
    O: Write,
{
    socket: Option<TcpStream>,
    input: I,
    display: O,
    poll: Poll,
    events: Events,
    signals: Option<Signals>,
    classifier: Classifier,
    policy: NegotiationPolicy,
    config: SessionConfig,
    local_buffer: Vec<u8>,
    socket_buffer: Vec<u8>,
    payload: Vec<u8>,
    stats: SessionStats,
    termination: Option<Termination>,
}

impl<I, O> Session<I, O>
where
    I: Read + AsRawFd,
    O: Write,
{
    /// Take over a connected stream and register it, with the local input,
    /// for readiness polling.
    pub fn new(
        stream: std::net::TcpStream,
        input: I,
        display: O,
        config: SessionConfig,
    ) -> ClientResult<Self> {
        stream.set_nonblocking(true)?;
        let mut socket = TcpStream::from_std(stream);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut socket, SOCKET, Interest::READABLE)?;
        poll.registry().register(
            &mut SourceFd(&input.as_raw_fd()),
            LOCAL_INPUT,
            Interest::READABLE,
        )?;

        Ok(Self {
            socket: Some(socket),
            input,
            display,
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            signals: None,
            classifier: Classifier::new(config.mode),
            policy: NegotiationPolicy::new(),
            local_buffer: vec![0; config.local_chunk_size],
            socket_buffer: vec![0; config.socket_chunk_size],
            payload: Vec::with_capacity(config.socket_chunk_size),
            config,
            stats: SessionStats::new(),
            termination: None,
        })
    }

    /// Treat SIGINT and SIGTERM as a request to end the session
    pub fn watch_signals(&mut self) -> ClientResult<()> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        self.poll
            .registry()
            .register(&mut signals, SIGNALS, Interest::READABLE)?;
        self.signals = Some(signals);
        Ok(())
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn display(&self) -> &O {
        &self.display
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Ask the loop to stop at the top of its next iteration
    fn request_termination(&mut self, reason: Termination) {
        self.termination.get_or_insert(reason);
    }

    /// Pump bytes until the session ends.
    ///
    /// Returns the reason for a clean end; hard I/O failures are errors.
    /// The socket stays open either way, see [`close`](Self::close).
    pub fn run(&mut self) -> ClientResult<Termination> {
        if self.socket.is_none() {
            return Err(not_connected());
        }

        loop {
            if let Some(reason) = self.termination.take() {
                tracing::info!(?reason, "session ending");
                return Ok(reason);
            }

            match self
                .poll
                .poll(&mut self.events, Some(self.config.poll_interval))
            {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            let ready: Vec<Token> = self.events.iter().map(|event| event.token()).collect();
            for token in ready {
                match token {
                    LOCAL_INPUT => self.on_local_input()?,
                    SOCKET => self.on_socket_readable()?,
                    SIGNALS => self.on_signals(),
                    _ => tracing::warn!(?token, "event for unknown token"),
                }
                if self.termination.is_some() {
                    break;
                }
            }
        }
    }

    /// Close the socket and stop polling. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let registry = self.poll.registry();
            let _ = registry.deregister(&mut socket);
            let _ = registry.deregister(&mut SourceFd(&self.input.as_raw_fd()));
            if let Some(signals) = self.signals.as_mut() {
                let _ = registry.deregister(signals);
            }
            let _ = socket.shutdown(Shutdown::Both);
            tracing::debug!("socket closed");
        }
    }

    fn on_local_input(&mut self) -> ClientResult<()> {
        let n = match self.input.read(&mut self.local_buffer) {
            Ok(0) => {
                self.request_termination(Termination::LocalEof);
                return Ok(());
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                return self.rearm_input();
            }
            Err(e) => return Err(e.into()),
        };

        let chunk = &self.local_buffer[..n];
        if chunk.contains(&self.config.disconnect_byte) {
            tracing::debug!("disconnect key pressed");
            self.request_termination(Termination::DisconnectKey);
            return Ok(());
        }

        {
            let socket = self.socket.as_mut().ok_or_else(not_connected)?;
            let outgoing = self.config.outgoing.apply(chunk);
            write_fully(socket, &outgoing, self.config.write_deadline)?;
            self.stats.bytes_sent += outgoing.len() as u64;
        }

        self.rearm_input()
    }

    /// epoll is edge-triggered: rearm so bytes still pending on the input
    /// are reported again.
    fn rearm_input(&mut self) -> ClientResult<()> {
        self.poll.registry().reregister(
            &mut SourceFd(&self.input.as_raw_fd()),
            LOCAL_INPUT,
            Interest::READABLE,
        )?;
        Ok(())
    }

    /// Handle at most one chunk from the server per wakeup, then rearm.
    ///
    /// Bytes still pending are reported by the next poll, after local input
    /// and signals have had their turn.
    fn on_socket_readable(&mut self) -> ClientResult<()> {
        let n = loop {
            let socket = self.socket.as_mut().ok_or_else(not_connected)?;
            match socket.read(&mut self.socket_buffer) {
                Ok(0) => {
                    tracing::info!("server closed the connection");
                    self.request_termination(Termination::PeerClosed);
                    return Ok(());
                }
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        self.process_server_bytes(n)?;
        self.rearm_socket()
    }

    fn rearm_socket(&mut self) -> ClientResult<()> {
        let socket = self.socket.as_mut().ok_or_else(not_connected)?;
        self.poll
            .registry()
            .reregister(socket, SOCKET, Interest::READABLE)?;
        Ok(())
    }

    /// Classify one socket read, answer negotiations, then flush the payload
    /// to the display in a single write.
    fn process_server_bytes(&mut self, n: usize) -> ClientResult<()> {
        let socket = self.socket.as_mut().ok_or_else(not_connected)?;
        let policy = &self.policy;
        let stats = &mut self.stats;
        let deadline = self.config.write_deadline;

        self.payload.clear();
        self.classifier.feed(
            &self.socket_buffer[..n],
            &mut self.payload,
            |received: Negotiation| {
                stats.negotiations_received += 1;
                match policy.decide(received) {
                    Some(reply) => {
                        tracing::debug!(%received, %reply, "negotiation");
                        write_fully(&mut *socket, &reply.to_bytes(), deadline)?;
                        stats.replies_sent += 1;
                    }
                    None => tracing::debug!(%received, "negotiation, no reply"),
                }
                Ok::<(), ClientError>(())
            },
        )?;

        if !self.payload.is_empty() {
            self.display.write_all(&self.payload)?;
            self.display.flush()?;
            self.stats.bytes_displayed += self.payload.len() as u64;
        }
        Ok(())
    }

    fn on_signals(&mut self) {
        let Some(signals) = self.signals.as_mut() else {
            return;
        };
        if let Some(signal) = signals.pending().last() {
            tracing::info!(signal, "interrupt received");
            self.request_termination(Termination::Interrupted);
        }
    }
}

impl<I, O> Drop for Session<I, O>
where
    I: Read + AsRawFd,
    O: Write,
{
    fn drop(&mut self) {
        self.close();
    }
}
