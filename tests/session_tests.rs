use pretty_assertions::assert_eq;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::os::unix::net::UnixStream;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use signal_hook::consts::SIGTERM;

use telnet_bridge::bridge::{self, Session, Termination};
use telnet_bridge::client::run_session;
use telnet_bridge::config::{ServerConfig, SessionConfig};
use telnet_bridge::errors::ClientError;
use telnet_bridge::terminal::TerminalMode;
use telnet_negotiation::{ClassifierMode, OutgoingPolicy};

/// Start a one-connection server running `script`, which returns whatever it
/// received from the client.
fn spawn_server<F>(script: F) -> (ServerConfig, JoinHandle<Vec<u8>>)
where
    F: FnOnce(TcpStream) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        script(stream)
    });

    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout: Duration::from_secs(5),
    };
    (server, handle)
}

fn session_config() -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

fn read_all(mut stream: TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    stream.read_to_end(&mut received).unwrap();
    received
}

#[derive(Default)]
struct CountingTerminal {
    entered: usize,
    restored: usize,
    fail_enter: bool,
}

impl TerminalMode for CountingTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        self.entered += 1;
        if self.fail_enter {
            return Err(io::Error::other("not a tty"));
        }
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.restored += 1;
        Ok(())
    }
}

/// Display that takes a while to accept each write
#[derive(Default)]
struct SlowDisplay {
    written: usize,
}

impl Write for SlowDisplay {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        thread::sleep(Duration::from_millis(2));
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_negotiation_reply_and_payload() {
    let (server, handle) = spawn_server(|mut stream| {
        stream.write_all(b"\xff\xfd\x01hello\xff\xffworld").unwrap();
        let mut reply = [0u8; 3];
        stream.read_exact(&mut reply).unwrap();
        reply.to_vec()
    });

    let (local, _keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    assert_eq!(session.run().unwrap(), Termination::PeerClosed);
    assert_eq!(session.display().as_slice(), b"hello\xffworld");
    assert_eq!(session.stats().negotiations_received, 1);
    assert_eq!(session.stats().replies_sent, 1);
    assert_eq!(session.stats().bytes_displayed, 11);

    session.close();
    assert_eq!(handle.join().unwrap(), b"\xff\xfb\x01");
}

#[test]
fn test_filter_mode_sends_no_replies() {
    let (server, handle) = spawn_server(|mut stream| {
        stream.write_all(b"\xff\xfb\x03\xff\xfd\x18ok\xff\xf1").unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
        read_all(stream)
    });

    let (local, _keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let config = SessionConfig {
        mode: ClassifierMode::Filter,
        ..session_config()
    };
    let mut session = Session::new(stream, local, Vec::new(), config).unwrap();

    assert_eq!(session.run().unwrap(), Termination::PeerClosed);
    assert_eq!(session.display().as_slice(), b"ok");
    assert_eq!(session.stats().negotiations_received, 0);

    session.close();
    assert!(handle.join().unwrap().is_empty());
}

#[test]
fn test_split_negotiation_across_reads() {
    let (server, handle) = spawn_server(|mut stream| {
        for chunk in [&[255u8][..], &[251][..], &[1, b'x'][..]] {
            stream.write_all(chunk).unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(30));
        }
        let mut reply = [0u8; 3];
        stream.read_exact(&mut reply).unwrap();
        reply.to_vec()
    });

    let (local, _keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    assert_eq!(session.run().unwrap(), Termination::PeerClosed);
    assert_eq!(session.display().as_slice(), b"x");

    session.close();
    // WILL ECHO is refused: only accepted when the server asks us
    assert_eq!(handle.join().unwrap(), b"\xff\xfe\x01");
}

#[test]
fn test_local_input_is_forwarded_raw() {
    let (server, handle) = spawn_server(read_all);

    let (local, mut keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    keyboard.write_all("look 中文\r\n".as_bytes()).unwrap();
    keyboard.write_all(&[0xFF]).unwrap();
    drop(keyboard);

    assert_eq!(session.run().unwrap(), Termination::LocalEof);
    session.close();

    let mut expected = "look 中文\r\n".as_bytes().to_vec();
    expected.push(0xFF);
    assert_eq!(handle.join().unwrap(), expected);
}

#[test]
fn test_escape_iac_doubles_outgoing_iac() {
    let (server, handle) = spawn_server(read_all);

    let (local, mut keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let config = SessionConfig {
        outgoing: OutgoingPolicy::EscapeIac,
        ..session_config()
    };
    let mut session = Session::new(stream, local, Vec::new(), config).unwrap();

    keyboard.write_all(&[b'a', 0xFF, b'b']).unwrap();
    drop(keyboard);

    assert_eq!(session.run().unwrap(), Termination::LocalEof);
    assert_eq!(session.stats().bytes_sent, 4);
    session.close();

    assert_eq!(handle.join().unwrap(), vec![b'a', 0xFF, 0xFF, b'b']);
}

#[test]
fn test_disconnect_key_sends_nothing() {
    let (server, handle) = spawn_server(read_all);

    let (local, mut keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    keyboard.write_all(b"ab\x03cd").unwrap();

    let mut terminal = CountingTerminal::default();
    let outcome = run_session(&mut session, &mut terminal).unwrap();

    assert_eq!(outcome, Termination::DisconnectKey);
    assert_eq!(terminal.entered, 1);
    assert_eq!(terminal.restored, 1);
    assert!(!session.is_open());
    assert_eq!(session.stats().bytes_sent, 0);
    assert!(handle.join().unwrap().is_empty());
}

#[test]
fn test_cleanup_runs_when_raw_mode_fails() {
    let (server, handle) = spawn_server(read_all);

    let (local, _keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    let mut terminal = CountingTerminal {
        fail_enter: true,
        ..CountingTerminal::default()
    };
    let outcome = run_session(&mut session, &mut terminal);

    assert!(matches!(outcome, Err(ClientError::Terminal(_))));
    assert_eq!(terminal.restored, 1);
    assert!(!session.is_open());
    assert!(handle.join().unwrap().is_empty());
}

#[test]
fn test_run_after_close_fails() {
    let (server, handle) = spawn_server(read_all);

    let (local, _keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    session.close();
    session.close();
    assert!(matches!(
        session.run(),
        Err(ClientError::Io(ref e)) if e.kind() == io::ErrorKind::NotConnected
    ));
    assert!(handle.join().unwrap().is_empty());
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout: Duration::from_secs(2),
    };

    match bridge::connect(&server) {
        Err(ClientError::Connection { target, .. }) => {
            assert_eq!(target, format!("127.0.0.1:{port}"));
        }
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[test]
fn test_disconnect_key_honoured_while_server_floods() {
    let (server, handle) = spawn_server(|mut stream| {
        let chunk = vec![b'x'; 64 * 1024];
        while stream.write_all(&chunk).is_ok() {}
        Vec::new()
    });

    let (local, mut keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session =
        Session::new(stream, local, SlowDisplay::default(), session_config()).unwrap();

    // Give the server time to fill the socket before the key arrives
    thread::sleep(Duration::from_millis(50));
    keyboard.write_all(b"\x03").unwrap();

    let (done, outcome) = mpsc::channel();
    thread::spawn(move || {
        let result = session.run();
        let displayed = session.display().written;
        session.close();
        let _ = done.send((result, displayed));
    });

    let (result, displayed) = outcome
        .recv_timeout(Duration::from_secs(5))
        .expect("disconnect key ignored while the server floods");
    assert_eq!(result.unwrap(), Termination::DisconnectKey);
    assert!(displayed > 0);
    handle.join().unwrap();
}

#[test]
fn test_interrupt_signal_ends_session() {
    let (server, handle) = spawn_server(read_all);

    let (local, _keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();
    session.watch_signals().unwrap();

    signal_hook::low_level::raise(SIGTERM).unwrap();

    let mut terminal = CountingTerminal::default();
    let outcome = run_session(&mut session, &mut terminal).unwrap();

    assert_eq!(outcome, Termination::Interrupted);
    assert_eq!(terminal.entered, 1);
    assert_eq!(terminal.restored, 1);
    assert!(!session.is_open());
    assert!(handle.join().unwrap().is_empty());
}

#[test]
fn test_connection_reset_is_an_error() {
    let (server, handle) = spawn_server(|stream| {
        // Closing with unread bytes queued makes the kernel send RST, not FIN
        let mut first = [0u8; 1];
        stream.peek(&mut first).unwrap();
        drop(stream);
        Vec::new()
    });

    let (local, mut keyboard) = UnixStream::pair().unwrap();
    let stream = bridge::connect(&server).unwrap();
    let mut session = Session::new(stream, local, Vec::new(), session_config()).unwrap();

    keyboard.write_all(b"look\r\n").unwrap();

    let mut terminal = CountingTerminal::default();
    let outcome = run_session(&mut session, &mut terminal);

    assert!(matches!(outcome, Err(ClientError::Io(_))), "{outcome:?}");
    assert_eq!(terminal.restored, 1);
    assert!(!session.is_open());
    handle.join().unwrap();
}
