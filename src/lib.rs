//! Terminal client for line-oriented Telnet servers.
//!
//! Bridges the local terminal to a server socket: keystrokes go out as typed,
//! server output is shown with Telnet negotiation stripped and, unless running
//! as a pure filter, answered from a fixed option policy.

pub mod bridge;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod terminal;

pub use bridge::{Session, SessionStats, Termination};
pub use config::ClientConfig;
pub use errors::{ClientError, ClientResult};
