//! # Telnet Negotiation Library
//!
//! Client-side handling of the Telnet command sub-protocol as defined in:
//! - RFC 854: Telnet Protocol Specification (https://tools.ietf.org/html/rfc854)
//! - RFC 857: Telnet Echo Option
//! - RFC 858: Telnet Suppress Go Ahead Option
//!
//! The library is deliberately small: it separates payload from protocol
//! control in bytes received from a server, and answers option negotiation
//! from a fixed table. It performs no I/O of its own.
//!
//! ## Architecture Overview
//! - `protocol`: Wire constants and the [`Negotiation`] value
//! - `classifier`: Byte-at-a-time IAC state machine
//! - `policy`: Reply decisions for DO/DONT/WILL/WONT
//! - `escape`: IAC doubling for outgoing data
//!
//! ## Example
//! ```
//! use telnet_negotiation::{Classifier, ClassifierMode, NegotiationPolicy};
//!
//! let mut classifier = Classifier::new(ClassifierMode::Negotiate);
//! let policy = NegotiationPolicy::new();
//!
//! let mut display = Vec::new();
//! let mut replies = Vec::new();
//! classifier
//!     .feed(b"\xff\xfd\x01hello\xff\xffworld", &mut display, |received| {
//!         if let Some(reply) = policy.decide(received) {
//!             replies.extend_from_slice(&reply.to_bytes());
//!         }
//!         Ok::<(), std::io::Error>(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(display, b"hello\xffworld");
//! assert_eq!(replies, b"\xff\xfb\x01");
//! ```

pub mod classifier;
pub mod escape;
pub mod policy;
pub mod protocol;

pub use classifier::{Classified, Classifier, ClassifierMode, ClassifierState};
pub use escape::{OutgoingPolicy, escape_iac};
pub use policy::{NegotiationPolicy, OptionPolicy};
pub use protocol::{IAC, Negotiation, NegotiationCommand, TelnetOption};
