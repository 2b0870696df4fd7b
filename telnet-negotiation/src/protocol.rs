//! # Telnet Protocol Constants and Types
//!
//! Wire-level vocabulary from **RFC 854** (Telnet Protocol Specification).
//!
//! ## IAC (Interpret As Command) - Byte 255
//! The IAC byte signals that the following byte(s) form a command rather than
//! data. A data byte with value 255 travels on the wire as IAC IAC.
//!
//! ## Command Structure
//! - Negotiation: `IAC WILL/WONT/DO/DONT <option>` (exactly 3 bytes)
//! - Everything else this client understands: `IAC <command>` (2 bytes, discarded)

use std::fmt;

/// IAC - Interpret As Command (RFC 854, Section 4)
pub const IAC: u8 = 255;

/// WILL - sender wants to enable an option on its side
pub const WILL: u8 = 251;

/// WON'T - sender refuses or stops an option on its side
pub const WONT: u8 = 252;

/// DO - sender asks the receiver to enable an option
pub const DO: u8 = 253;

/// DON'T - sender asks the receiver to disable an option
pub const DONT: u8 = 254;

/// The four option negotiation commands.
///
/// These are the only commands that take an option byte on the wire and
/// therefore the only ones the classifier tracks past the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NegotiationCommand {
    Will = WILL,
    Wont = WONT,
    Do = DO,
    Dont = DONT,
}

impl NegotiationCommand {
    /// Convert a byte to a negotiation command, if it is one
    ///
    /// # Example
    /// ```
    /// use telnet_negotiation::protocol::NegotiationCommand;
    ///
    /// assert_eq!(NegotiationCommand::from_byte(253), Some(NegotiationCommand::Do));
    /// assert_eq!(NegotiationCommand::from_byte(241), None);
    /// ```
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            WILL => Some(NegotiationCommand::Will),
            WONT => Some(NegotiationCommand::Wont),
            DO => Some(NegotiationCommand::Do),
            DONT => Some(NegotiationCommand::Dont),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for NegotiationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationCommand::Will => "WILL",
            NegotiationCommand::Wont => "WONT",
            NegotiationCommand::Do => "DO",
            NegotiationCommand::Dont => "DONT",
        };
        f.write_str(name)
    }
}

/// Name of a two-byte command (RFC 854), used when logging discarded commands.
///
/// Returns `None` for bytes with no assigned meaning.
pub fn command_name(byte: u8) -> Option<&'static str> {
    match byte {
        240 => Some("SE"),
        241 => Some("NOP"),
        242 => Some("DM"),
        243 => Some("BRK"),
        244 => Some("IP"),
        245 => Some("AO"),
        246 => Some("AYT"),
        247 => Some("EC"),
        248 => Some("EL"),
        249 => Some("GA"),
        250 => Some("SB"),
        _ => None,
    }
}

/// Well-known Telnet options.
///
/// Options travel as plain bytes; this enum only names the ones the client
/// has an opinion about or that servers commonly offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(non_camel_case_types)] // Protocol constants traditionally use SCREAMING_SNAKE_CASE
pub enum TelnetOption {
    /// Binary Transmission (RFC 856)
    BINARY = 0,

    /// Echo (RFC 857)
    ECHO = 1,

    /// Suppress Go Ahead (RFC 858)
    SUPPRESS_GO_AHEAD = 3,

    /// Status (RFC 859)
    STATUS = 5,

    /// Timing Mark (RFC 860)
    TIMING_MARK = 6,

    /// Terminal Type (RFC 1091)
    TERMINAL_TYPE = 24,

    /// End of Record (RFC 885)
    END_OF_RECORD = 25,

    /// Negotiate About Window Size (RFC 1073)
    NAWS = 31,

    /// Terminal Speed (RFC 1079)
    TERMINAL_SPEED = 32,

    /// Remote Flow Control (RFC 1372)
    TOGGLE_FLOW_CONTROL = 33,

    /// Linemode (RFC 1184)
    LINEMODE = 34,

    /// New Environment (RFC 1571)
    NEW_ENVIRON = 39,

    /// Charset (RFC 2066)
    CHARSET = 42,
}

impl TelnetOption {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(TelnetOption::BINARY),
            1 => Some(TelnetOption::ECHO),
            3 => Some(TelnetOption::SUPPRESS_GO_AHEAD),
            5 => Some(TelnetOption::STATUS),
            6 => Some(TelnetOption::TIMING_MARK),
            24 => Some(TelnetOption::TERMINAL_TYPE),
            25 => Some(TelnetOption::END_OF_RECORD),
            31 => Some(TelnetOption::NAWS),
            32 => Some(TelnetOption::TERMINAL_SPEED),
            33 => Some(TelnetOption::TOGGLE_FLOW_CONTROL),
            34 => Some(TelnetOption::LINEMODE),
            39 => Some(TelnetOption::NEW_ENVIRON),
            42 => Some(TelnetOption::CHARSET),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// A decoded option negotiation: `IAC <command> <option>`.
///
/// Produced by the classifier when it completes a 3-byte sequence, and by the
/// policy as the reply to send back. The option is kept as a raw byte so
/// unknown options survive the round trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Negotiation {
    pub command: NegotiationCommand,
    pub option: u8,
}

impl Negotiation {
    pub fn new(command: NegotiationCommand, option: u8) -> Self {
        Self { command, option }
    }

    /// Serialize to the 3-byte wire form
    ///
    /// # Example
    /// ```
    /// use telnet_negotiation::protocol::{Negotiation, NegotiationCommand};
    ///
    /// let will_echo = Negotiation::new(NegotiationCommand::Will, 1);
    /// assert_eq!(will_echo.to_bytes(), [255, 251, 1]);
    /// ```
    pub fn to_bytes(self) -> [u8; 3] {
        [IAC, self.command.to_byte(), self.option]
    }

    /// The well-known option, if the option byte names one
    pub fn known_option(self) -> Option<TelnetOption> {
        TelnetOption::from_byte(self.option)
    }
}

impl fmt::Display for Negotiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.known_option() {
            Some(option) => write!(f, "{} {:?}", self.command, option),
            None => write!(f, "{} {}", self.command, self.option),
        }
    }
}
