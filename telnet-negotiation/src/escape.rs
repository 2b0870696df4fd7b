//! # Outgoing Data Escaping
//!
//! RFC 854 requires a data byte 255 to be sent as IAC IAC so the receiver
//! does not read it as the start of a command. Whether the client applies this
//! to typed input is a session choice, see [`OutgoingPolicy`].

use crate::protocol::IAC;
use std::borrow::Cow;

/// How local input is prepared before it is written to the socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutgoingPolicy {
    /// Send bytes exactly as typed
    #[default]
    Raw,
    /// Double every IAC byte
    EscapeIac,
}

impl OutgoingPolicy {
    /// Apply the policy to a chunk, borrowing when nothing changes
    pub fn apply(self, data: &[u8]) -> Cow<'_, [u8]> {
        match self {
            OutgoingPolicy::Raw => Cow::Borrowed(data),
            OutgoingPolicy::EscapeIac => escape_iac(data),
        }
    }
}

/// Double every IAC byte in `data`
///
/// # Example
/// ```
/// use telnet_negotiation::escape::escape_iac;
///
/// assert_eq!(escape_iac(&[100, 255, 200]).as_ref(), &[100, 255, 255, 200]);
/// assert_eq!(escape_iac(b"plain").as_ref(), b"plain");
/// ```
pub fn escape_iac(data: &[u8]) -> Cow<'_, [u8]> {
    let iac_count = data.iter().filter(|&&b| b == IAC).count();
    if iac_count == 0 {
        return Cow::Borrowed(data);
    }

    let mut escaped = Vec::with_capacity(data.len() + iac_count);
    for &byte in data {
        escaped.push(byte);
        if byte == IAC {
            escaped.push(IAC);
        }
    }
    Cow::Owned(escaped)
}
