//! # Telnet Byte Classifier
//!
//! Splits a byte stream received from a Telnet server into payload and
//! protocol control, one byte at a time, per **RFC 854**.
//!
//! ## State Machine
//! ```text
//! Normal          + b != IAC          -> emit b             -> Normal
//! Normal          + IAC               -> (nothing)          -> CommandPending
//! CommandPending  + IAC               -> emit 255 (escaped) -> Normal
//! CommandPending  + WILL/WONT/DO/DONT -> remember command   -> OptionPending
//! CommandPending  + other             -> discard command    -> Normal
//! OptionPending   + option            -> negotiation event  -> Normal
//! ```
//!
//! Every pending state is resolved by exactly the next byte, so a sequence
//! split across socket reads resumes where it left off and no input can leave
//! the classifier stuck.
//!
//! ## Modes
//! In [`ClassifierMode::Filter`] the option byte is swallowed silently. In
//! [`ClassifierMode::Negotiate`] it surfaces as [`Classified::Negotiated`] so
//! the caller can hand it to a [`crate::policy::NegotiationPolicy`].

use crate::protocol::{IAC, Negotiation, NegotiationCommand, command_name};

/// Whether completed negotiation sequences are reported or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierMode {
    /// Strip negotiation sequences and never report them
    Filter,
    /// Report every completed negotiation sequence
    #[default]
    Negotiate,
}

/// Position inside an IAC sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierState {
    /// Expecting payload or IAC
    #[default]
    Normal,
    /// Saw IAC, the next byte selects the command
    CommandPending,
    /// Saw IAC plus a negotiation command, the next byte is the option id
    OptionPending(NegotiationCommand),
}

/// What a single input byte turned into
///
/// A byte is never both payload and part of a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// The byte (or an escaped IAC) is payload for the display
    Emitted(u8),
    /// The byte was protocol control with nothing to report
    Consumed,
    /// The byte completed a negotiation sequence
    Negotiated(Negotiation),
}

impl ClassifierState {
    /// Pure transition function: the state after `byte` and what it produced.
    pub fn next(self, byte: u8, mode: ClassifierMode) -> (ClassifierState, Classified) {
        match self {
            ClassifierState::Normal => {
                if byte == IAC {
                    (ClassifierState::CommandPending, Classified::Consumed)
                } else {
                    (ClassifierState::Normal, Classified::Emitted(byte))
                }
            }

            ClassifierState::CommandPending => {
                if byte == IAC {
                    // IAC IAC = escaped data byte 255
                    (ClassifierState::Normal, Classified::Emitted(IAC))
                } else if let Some(command) = NegotiationCommand::from_byte(byte) {
                    (ClassifierState::OptionPending(command), Classified::Consumed)
                } else {
                    match command_name(byte) {
                        Some(name) => tracing::trace!(command = name, "discarding telnet command"),
                        None => {
                            tracing::trace!(command = byte, "discarding unknown telnet command")
                        }
                    }
                    (ClassifierState::Normal, Classified::Consumed)
                }
            }

            ClassifierState::OptionPending(command) => {
                let classified = match mode {
                    ClassifierMode::Negotiate => {
                        Classified::Negotiated(Negotiation::new(command, byte))
                    }
                    ClassifierMode::Filter => Classified::Consumed,
                };
                (ClassifierState::Normal, classified)
            }
        }
    }
}

/// Stateful classifier for one connection
///
/// State is kept between calls, so chunks can be fed exactly as they arrive
/// from the socket.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    mode: ClassifierMode,
    state: ClassifierState,
}

impl Classifier {
    pub fn new(mode: ClassifierMode) -> Self {
        Self {
            mode,
            state: ClassifierState::Normal,
        }
    }

    /// Classify one byte and advance
    pub fn process(&mut self, byte: u8) -> Classified {
        let (state, classified) = self.state.next(byte, self.mode);
        self.state = state;
        classified
    }

    /// Classify a chunk of bytes in order
    ///
    /// Payload bytes are appended to `payload`. Each completed negotiation is
    /// passed to `on_negotiation` before the next input byte is examined; the
    /// first error it returns stops processing and is propagated.
    ///
    /// Returns the number of payload bytes appended.
    ///
    /// # Example
    /// ```
    /// use telnet_negotiation::classifier::{Classifier, ClassifierMode};
    ///
    /// let mut classifier = Classifier::new(ClassifierMode::Negotiate);
    /// let mut payload = Vec::new();
    /// let mut seen = Vec::new();
    ///
    /// // IAC DO ECHO + "hi"
    /// classifier
    ///     .feed(&[255, 253, 1, b'h', b'i'], &mut payload, |n| {
    ///         seen.push(n);
    ///         Ok::<(), ()>(())
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(payload, b"hi");
    /// assert_eq!(seen.len(), 1);
    /// ```
    pub fn feed<E, F>(
        &mut self,
        input: &[u8],
        payload: &mut Vec<u8>,
        mut on_negotiation: F,
    ) -> Result<usize, E>
    where
        F: FnMut(Negotiation) -> Result<(), E>,
    {
        let start = payload.len();
        for &byte in input {
            match self.process(byte) {
                Classified::Emitted(b) => payload.push(b),
                Classified::Consumed => {}
                Classified::Negotiated(negotiation) => on_negotiation(negotiation)?,
            }
        }
        Ok(payload.len() - start)
    }
}

#[cfg(test)]
impl Classifier {
    pub(crate) fn state(&self) -> ClassifierState {
        self.state
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.state != ClassifierState::Normal
    }

    /// Classify a chunk and return only its payload, ignoring negotiations
    pub(crate) fn strip(&mut self, input: &[u8]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(input.len());
        for &byte in input {
            if let Classified::Emitted(b) = self.process(byte) {
                payload.push(b);
            }
        }
        payload
    }
}
