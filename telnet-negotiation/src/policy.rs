//! # Option Negotiation Policy
//!
//! Decides how the client answers a negotiation received from the server.
//! The policy is a fixed table from option id to what we are willing to do;
//! it holds no per-connection state and never queues or retries.
//!
//! ## Reply Rules
//! ```text
//! DO X    -> WILL X if we accept X when asked, else WONT X
//! WILL X  -> DO X   if we accept X when offered, else DONT X
//! DONT X  -> WONT X (always)
//! WONT X  -> no reply
//! ```
//!
//! The client's default table accepts ECHO when asked and SUPPRESS-GO-AHEAD
//! both when asked and when offered; every other option is refused.

use crate::protocol::{Negotiation, NegotiationCommand, TelnetOption};
use std::collections::HashMap;

/// What the client is willing to do for one option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionPolicy {
    /// Answer `DO X` with `WILL X`
    pub accept_if_asked: bool,
    /// Answer `WILL X` with `DO X`
    pub accept_if_offered: bool,
}

impl OptionPolicy {
    pub const REFUSE: OptionPolicy = OptionPolicy {
        accept_if_asked: false,
        accept_if_offered: false,
    };

    pub const ACCEPT_IF_ASKED: OptionPolicy = OptionPolicy {
        accept_if_asked: true,
        accept_if_offered: false,
    };

    pub const ACCEPT_IF_OFFERED: OptionPolicy = OptionPolicy {
        accept_if_asked: false,
        accept_if_offered: true,
    };

    /// Combine two policies, accepting whatever either accepts
    pub const fn and(self, other: OptionPolicy) -> OptionPolicy {
        OptionPolicy {
            accept_if_asked: self.accept_if_asked || other.accept_if_asked,
            accept_if_offered: self.accept_if_offered || other.accept_if_offered,
        }
    }
}

/// Options the client supports out of the box
pub const DEFAULT_OPTION_TABLE: &[(TelnetOption, OptionPolicy)] = &[
    (TelnetOption::ECHO, OptionPolicy::ACCEPT_IF_ASKED),
    (
        TelnetOption::SUPPRESS_GO_AHEAD,
        OptionPolicy::ACCEPT_IF_ASKED.and(OptionPolicy::ACCEPT_IF_OFFERED),
    ),
];

/// Fixed negotiation policy, built once at startup
#[derive(Debug, Clone)]
pub struct NegotiationPolicy {
    table: HashMap<u8, OptionPolicy>,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl NegotiationPolicy {
    /// Policy backed by [`DEFAULT_OPTION_TABLE`]
    pub fn new() -> Self {
        Self::from_table(
            DEFAULT_OPTION_TABLE
                .iter()
                .map(|(option, policy)| (option.to_byte(), *policy)),
        )
    }

    /// Policy backed by a custom table; options not listed are refused
    fn from_table<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u8, OptionPolicy)>,
    {
        Self {
            table: entries.into_iter().collect(),
        }
    }

    /// Policy for an option id
    pub fn policy_for(&self, option: u8) -> OptionPolicy {
        self.table
            .get(&option)
            .copied()
            .unwrap_or(OptionPolicy::REFUSE)
    }

    /// Reply to send for a received negotiation, if any
    ///
    /// # Example
    /// ```
    /// use telnet_negotiation::policy::NegotiationPolicy;
    /// use telnet_negotiation::protocol::{Negotiation, NegotiationCommand};
    ///
    /// let policy = NegotiationPolicy::new();
    /// let reply = policy.decide(Negotiation::new(NegotiationCommand::Do, 1));
    /// assert_eq!(reply, Some(Negotiation::new(NegotiationCommand::Will, 1)));
    /// ```
    pub fn decide(&self, received: Negotiation) -> Option<Negotiation> {
        let policy = self.policy_for(received.option);
        let reply = match received.command {
            NegotiationCommand::Do if policy.accept_if_asked => NegotiationCommand::Will,
            NegotiationCommand::Do => NegotiationCommand::Wont,
            NegotiationCommand::Will if policy.accept_if_offered => NegotiationCommand::Do,
            NegotiationCommand::Will => NegotiationCommand::Dont,
            NegotiationCommand::Dont => NegotiationCommand::Wont,
            NegotiationCommand::Wont => return None,
        };
        Some(Negotiation::new(reply, received.option))
    }
}
