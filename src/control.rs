//! Control signals delivered to a participant alongside ordinary workitems.
//!
//! A [`ControlSignal`] wraps a single opaque token. Only `start`, `stop` and
//! `die` have predicates; any other token (e.g. `cancel`) is still a valid
//! signal and is forwarded to the handler untouched.

use std::fmt;

/// Token sent when the engine cancels an in-flight workitem.
pub const CANCEL: &str = "cancel";
/// Token for participant start-up.
pub const START: &str = "start";
/// Token for orderly participant shutdown.
pub const STOP: &str = "stop";
/// Token for immediate participant termination.
pub const DIE: &str = "die";

/// Classified control message for a workitem or the participant lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlSignal {
    token: String,
}

impl ControlSignal {
    /// Wrap a raw control token. Every token is accepted.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Signal asking the handler to abandon work on a workitem.
    pub fn cancel() -> Self {
        Self::new(CANCEL)
    }

    /// Signal asking the handler to release its resources.
    pub fn stop() -> Self {
        Self::new(STOP)
    }

    /// The raw token this signal was built from.
    pub fn reason(&self) -> &str {
        &self.token
    }

    /// `true` iff the token is exactly `start`.
    pub fn is_start(&self) -> bool {
        self.token == START
    }

    /// `true` iff the token is exactly `stop`.
    pub fn is_stop(&self) -> bool {
        self.token == STOP
    }

    /// `true` iff the token is exactly `die`.
    pub fn is_die(&self) -> bool {
        self.token == DIE
    }
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctrl: {}", self.token)
    }
}
