use std::fmt;

/// Why a channel stopped.
///
/// Graceful closes come from a close frame and display as `"OK"`; abrupt
/// closes come from an error frame (carrying the peer's reason) or from
/// losing the underlying connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer (or local side) closed the channel with a close frame.
    Graceful,
    /// The channel was torn down by an error frame or connection loss.
    Abrupt(Option<String>),
}

impl CloseReason {
    /// Returns true for a close-frame termination.
    pub fn is_graceful(&self) -> bool {
        matches!(self, CloseReason::Graceful)
    }

    /// Returns true for an error-frame or connection-loss termination.
    pub fn is_abrupt(&self) -> bool {
        !self.is_graceful()
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Graceful => f.write_str("OK"),
            CloseReason::Abrupt(Some(reason)) => f.write_str(reason),
            CloseReason::Abrupt(None) => f.write_str("aborted"),
        }
    }
}
