use std::time::Duration;

use crate::close::CloseReason;

/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel has closed; reads issued after this always fail this way.
    #[error("channel closed: {0}")]
    Closed(CloseReason),

    /// A timed read expired before a frame or close arrived.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// The underlying connection failed to transmit.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] muxlink_frame::FrameError),
}

impl ChannelError {
    /// The close reason, if this error is a channel close.
    pub fn close_reason(&self) -> Option<&CloseReason> {
        match self {
            ChannelError::Closed(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
