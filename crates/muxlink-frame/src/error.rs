/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is not a valid JSON envelope.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The raw message exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    Oversized { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
