use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::error::{FrameError, Result};

/// Default maximum raw message size accepted by [`decode_frame`]: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Control tag carried in the wire `type` field.
///
/// Data frames carry no tag at all — [`Frame::kind`] is `None` for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Opens a logical channel against a target path.
    Open,
    /// Graceful channel termination, may carry a final payload.
    Close,
    /// Abrupt channel termination, carries a human-readable reason.
    Error,
}

/// One envelope unit on the wire.
///
/// Exactly one of {data, open, close, error} semantics applies per frame,
/// discriminated by which optional fields are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Routes the frame to the owning channel. Required on every frame.
    #[serde(rename = "uuid")]
    pub correlation_id: Uuid,

    /// Control tag; absent for data frames.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FrameKind>,

    /// Logical endpoint being opened. Present only on open frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Application payload. Present on data, open, and close frames.
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Abort reason. Present only on error frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Frame {
    /// Create a data frame.
    pub fn data(correlation_id: Uuid, payload: Option<Value>) -> Self {
        Self {
            correlation_id,
            kind: None,
            path: None,
            payload,
            reason: None,
        }
    }

    /// Create an open frame targeting a logical endpoint path.
    pub fn open(correlation_id: Uuid, path: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            correlation_id,
            kind: Some(FrameKind::Open),
            path: Some(path.into()),
            payload,
            reason: None,
        }
    }

    /// Create a close frame, optionally carrying a final payload.
    pub fn close(correlation_id: Uuid, payload: Option<Value>) -> Self {
        Self {
            correlation_id,
            kind: Some(FrameKind::Close),
            path: None,
            payload,
            reason: None,
        }
    }

    /// Create an error frame signaling abrupt termination.
    pub fn error(correlation_id: Uuid, reason: Option<String>) -> Self {
        Self {
            correlation_id,
            kind: Some(FrameKind::Error),
            path: None,
            payload: None,
            reason,
        }
    }

    /// Returns true if this frame carries data semantics (no control tag).
    pub fn is_data(&self) -> bool {
        self.kind.is_none()
    }
}

/// Encode a frame into the transport's native message unit (UTF-8 JSON).
///
/// Unset optional fields are omitted entirely, not written as `null`.
pub fn encode_frame(frame: &Frame) -> Result<Bytes> {
    let raw = serde_json::to_vec(frame)?;
    Ok(Bytes::from(raw))
}

/// Decode a frame from one raw transport message.
///
/// Unknown extra fields are ignored (forward compatible); fields absent on
/// the wire map to `None`. Messages larger than `max_size` are rejected
/// before parsing.
pub fn decode_frame(raw: &[u8], max_size: usize) -> Result<Frame> {
    if raw.len() > max_size {
        return Err(FrameError::Oversized {
            size: raw.len(),
            max: max_size,
        });
    }

    let frame: Frame = serde_json::from_slice(raw)?;
    trace!(correlation_id = %frame.correlation_id, kind = ?frame.kind, "decoded frame");
    Ok(frame)
}
