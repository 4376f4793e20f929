//! Correlation-tagged frame envelope for channel multiplexing.
//!
//! Every message on a multiplexed connection is one JSON envelope carrying:
//! - A correlation id (UUID) routing the frame to its logical channel
//! - An optional `type` tag (`open`, `close`, `error`) — absent for data
//! - Kind-specific optional fields (`path`, `data`, `reason`)
//!
//! Absent fields are omitted on the wire, never serialized as `null`:
//! presence itself discriminates the frame kind.

pub mod codec;
pub mod error;

pub use codec::{decode_frame, encode_frame, Frame, FrameKind, DEFAULT_MAX_FRAME_SIZE};
pub use error::{FrameError, Result};
