use async_trait::async_trait;
use muxlink_frame::Frame;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Capability set a channel requires from the shared connection.
///
/// Implementations own the actual transport (socket, pipe, in-memory pair)
/// and deliver every inbound frame to all subscribers. Channels never touch
/// the transport directly.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Subscribe to the raw inbound frame stream.
    ///
    /// Dropping the returned receiver unsubscribes; the connection must not
    /// retain any per-subscriber state beyond it.
    fn subscribe(&self) -> broadcast::Receiver<Frame>;

    /// Token cancelled exactly once when the connection closes.
    fn closed(&self) -> CancellationToken;

    /// Transmit one frame, asynchronously acknowledged or failed.
    ///
    /// Failures are transport errors; retry policy, if any, belongs to the
    /// implementation.
    async fn send(&self, frame: Frame) -> Result<()>;
}
