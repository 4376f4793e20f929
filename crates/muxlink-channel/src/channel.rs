use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use muxlink_frame::{Frame, FrameKind};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::close::CloseReason;
use crate::connection::Connection;
use crate::error::{ChannelError, Result};

/// A single multiplexed logical stream bound to one correlation id.
///
/// Construction subscribes to the connection's raw inbound stream and spawns
/// a filter task that routes matching frames into this channel's local queue.
/// The subscription is released exactly once — when the channel closes or is
/// dropped — so a closed channel costs nothing on the shared connection.
///
/// `Channel` also implements [`Stream`], yielding payloads until the channel
/// closes; the terminal condition is then available via
/// [`close_reason`](Channel::close_reason).
pub struct Channel {
    id: Uuid,
    conn: Arc<dyn Connection>,
    messages: mpsc::UnboundedReceiver<Option<Value>>,
    closed: watch::Receiver<Option<CloseReason>>,
    filter: JoinHandle<()>,
}

impl Channel {
    /// Bind a new channel to the connection with a freshly generated
    /// correlation id.
    ///
    /// Generated ids are unique, so collisions between concurrently open
    /// channels cannot occur through this constructor.
    pub fn attach(conn: Arc<dyn Connection>) -> Self {
        Self::with_id(conn, Uuid::new_v4())
    }

    /// Bind a new channel with a caller-supplied correlation id.
    ///
    /// Intended for interop with peer-assigned ids. Uniqueness across
    /// concurrently open channels on the same connection is the caller's
    /// responsibility; the channel does not check for collisions.
    pub fn with_id(conn: Arc<dyn Connection>, id: Uuid) -> Self {
        // Subscribe before spawning so no inbound frame can slip past
        // between construction and the first poll of the filter task.
        let frames = conn.subscribe();
        let conn_closed = conn.closed();
        let (message_tx, messages) = mpsc::unbounded_channel();
        let (close_tx, closed) = watch::channel(None);

        let filter = tokio::spawn(filter_frames(
            id,
            frames,
            conn_closed,
            message_tx,
            close_tx,
        ));

        debug!(channel = %id, "channel attached");
        Self {
            id,
            conn,
            messages,
            closed,
            filter,
        }
    }

    /// This channel's correlation id.
    pub fn correlation_id(&self) -> Uuid {
        self.id
    }

    /// Transmit an open frame targeting `path`.
    ///
    /// Pure transmit: no local state changes, and repeated opens are not
    /// deduplicated by the protocol.
    pub async fn open(&self, path: &str, data: Option<Value>) -> Result<()> {
        self.conn.send(Frame::open(self.id, path, data)).await
    }

    /// Transmit a data frame.
    ///
    /// Does not consult local close state; a transport failure from the
    /// connection is propagated as-is.
    pub async fn send(&self, data: Option<Value>) -> Result<()> {
        self.conn.send(Frame::data(self.id, data)).await
    }

    /// Request a graceful close by transmitting a close frame.
    ///
    /// The channel's own state transitions only when the inbound filter
    /// observes a matching close or error frame, not on this call.
    pub async fn close(&self, data: Option<Value>) -> Result<()> {
        self.conn.send(Frame::close(self.id, data)).await
    }

    /// Signal abrupt termination to the peer with an error frame.
    pub async fn abort(&self, reason: Option<&str>) -> Result<()> {
        self.conn
            .send(Frame::error(self.id, reason.map(str::to_owned)))
            .await
    }

    /// Wait for the next payload on this channel.
    ///
    /// Resolves with the payload of the next matching data frame (or the
    /// trailing payload of a close frame), or fails with
    /// [`ChannelError::Closed`] once the channel's close signal fires.
    /// Queued payloads are drained before a close is surfaced, so a close
    /// frame's trailing payload is never lost.
    pub async fn read(&mut self) -> Result<Option<Value>> {
        tokio::select! {
            biased;

            msg = self.messages.recv() => match msg {
                Some(payload) => Ok(payload),
                // Queue drained and filter task gone: the channel is closed.
                None => Err(ChannelError::Closed(self.current_reason())),
            },
            reason = wait_closed(&mut self.closed) => Err(ChannelError::Closed(reason)),
        }
    }

    /// [`read`](Channel::read) with a per-call timeout.
    ///
    /// A zero duration means no timeout, matching a plain `read`. On expiry
    /// the pending read is cancelled (no frame is consumed) and
    /// [`ChannelError::Timeout`] is returned; channel state is unchanged.
    pub async fn read_timeout(&mut self, timeout: Duration) -> Result<Option<Value>> {
        if timeout.is_zero() {
            return self.read().await;
        }

        match tokio::time::timeout(timeout, self.read()).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Timeout(timeout)),
        }
    }

    /// Next element of the lazy payload sequence.
    ///
    /// Yields `Some(payload)` for each delivered payload and `None` once the
    /// channel has closed; the close condition is retrievable via
    /// [`close_reason`](Channel::close_reason). The sequence is not
    /// restartable after close.
    pub async fn next_payload(&mut self) -> Option<Option<Value>> {
        match self.read().await {
            Ok(payload) => Some(payload),
            Err(_) => None,
        }
    }

    /// Returns true once the close signal has fired.
    pub fn is_closed(&self) -> bool {
        self.closed.borrow().is_some()
    }

    /// The reason this channel closed, if it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.closed.borrow().clone()
    }

    fn current_reason(&self) -> CloseReason {
        self.closed
            .borrow()
            .clone()
            .unwrap_or(CloseReason::Abrupt(None))
    }
}

impl Stream for Channel {
    type Item = Option<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // The filter task drops its sender after publishing the close
        // reason, so exhaustion of the queue is exactly channel closure.
        self.messages.poll_recv(cx)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // Stops the filter task, releasing the raw subscription.
        self.filter.abort();
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("correlation_id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn wait_closed(closed: &mut watch::Receiver<Option<CloseReason>>) -> CloseReason {
    match closed.wait_for(|reason| reason.is_some()).await {
        Ok(reason) => reason.clone().unwrap_or(CloseReason::Abrupt(None)),
        // Sender dropped without publishing: the filter task was torn down.
        Err(_) => CloseReason::Abrupt(None),
    }
}

/// Per-channel inbound filter.
///
/// Consumes the raw subscription, forwards matching payloads, and publishes
/// the close reason exactly once. Returning drops the broadcast receiver, so
/// teardown never leaks a listener on the shared connection.
async fn filter_frames(
    id: Uuid,
    mut frames: broadcast::Receiver<Frame>,
    conn_closed: CancellationToken,
    messages: mpsc::UnboundedSender<Option<Value>>,
    closed: watch::Sender<Option<CloseReason>>,
) {
    let reason = loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(frame) if frame.correlation_id != id => continue,
                Ok(frame) => match frame.kind {
                    None => {
                        trace!(channel = %id, "data frame");
                        let _ = messages.send(frame.payload);
                    }
                    Some(FrameKind::Open) => {
                        // Peer-side open announcement, not payload data.
                        trace!(channel = %id, path = ?frame.path, "open frame ignored");
                    }
                    Some(FrameKind::Close) => {
                        // Trailing payload is delivered before the close fires.
                        let _ = messages.send(frame.payload);
                        break CloseReason::Graceful;
                    }
                    Some(FrameKind::Error) => {
                        break CloseReason::Abrupt(frame.reason);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %id, skipped, "inbound stream lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break CloseReason::Abrupt(Some("connection closed".into()));
                }
            },
            () = conn_closed.cancelled() => {
                break CloseReason::Abrupt(Some("connection closed".into()));
            }
        }
    };

    debug!(channel = %id, %reason, "channel closed");
    let _ = closed.send(Some(reason));
}
