//! Multi-channel example — two logical channels multiplexed over one
//! in-memory connection, with a frame-level echo peer on the far side.
//! The "wire" carries encoded JSON envelopes, decoded back into frames by
//! each endpoint's inbound pump.
//!
//! Run with:
//!   cargo run --example multi-channel

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use muxlink_channel::{Channel, Connection, Result};
use muxlink_frame::{decode_frame, encode_frame, Frame, DEFAULT_MAX_FRAME_SIZE};
use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// One side of an in-memory duplex connection.
struct Endpoint {
    /// Raw wire towards the peer.
    wire: broadcast::Sender<Bytes>,
    /// Decoded inbound frames, fed by the pump task.
    inbound: broadcast::Sender<Frame>,
    closed: CancellationToken,
}

impl Endpoint {
    fn new(wire_out: broadcast::Sender<Bytes>, mut wire_in: broadcast::Receiver<Bytes>) -> Arc<Self> {
        let (inbound, _) = broadcast::channel(64);
        let closed = CancellationToken::new();

        let endpoint = Arc::new(Self {
            wire: wire_out,
            inbound: inbound.clone(),
            closed: closed.clone(),
        });

        tokio::spawn(async move {
            while let Ok(raw) = wire_in.recv().await {
                match decode_frame(&raw, DEFAULT_MAX_FRAME_SIZE) {
                    Ok(frame) => {
                        let _ = inbound.send(frame);
                    }
                    Err(err) => {
                        eprintln!("[pump] dropping malformed message: {err}");
                    }
                }
            }
            closed.cancel();
        });

        endpoint
    }
}

fn pair() -> (Arc<Endpoint>, Arc<Endpoint>) {
    let (a, a_rx) = broadcast::channel(64);
    let (b, b_rx) = broadcast::channel(64);
    (Endpoint::new(a, b_rx), Endpoint::new(b, a_rx))
}

#[async_trait]
impl Connection for Endpoint {
    fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.inbound.subscribe()
    }

    fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    async fn send(&self, frame: Frame) -> Result<()> {
        let raw = encode_frame(&frame)?;
        self.wire
            .send(raw)
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::BrokenPipe))?;
        Ok(())
    }
}

/// Frame-level peer: greets opens, echoes data, acknowledges closes.
async fn serve(endpoint: Arc<Endpoint>, mut frames: broadcast::Receiver<Frame>) {
    while let Ok(frame) = frames.recv().await {
        let id = frame.correlation_id;
        let reply = if frame.is_data() {
            eprintln!("[server] {id} data {:?}", frame.payload);
            Frame::data(id, frame.payload)
        } else if frame.path.is_some() {
            eprintln!("[server] {id} open {:?}", frame.path);
            Frame::data(id, Some(json!("welcome")))
        } else {
            eprintln!("[server] {id} close");
            Frame::close(id, Some(json!("goodbye")))
        };
        if endpoint.send(reply).await.is_err() {
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (client, server) = pair();
    // Subscribe before any client traffic so no frame is lost.
    let server_frames = server.subscribe();
    tokio::spawn(serve(server, server_frames));

    let mut status = Channel::attach(client.clone());
    let mut chat = Channel::attach(client.clone());

    status.open("/status", None).await?;
    chat.open("/chat", Some(json!({"nick": "ferris"}))).await?;

    eprintln!("[client] status greeting: {:?}", status.read().await?);
    eprintln!("[client] chat greeting:   {:?}", chat.read().await?);

    chat.send(Some(json!("hello over there"))).await?;
    eprintln!("[client] chat echo:       {:?}", chat.read().await?);

    chat.close(None).await?;
    eprintln!("[client] chat farewell:   {:?}", chat.read().await?);
    match chat.read().await {
        Err(err) => eprintln!("[client] chat terminated: {err}"),
        Ok(payload) => eprintln!("[client] unexpected payload: {payload:?}"),
    }

    // The status channel is untouched by the chat channel's lifecycle.
    status.send(Some(json!("still here"))).await?;
    eprintln!("[client] status echo:     {:?}", status.read().await?);

    Ok(())
}
