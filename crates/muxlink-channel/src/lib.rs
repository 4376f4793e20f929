//! Channel multiplexing over a single duplex message connection.
//!
//! Many independent logical conversations share one physical connection.
//! Each [`Channel`] is bound to a correlation id and sees only the inbound
//! frames tagged with that id; everything else passes through untouched for
//! other channels. Consumers pull payloads with [`Channel::read`], which
//! races the next message against the channel's close signal and an
//! optional per-call timeout.
//!
//! The connection itself is an external collaborator reached through the
//! [`Connection`] trait — this crate never performs I/O.

pub mod channel;
pub mod close;
pub mod connection;
pub mod error;

pub use channel::Channel;
pub use close::CloseReason;
pub use connection::Connection;
pub use error::{ChannelError, Result};
