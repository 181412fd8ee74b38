//! Realtime subscription to a chat room.
//!
//! A [`RealtimeChannel`] keeps one WebSocket open to `/ws/chats/<room>` and
//! delivers every `new_message` frame to a single message observer. It supports:
//! - One room at a time; switching rooms closes the old connection first
//! - Automatic reconnection after unexpected closes (linear backoff, 5 attempts by default)
//! - A connect timeout
//! - Optional heartbeat pings
//! - Custom handshake headers
//!
//! # Example
//!
//! ```ignore
//! use chatline_net::realtime::{ChannelConfig, RealtimeChannel};
//! use chatline_net::EndpointConfig;
//!
//! let config = ChannelConfig::new(EndpointConfig::from_env())
//!     .heartbeat(Duration::from_secs(30));
//! let channel = RealtimeChannel::new(config);
//!
//! channel.on_message(|message| {
//!     println!("#{} {}", message.id, message.body);
//! });
//!
//! channel.connect(42, Some(7)).await?;
//! ```

mod channel;
mod config;
mod frame;
mod observer;
mod state;
mod transport;

pub use channel::RealtimeChannel;
pub use config::{Backoff, ChannelConfig, ReconnectConfig};
pub use frame::{InboundFrame, OutboundFrame};
pub use state::{ChannelState, CloseCode, CloseReason};
pub use transport::{Connector, Transport, TransportEvent, WsConnector, WsTransport};
