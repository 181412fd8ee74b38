//! Client library for a realtime chat server.
//!
//! This crate provides:
//!
//! - **Realtime channel**: a reconnecting WebSocket subscription to one chat
//!   room that delivers new messages to an observer
//! - **REST client**: typed access to users, chats, messages, reactions and
//!   bookings
//!
//! # Realtime Channel
//!
//! ```ignore
//! use chatline_net::realtime::{ChannelConfig, RealtimeChannel};
//! use chatline_net::EndpointConfig;
//!
//! let channel = RealtimeChannel::new(ChannelConfig::new(EndpointConfig::from_env()));
//!
//! channel.on_message(|message| {
//!     println!("{:?}: {}", message.sender_id, message.body);
//! });
//! channel.on_error(|error| {
//!     eprintln!("realtime error: {error}");
//! });
//!
//! // Resolves once the socket is open
//! channel.connect(42, Some(7)).await?;
//!
//! // Switching rooms closes the old socket first
//! channel.connect(43, Some(7)).await?;
//!
//! channel.disconnect();
//! ```
//!
//! ## Reconnection
//!
//! Unexpected closes are retried with linear backoff (1s, 2s, 3s, ...) up to 5
//! times by default. Clean closes (1000, 1001) and `disconnect()` never
//! reconnect.
//!
//! ```ignore
//! let config = ChannelConfig::new(endpoint)
//!     .connect_timeout(Duration::from_secs(5))
//!     .reconnect_config(ReconnectConfig::new().max_attempts(10))
//!     .heartbeat(Duration::from_secs(30));
//! ```
//!
//! # REST Client
//!
//! ```ignore
//! use chatline_net::api::ApiClient;
//! use chatline_net::{NewMessage, PageRequest};
//!
//! let client = ApiClient::new("http://localhost:8000")?;
//! client.send_message(42, &NewMessage::new(7, "hello")).await?;
//!
//! let page = client.list_messages(42, PageRequest::new(1, 20)).await?;
//! ```
//!
//! # Configuration
//!
//! [`EndpointConfig::from_env`] reads `CHATLINE_API_URL`, `CHATLINE_WS_URL`
//! and `CHATLINE_DEV`.

pub mod api;
pub mod config;
mod error;
pub mod model;
pub mod realtime;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use api::{ApiClient, ApiClientBuilder};
pub use config::EndpointConfig;
pub use model::{
    Booking, Chat, ChatMember, ChatType, ConnectionCount, Message, NewBooking, NewChat,
    NewMessage, NewReaction, NewUser, Page, PageRequest, ParticipantId, Reaction, RoomId, User,
};
pub use realtime::{ChannelConfig, ChannelState, RealtimeChannel, ReconnectConfig};
