//! REST client for the chat server.
//!
//! [`ApiClient`] wraps `reqwest` with base URL handling, optional bearer
//! authentication and typed operations for users, chats, messages, reactions
//! and bookings. Listings are paginated with [`PageRequest`](crate::PageRequest);
//! single-resource lookups return `Ok(None)` on 404.
//!
//! # Example
//!
//! ```ignore
//! use chatline_net::api::ApiClient;
//! use chatline_net::{NewChat, NewUser};
//!
//! let client = ApiClient::new("http://localhost:8000")?;
//!
//! let alice = client.create_user(&NewUser::new("alice", "Alice")).await?;
//! let bob = client.create_user(&NewUser::new("bob", "Bob")).await?;
//! let chat = client.create_chat(&NewChat::dm([alice.id, bob.id])).await?;
//!
//! println!("{} listening", client.active_connections(chat.id).await?);
//! ```

mod client;
mod endpoints;

pub use client::{ApiClient, ApiClientBuilder};
