//! Wire records shared by the REST client and the realtime channel.
//!
//! Timestamps are kept as the server's strings. The channel passes messages
//! through untouched, and the server emits naive ISO-8601 values that a strict
//! RFC 3339 parser would reject.

use serde::{Deserialize, Serialize};

/// Identifier of a chat room.
pub type RoomId = i64;

/// Identifier of a user taking part in a room.
pub type ParticipantId = i64;

/// A chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: i64,
    /// Room the message belongs to.
    pub chat_id: RoomId,
    /// Author, or `None` for system messages and deleted users.
    pub sender_id: Option<ParticipantId>,
    /// Message text.
    pub body: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last edit timestamp.
    #[serde(default)]
    pub edited_at: Option<String>,
    /// Id of the message this one replies to.
    #[serde(default)]
    pub reply_to_id: Option<i64>,
}

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: ParticipantId,
    pub handle: String,
    pub display_name: String,
    pub created_at: String,
}

/// Kind of chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// Direct message between two users.
    Dm,
    /// Group conversation.
    Group,
}

/// A chat room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: RoomId,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub title: Option<String>,
    pub created_at: String,
}

/// Membership of a user in a chat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    pub chat_id: RoomId,
    pub user_id: ParticipantId,
    pub role: String,
    pub joined_at: String,
}

/// An emoji reaction to a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: i64,
    pub user_id: ParticipantId,
    pub emoji: String,
    pub created_at: String,
}

/// A booking attached to a chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub chat_id: RoomId,
    pub user_id: ParticipantId,
    pub message_id: i64,
    pub booking_type: String,
    pub booking_date: String,
    pub status: String,
    pub created_at: String,
}

/// Payload for creating a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub chat_id: RoomId,
    pub user_id: ParticipantId,
    pub message_id: i64,
    pub booking_type: String,
    pub booking_date: String,
}

/// Payload for registering a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub handle: String,
    pub display_name: String,
}

impl NewUser {
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: display_name.into(),
        }
    }
}

/// Payload for creating a chat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChat {
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub title: Option<String>,
    /// Users to add as members.
    #[serde(default)]
    pub members: Vec<ParticipantId>,
}

impl NewChat {
    /// A direct-message chat between the given users.
    pub fn dm(members: impl IntoIterator<Item = ParticipantId>) -> Self {
        Self {
            chat_type: ChatType::Dm,
            title: None,
            members: members.into_iter().collect(),
        }
    }

    /// A titled group chat.
    pub fn group(
        title: impl Into<String>,
        members: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        Self {
            chat_type: ChatType::Group,
            title: Some(title.into()),
            members: members.into_iter().collect(),
        }
    }
}

/// Payload for posting a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub body: String,
    pub sender_id: ParticipantId,
    #[serde(default)]
    pub reply_to_id: Option<i64>,
}

impl NewMessage {
    pub fn new(sender_id: ParticipantId, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            sender_id,
            reply_to_id: None,
        }
    }

    /// Mark the message as a reply.
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_id = Some(message_id);
        self
    }
}

/// Payload for reacting to a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReaction {
    pub emoji: String,
    pub user_id: ParticipantId,
}

impl NewReaction {
    pub fn new(user_id: ParticipantId, emoji: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            user_id,
        }
    }
}

/// Number of realtime subscribers currently attached to a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCount {
    pub chat_id: RoomId,
    pub active_connections: u64,
}

/// One page of a paginated listing.
///
/// Some listings (bookings) only report `items` and `total_pages`; the other
/// counters then default to zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Paging parameters sent as `page` / `page_size` query parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Largest page size the server accepts.
    pub const MAX_PAGE_SIZE: u32 = 250;

    /// Create a paging request. Zero page numbers become 1 and page sizes are
    /// clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// The request for the following page.
    pub fn next(self) -> Self {
        Self::new(self.page + 1, self.page_size)
    }

    pub(crate) fn query(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 50)
    }
}
