//! Typed operations on the chat server's resources.

use super::client::ApiClient;
use crate::error::Result;
use crate::model::{
    Booking, Chat, ChatMember, ConnectionCount, Message, NewBooking, NewChat, NewMessage,
    NewReaction, NewUser, Page, PageRequest, ParticipantId, Reaction, RoomId, User,
};

const NO_QUERY: [(&str, &str); 0] = [];

// Users
impl ApiClient {
    /// `POST /users`
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.post_json(&["users"], user).await
    }

    /// `GET /users/{id}`. `None` if no such user.
    pub async fn get_user(&self, id: ParticipantId) -> Result<Option<User>> {
        self.get_optional(&["users", &id.to_string()]).await
    }

    /// `GET /users/by-handle/{handle}`. `None` if no user has that handle.
    pub async fn get_user_by_handle(&self, handle: &str) -> Result<Option<User>> {
        self.get_optional(&["users", "by-handle", handle]).await
    }

    /// `GET /users`
    pub async fn list_users(&self, page: PageRequest) -> Result<Page<User>> {
        self.get_json(&["users"], &page.query()).await
    }
}

// Chats
impl ApiClient {
    /// `POST /chats`
    pub async fn create_chat(&self, chat: &NewChat) -> Result<Chat> {
        self.post_json(&["chats"], chat).await
    }

    /// `GET /chats/{id}`. `None` if no such chat.
    pub async fn get_chat(&self, id: RoomId) -> Result<Option<Chat>> {
        self.get_optional(&["chats", &id.to_string()]).await
    }

    /// `GET /chats`
    pub async fn list_chats(&self, page: PageRequest) -> Result<Page<Chat>> {
        self.get_json(&["chats"], &page.query()).await
    }

    /// `GET /chats/{id}/members`
    pub async fn list_members(&self, chat: RoomId, page: PageRequest) -> Result<Page<ChatMember>> {
        self.get_json(&["chats", &chat.to_string(), "members"], &page.query())
            .await
    }
}

// Messages and reactions
impl ApiClient {
    /// `POST /chats/{id}/messages`. Subscribers of the chat's realtime channel
    /// receive the stored message.
    pub async fn send_message(&self, chat: RoomId, message: &NewMessage) -> Result<Message> {
        self.post_json(&["chats", &chat.to_string(), "messages"], message)
            .await
    }

    /// `GET /chats/{id}/messages`, newest first.
    pub async fn list_messages(&self, chat: RoomId, page: PageRequest) -> Result<Page<Message>> {
        self.get_json(&["chats", &chat.to_string(), "messages"], &page.query())
            .await
    }

    /// `POST /messages/{id}/reactions`
    pub async fn add_reaction(&self, message_id: i64, reaction: &NewReaction) -> Result<Reaction> {
        self.post_json(&["messages", &message_id.to_string(), "reactions"], reaction)
            .await
    }

    /// `GET /messages/{id}/reactions`
    pub async fn list_reactions(
        &self,
        message_id: i64,
        page: PageRequest,
    ) -> Result<Page<Reaction>> {
        self.get_json(
            &["messages", &message_id.to_string(), "reactions"],
            &page.query(),
        )
        .await
    }

    /// `DELETE /messages/{id}/reactions?user_id=..&emoji=..`
    ///
    /// Returns `false` when the user had not reacted with that emoji.
    pub async fn remove_reaction(
        &self,
        message_id: i64,
        user_id: ParticipantId,
        emoji: &str,
    ) -> Result<bool> {
        let user_id = user_id.to_string();
        self.delete(
            &["messages", &message_id.to_string(), "reactions"],
            &[("user_id", user_id.as_str()), ("emoji", emoji)],
        )
        .await
    }
}

// Bookings
impl ApiClient {
    /// `POST /bookings/`
    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        self.post_json(&["bookings", ""], booking).await
    }

    /// `GET /bookings`. The server only fills `items` and `total_pages`.
    pub async fn list_bookings(&self, page: PageRequest) -> Result<Page<Booking>> {
        self.get_json(&["bookings"], &page.query()).await
    }

    /// `GET /bookings/{id}`. `None` if no such booking.
    pub async fn get_booking(&self, id: i64) -> Result<Option<Booking>> {
        self.get_optional(&["bookings", &id.to_string()]).await
    }
}

// Realtime
impl ApiClient {
    /// `GET /ws/chats/{id}/connections`: number of open realtime subscriptions
    /// to a chat.
    pub async fn active_connections(&self, chat: RoomId) -> Result<u64> {
        let count: ConnectionCount = self
            .get_json(&["ws", "chats", &chat.to_string(), "connections"], &NO_QUERY)
            .await?;
        Ok(count.active_connections)
    }
}
