//! Tests for the REST API client against a mock server.

use chatline_net::{
    ApiClient, ChatType, NetworkError, NewBooking, NewChat, NewMessage, NewReaction, NewUser,
    PageRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "chat_id": 42,
        "sender_id": 7,
        "body": "hello",
        "created_at": "2024-05-02T10:11:12.345678",
        "edited_at": null,
        "reply_to_id": null
    })
}

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri()).expect("Failed to build client")
}

#[test]
fn test_builder_options() {
    let client = ApiClient::builder("https://chat.example.com/")
        .bearer_auth("token")
        .timeout(std::time::Duration::from_secs(5))
        .user_agent("chatline-tests/1.0")
        .build()
        .expect("Failed to build client");

    assert_eq!(client.base_url(), "https://chat.example.com");
}

#[tokio::test]
async fn test_create_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({"handle": "alice", "display_name": "Alice"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7,
            "handle": "alice",
            "display_name": "Alice",
            "created_at": "2024-01-01T00:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client_for(&server)
        .await
        .create_user(&NewUser::new("alice", "Alice"))
        .await
        .unwrap();

    assert_eq!(user.id, 7);
    assert_eq!(user.handle, "alice");
}

#[tokio::test]
async fn test_get_user_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "user not found"})))
        .mount(&server)
        .await;

    let user = client_for(&server).await.get_user(99).await.unwrap();
    assert_eq!(user, None);
}

#[tokio::test]
async fn test_get_user_by_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/by-handle/bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "handle": "bob",
            "display_name": "Bob",
            "created_at": "2024-01-01T00:00:00"
        })))
        .mount(&server)
        .await;

    let user = client_for(&server)
        .await
        .get_user_by_handle("bob")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(user.display_name, "Bob");
}

#[tokio::test]
async fn test_list_users_sends_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "250"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "total": 251,
            "page": 2,
            "page_size": 250,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .await
        .list_users(PageRequest::new(2, 1000))
        .await
        .unwrap();

    assert_eq!(page.total, 251);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_create_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats"))
        .and(body_json(json!({"type": "group", "title": "ops", "members": [7, 8]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42,
            "type": "group",
            "title": "ops",
            "created_at": "2024-01-01T00:00:00"
        })))
        .mount(&server)
        .await;

    let chat = client_for(&server)
        .await
        .create_chat(&NewChat::group("ops", [7, 8]))
        .await
        .unwrap();

    assert_eq!(chat.id, 42);
    assert_eq!(chat.chat_type, ChatType::Group);
}

#[tokio::test]
async fn test_list_members() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/42/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"chat_id": 42, "user_id": 7, "role": "member", "joined_at": "2024-01-01T00:00:00"}
            ],
            "total": 1,
            "page": 1,
            "page_size": 50,
            "total_pages": 1
        })))
        .mount(&server)
        .await;

    let page = client_for(&server)
        .await
        .list_members(42, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].user_id, 7);
}

#[tokio::test]
async fn test_send_and_list_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats/42/messages"))
        .and(body_json(json!({"body": "hello", "sender_id": 7, "reply_to_id": null})))
        .respond_with(ResponseTemplate::new(201).set_body_json(message_json(1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chats/42/messages"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [message_json(2), message_json(1)],
            "total": 2,
            "page": 1,
            "page_size": 50,
            "total_pages": 1
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let sent = client
        .send_message(42, &NewMessage::new(7, "hello"))
        .await
        .unwrap();
    assert_eq!(sent.id, 1);
    assert_eq!(sent.created_at, "2024-05-02T10:11:12.345678");

    let page = client
        .list_messages(42, PageRequest::default())
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_reactions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/5/reactions"))
        .and(body_json(json!({"emoji": "👍", "user_id": 7})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message_id": 5,
            "user_id": 7,
            "emoji": "👍",
            "created_at": "2024-01-01T00:00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/messages/5/reactions"))
        .and(query_param("user_id", "7"))
        .and(query_param("emoji", "👍"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"removed": true})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/messages/5/reactions"))
        .and(query_param("emoji", "🎉"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "reaction not found"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let reaction = client
        .add_reaction(5, &NewReaction::new(7, "👍"))
        .await
        .unwrap();
    assert_eq!(reaction.emoji, "👍");

    assert!(client.remove_reaction(5, 7, "👍").await.unwrap());
    assert!(!client.remove_reaction(5, 7, "🎉").await.unwrap());
}

#[tokio::test]
async fn test_bookings() {
    let server = MockServer::start().await;
    let booking = json!({
        "id": 3,
        "chat_id": 42,
        "user_id": 7,
        "message_id": 1,
        "booking_type": "meeting",
        "booking_date": "2024-06-01T09:00:00",
        "status": "pending",
        "created_at": "2024-05-02T10:11:12"
    });
    Mock::given(method("POST"))
        .and(path("/bookings/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(booking.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bookings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [booking.clone()], "total_pages": 1})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bookings/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(booking))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bookings/4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let created = client
        .create_booking(&NewBooking {
            chat_id: 42,
            user_id: 7,
            message_id: 1,
            booking_type: "meeting".into(),
            booking_date: "2024-06-01T09:00:00".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.status, "pending");

    let page = client.list_bookings(PageRequest::default()).await.unwrap();
    assert_eq!(page.items, vec![created.clone()]);
    assert_eq!(page.total_pages, 1);

    assert_eq!(client.get_booking(3).await.unwrap(), Some(created));
    assert_eq!(client.get_booking(4).await.unwrap(), None);
}

#[tokio::test]
async fn test_active_connections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/chats/42/connections"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"chat_id": 42, "active_connections": 3})),
        )
        .mount(&server)
        .await;

    let count = client_for(&server).await.active_connections(42).await.unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_bearer_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/1"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "type": "dm",
            "title": null,
            "created_at": "2024-01-01T00:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::builder(server.uri())
        .bearer_auth("secret")
        .build()
        .unwrap();
    let chat = client.get_chat(1).await.unwrap().expect("chat should exist");
    assert_eq!(chat.chat_type, ChatType::Dm);
}

#[tokio::test]
async fn test_error_status_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats/42/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "sender not in chat"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chats"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .send_message(42, &NewMessage::new(9, "hi"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NetworkError::HttpStatus {
            status: 400,
            message: Some("sender not in chat".into()),
        }
    );
    assert_eq!(err.status(), Some(400));

    let err = client.list_chats(PageRequest::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "HTTP 500: boom");
}
