//! JSON text frames exchanged with the room endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NetworkError, Result};
use crate::model::{Message, RoomId};

/// A frame received from the server, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Server acknowledged the subscription.
    Connection {
        status: String,
        #[serde(default)]
        chat_id: Option<RoomId>,
    },
    /// A message was posted to the room.
    NewMessage { message: Message },
    /// Heartbeat reply.
    Pong,
    /// A frame type this client does not know. Ignored.
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Decode a text payload.
    ///
    /// Older servers tag frames with `kind` instead of `type`; both are accepted,
    /// `type` winning when both are present.
    pub fn decode(text: &str) -> Result<Self> {
        let mut value: Value =
            serde_json::from_str(text).map_err(|e| NetworkError::Decode(e.to_string()))?;

        if let Value::Object(map) = &mut value
            && !map.contains_key("type")
            && let Some(kind) = map.remove("kind")
        {
            map.insert("type".to_string(), kind);
        }

        serde_json::from_value(value).map_err(|e| NetworkError::Decode(e.to_string()))
    }
}

/// A frame sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Heartbeat request; the server answers with [`InboundFrame::Pong`].
    Ping,
}

impl OutboundFrame {
    /// Encode as a JSON text payload.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_MESSAGE: &str = r#"{"type":"new_message","message":{"id":1,"chat_id":42,"sender_id":7,"body":"hi","created_at":"2024-01-01T00:00:00Z","edited_at":null,"reply_to_id":null}}"#;

    #[test]
    fn test_decode_new_message() {
        match InboundFrame::decode(NEW_MESSAGE).unwrap() {
            InboundFrame::NewMessage { message } => {
                assert_eq!(message.id, 1);
                assert_eq!(message.chat_id, 42);
                assert_eq!(message.sender_id, Some(7));
                assert_eq!(message.body, "hi");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_connection_ack() {
        let frame = InboundFrame::decode(
            r#"{"type":"connection","status":"connected","chat_id":42,"message":"Connected to chat"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            InboundFrame::Connection {
                status: "connected".into(),
                chat_id: Some(42),
            }
        );
    }

    #[test]
    fn test_decode_pong_and_unknown() {
        assert_eq!(InboundFrame::decode(r#"{"type":"pong"}"#).unwrap(), InboundFrame::Pong);
        assert_eq!(
            InboundFrame::decode(r#"{"type":"typing","user_id":3}"#).unwrap(),
            InboundFrame::Unknown
        );
    }

    #[test]
    fn test_decode_kind_tag() {
        let text = NEW_MESSAGE.replacen("\"type\"", "\"kind\"", 1);
        assert!(matches!(
            InboundFrame::decode(&text).unwrap(),
            InboundFrame::NewMessage { .. }
        ));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            InboundFrame::decode("{not json"),
            Err(NetworkError::Decode(_))
        ));
        // new_message without its payload
        assert!(matches!(
            InboundFrame::decode(r#"{"type":"new_message"}"#),
            Err(NetworkError::Decode(_))
        ));
        // untagged payload
        assert!(matches!(
            InboundFrame::decode(r#"{"status":"connected"}"#),
            Err(NetworkError::Decode(_))
        ));
        assert!(matches!(
            InboundFrame::decode("[1,2,3]"),
            Err(NetworkError::Decode(_))
        ));
    }

    #[test]
    fn test_encode_ping() {
        assert_eq!(OutboundFrame::Ping.encode().unwrap(), r#"{"type":"ping"}"#);
    }
}
