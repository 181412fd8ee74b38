//! Duplex transport abstraction and its WebSocket implementation.
//!
//! [`RealtimeChannel`](super::RealtimeChannel) only talks to a [`Connector`],
//! which opens a [`Transport`] for a room URL. [`WsConnector`] is the
//! production implementation on top of `tokio-tungstenite`; tests plug in
//! in-memory transports.

use std::collections::HashMap;
use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as TungsteniteCloseCode;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::state::{CloseCode, CloseReason};
use crate::error::{NetworkError, Result};

const TARGET: &str = "chatline_net::realtime";

/// Something that happened on an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A complete text payload.
    Text(String),
    /// The peer closed the connection, or it dropped.
    Closed(CloseReason),
    /// The transport failed. No further events follow.
    Error(NetworkError),
}

/// An open duplex connection carrying text frames.
///
/// After [`next_event`](Self::next_event) yields [`TransportEvent::Closed`] or
/// [`TransportEvent::Error`] the transport is not polled again.
pub trait Transport: Send + 'static {
    /// Wait for the next inbound event. Must be cancel-safe.
    fn next_event(&mut self) -> impl Future<Output = TransportEvent> + Send;

    /// Send a text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection with the given reason.
    fn close(&mut self, reason: CloseReason) -> impl Future<Output = Result<()>> + Send;
}

/// Opens transports to room endpoints.
pub trait Connector: Send + Sync + 'static {
    /// The transport this connector produces.
    type Transport: Transport;

    /// Open a transport. Resolves once the connection is usable.
    fn connect(&self, url: &Url) -> impl Future<Output = Result<Self::Transport>> + Send;
}

/// Opens WebSocket connections, sending extra handshake headers.
#[derive(Clone, Debug, Default)]
pub struct WsConnector {
    headers: HashMap<String, String>,
}

impl WsConnector {
    /// Create a connector with no extra headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector that sends the given handshake headers.
    pub fn with_headers(headers: HashMap<String, String>) -> Self {
        Self { headers }
    }

    /// Build the WebSocket request with custom headers.
    fn build_request(
        &self,
        url: &Url,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = url.as_str().into_client_request()?;

        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            let header_name = http::header::HeaderName::try_from(name.as_str())?;
            let header_value = http::header::HeaderValue::try_from(value.as_str())?;
            headers.insert(header_name, header_value);
        }

        Ok(request)
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &Url) -> Result<WsTransport> {
        let request = self.build_request(url)?;
        let (stream, response) = tokio_tungstenite::connect_async(request).await?;
        tracing::debug!(target: TARGET, %url, status = %response.status(), "websocket handshake complete");
        Ok(WsTransport { stream })
    }
}

/// A WebSocket connection produced by [`WsConnector`].
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return TransportEvent::Text(text.as_str().to_owned());
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    tracing::trace!(target: TARGET, len = data.len(), "ignoring binary frame");
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    return TransportEvent::Closed(close_reason(frame));
                }
                // Pong is sent automatically by tungstenite
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => return TransportEvent::Error(e.into()),
                None => return TransportEvent::Closed(CloseReason::abnormal()),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(WsMessage::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self, reason: CloseReason) -> Result<()> {
        let frame = CloseFrame {
            code: TungsteniteCloseCode::from(reason.code.as_u16()),
            reason: reason.reason.unwrap_or_default().into(),
        };
        self.stream.close(Some(frame)).await?;
        Ok(())
    }
}

/// A close frame without a payload means "no status received" (1005).
fn close_reason(frame: Option<CloseFrame>) -> CloseReason {
    match frame {
        Some(frame) => {
            let code = CloseCode::from_u16(u16::from(frame.code));
            let reason = frame.reason.as_str();
            if reason.is_empty() {
                CloseReason::new(code)
            } else {
                CloseReason::with_reason(code, reason)
            }
        }
        None => CloseReason::new(CloseCode::Other(1005)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_with_headers() {
        let connector = WsConnector::with_headers(HashMap::from([(
            "Authorization".to_string(),
            "Bearer token".to_string(),
        )]));
        let url = Url::parse("ws://localhost:8000/ws/chats/1").unwrap();
        let request = connector.build_request(&url).unwrap();

        assert_eq!(request.uri(), "ws://localhost:8000/ws/chats/1");
        assert_eq!(
            request.headers().get("Authorization").unwrap(),
            "Bearer token"
        );
    }

    #[test]
    fn test_build_request_rejects_bad_header() {
        let connector = WsConnector::with_headers(HashMap::from([(
            "bad header".to_string(),
            "x".to_string(),
        )]));
        let url = Url::parse("ws://localhost:8000/ws/chats/1").unwrap();
        assert!(matches!(
            connector.build_request(&url),
            Err(NetworkError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_close_reason_mapping() {
        let reason = close_reason(Some(CloseFrame {
            code: TungsteniteCloseCode::Policy,
            reason: "Chat not found".into(),
        }));
        assert_eq!(
            reason,
            CloseReason::with_reason(CloseCode::Policy, "Chat not found")
        );

        let reason = close_reason(Some(CloseFrame {
            code: TungsteniteCloseCode::Normal,
            reason: "".into(),
        }));
        assert_eq!(reason, CloseReason::normal());

        assert_eq!(close_reason(None).code, CloseCode::Other(1005));
    }
}
