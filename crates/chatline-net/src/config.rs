//! Endpoint configuration for the REST API and the realtime socket.
//!
//! The WebSocket base URL is resolved in this order:
//!
//! 1. an explicit override ([`EndpointConfig::ws_base`]),
//! 2. the development default (`ws://localhost:8000`) when development mode is on,
//! 3. the API base URL with its scheme upgraded (`http` → `ws`, `https` → `wss`).

use url::Url;

use crate::error::{NetworkError, Result};
use crate::model::{ParticipantId, RoomId};

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// WebSocket base used in development mode.
pub const DEV_WS_URL: &str = "ws://localhost:8000";

/// Environment variable holding the REST API base URL.
pub const ENV_API_URL: &str = "CHATLINE_API_URL";
/// Environment variable holding an explicit WebSocket base URL.
pub const ENV_WS_URL: &str = "CHATLINE_WS_URL";
/// Environment variable enabling development mode (`1` or `true`).
pub const ENV_DEV: &str = "CHATLINE_DEV";

/// Where the client finds its server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    /// REST API base URL.
    pub api_base: String,
    /// Explicit WebSocket base URL. Takes precedence over everything else.
    pub ws_base: Option<String>,
    /// Use the development WebSocket default when no override is set.
    pub development: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl EndpointConfig {
    /// Create a configuration for the given API base URL.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(api_base.into()),
            ws_base: None,
            development: false,
        }
    }

    /// Build a configuration from `CHATLINE_API_URL`, `CHATLINE_WS_URL` and
    /// `CHATLINE_DEV`. Blank values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::new(non_blank(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.into()));
        config.ws_base = non_blank(ENV_WS_URL).map(normalize_base);
        config.development = non_blank(ENV_DEV)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        config
    }

    /// Set an explicit WebSocket base URL.
    pub fn ws_base(mut self, url: impl Into<String>) -> Self {
        self.ws_base = Some(normalize_base(url.into()));
        self
    }

    /// Enable or disable development mode.
    pub fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Resolve the WebSocket base URL.
    pub fn resolve_ws_base(&self) -> Result<String> {
        if let Some(base) = &self.ws_base {
            return Ok(base.clone());
        }
        if self.development {
            return Ok(DEV_WS_URL.to_string());
        }
        upgrade_scheme(&self.api_base)
    }

    /// Build the room subscription URL: `<ws-base>/ws/chats/<room>[?user_id=<participant>]`.
    pub fn room_url(&self, room: RoomId, participant: Option<ParticipantId>) -> Result<Url> {
        let base = self.resolve_ws_base()?;
        let mut url = Url::parse(&format!("{base}/ws/chats/{room}"))?;
        if let Some(participant) = participant {
            url.query_pairs_mut()
                .append_pair("user_id", &participant.to_string());
        }
        Ok(url)
    }
}

fn normalize_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Swap an HTTP(S) base for its WebSocket counterpart, keeping host and path.
fn upgrade_scheme(base: &str) -> Result<String> {
    if let Some(rest) = base.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        Ok(base.to_string())
    } else {
        Err(NetworkError::InvalidUrl(format!(
            "cannot derive a WebSocket URL from '{base}'"
        )))
    }
}
