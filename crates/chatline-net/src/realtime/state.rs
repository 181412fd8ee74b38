//! Channel state and close codes.

/// Current state of a [`RealtimeChannel`](super::RealtimeChannel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// Never connected.
    #[default]
    Idle,
    /// Opening a transport to the room endpoint.
    Connecting,
    /// Transport open; frames are flowing.
    Open,
    /// Connection lost unexpectedly; waiting out the backoff delay.
    Reconnecting,
    /// Tearing down the previous room's transport before switching rooms.
    Closing,
    /// Disconnected, either on request or because the reconnection policy gave up.
    Closed,
}

impl ChannelState {
    /// Whether an attempt to open a transport is in flight. `Reconnecting`
    /// only waits out a delay and does not count.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Connecting | Self::Closing)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// WebSocket close codes (RFC 6455) the channel cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CloseCode {
    /// Normal closure.
    #[default]
    Normal,
    /// Endpoint is going away.
    Away,
    /// Connection dropped without a close frame.
    Abnormal,
    /// Policy violation (the server uses it for unknown rooms).
    Policy,
    /// Server-side failure.
    Error,
    /// Any other code.
    Other(u16),
}

impl CloseCode {
    /// Convert to the numeric close code.
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::Away => 1001,
            Self::Abnormal => 1006,
            Self::Policy => 1008,
            Self::Error => 1011,
            Self::Other(code) => *code,
        }
    }

    /// Create from a numeric close code.
    pub fn from_u16(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::Away,
            1006 => Self::Abnormal,
            1008 => Self::Policy,
            1011 => Self::Error,
            code => Self::Other(code),
        }
    }

    /// Normal and going-away closes end the session without reconnecting.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Normal | Self::Away)
    }
}

/// Reason for closing a connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloseReason {
    /// The close status code.
    pub code: CloseCode,
    /// Optional human-readable reason string.
    pub reason: Option<String>,
}

impl CloseReason {
    /// Create a close reason with just a code.
    pub fn new(code: CloseCode) -> Self {
        Self { code, reason: None }
    }

    /// Create a close reason with a code and message.
    pub fn with_reason(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: Some(reason.into()),
        }
    }

    /// Create a normal close reason.
    pub fn normal() -> Self {
        Self::new(CloseCode::Normal)
    }

    /// A transport that vanished without a close frame.
    pub fn abnormal() -> Self {
        Self::new(CloseCode::Abnormal)
    }
}
