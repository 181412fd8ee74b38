//! Configuration types for the realtime channel.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::EndpointConfig;

/// How the delay between reconnection attempts grows.
#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    /// `base_delay * attempt`.
    Linear,
    /// `base_delay * multiplier^(attempt - 1)`, capped at `max_delay`, with an
    /// optional ±10% jitter.
    Exponential {
        /// Growth factor per attempt.
        multiplier: f64,
        /// Upper bound on any single delay.
        max_delay: Duration,
        /// Randomise each delay by up to ±10%.
        jitter: bool,
    },
}

/// Configuration for automatic reconnection.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts after an unexpected close.
    pub max_attempts: u32,
    /// Delay unit for the backoff policy.
    pub base_delay: Duration,
    /// Growth policy.
    pub backoff: Backoff,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            backoff: Backoff::Linear,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of reconnection attempts. Zero disables reconnection.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base delay.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Switch to exponential backoff.
    pub fn exponential(mut self, multiplier: f64, max_delay: Duration, jitter: bool) -> Self {
        self.backoff = Backoff::Exponential {
            multiplier,
            max_delay,
            jitter,
        };
        self
    }

    /// Calculate the delay before the given attempt (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match &self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential {
                multiplier,
                max_delay,
                jitter,
            } => {
                let base_delay_ms = self.base_delay.as_millis() as f64;
                let delay_ms = base_delay_ms * multiplier.powi(attempt as i32 - 1);
                let delay_ms = delay_ms.min(max_delay.as_millis() as f64) as u64;

                if !jitter {
                    return Duration::from_millis(delay_ms);
                }

                let jitter_range = (delay_ms as f64 * 0.1) as i64;
                let offset = if jitter_range > 0 {
                    rand::random::<i64>().rem_euclid(jitter_range * 2 + 1) - jitter_range
                } else {
                    0
                };
                Duration::from_millis((delay_ms as i64 + offset).max(0) as u64)
            }
        }
    }
}

/// Configuration for a [`RealtimeChannel`](super::RealtimeChannel).
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Where room endpoints live.
    pub endpoint: EndpointConfig,
    /// How long a connection attempt may take before it fails.
    pub connect_timeout: Duration,
    /// Reconnection policy.
    pub reconnect: ReconnectConfig,
    /// Send a ping frame on this interval while open. `None` disables it.
    pub heartbeat_interval: Option<Duration>,
    /// How long a room switch waits for the old transport to close.
    pub close_timeout: Duration,
    /// Custom headers to send during the handshake.
    pub headers: HashMap<String, String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(EndpointConfig::default())
    }
}

impl ChannelConfig {
    /// Create a configuration with default timings for the given endpoints.
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
            heartbeat_interval: None,
            close_timeout: Duration::from_secs(1),
            headers: HashMap::new(),
        }
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the reconnection policy.
    pub fn reconnect_config(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Send a ping frame on the given interval while open.
    pub fn heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Set how long a room switch waits for the old transport to close.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Add a custom header for the WebSocket handshake.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
