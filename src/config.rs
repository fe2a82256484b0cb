use std::time::Duration;

/// Connection and timing knobs for a [`crate::client::TableClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the lobby's request/response API.
    pub http_base: String,
    /// WebSocket endpoint of the push channels.
    pub ws_url: String,
    /// First reconnect delay; doubles per attempt up to `backoff_max`.
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    pub max_reconnect_attempts: u32,
    /// Sampling interval for the action deadline fraction.
    pub deadline_tick: Duration,
    /// Capacity of the inbound session event channel.
    pub event_buffer: usize,
}

impl ClientConfig {
    pub fn new(http_base: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http_base: http_base.into(),
            ws_url: ws_url.into(),
            backoff_initial: Duration::from_millis(500),
            backoff_max: Duration::from_secs(15),
            max_reconnect_attempts: 8,
            deadline_tick: Duration::from_millis(100),
            event_buffer: 256,
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff_initial = initial;
        self.backoff_max = max;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_deadline_tick(mut self, tick: Duration) -> Self {
        self.deadline_tick = tick;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}
