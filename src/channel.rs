//! Command channel seam.
//!
//! The transport that carries commands to the robot lives outside this
//! crate. It only has to report whether it is connected and accept a
//! payload for a topic; reconnection and retry are its own business.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use crate::error::PublishError;

/// Outbound command transport.
pub trait CommandChannel {
    /// Whether a publish is currently possible.
    fn is_connected(&self) -> bool;

    /// Send `payload` (JSON text) on `topic`.
    ///
    /// # Errors
    ///
    /// Implementations return [`PublishError::Channel`] when the transport
    /// rejects the message.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError>;
}

/// A message captured by [`MemoryChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
}

/// In-process channel that records every publish.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    pub connected: bool,
    /// When set, every publish fails with this message.
    pub fail_with: Option<String>,
    pub sent: Vec<Published>,
}

impl MemoryChannel {
    /// A connected channel with nothing sent.
    #[must_use]
    pub fn connected() -> Self {
        Self { connected: true, ..Self::default() }
    }
}

impl CommandChannel for MemoryChannel {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        if let Some(reason) = &self.fail_with {
            return Err(PublishError::Channel(reason.clone()));
        }
        self.sent.push(Published { topic: topic.to_owned(), payload: payload.to_owned() });
        Ok(())
    }
}
