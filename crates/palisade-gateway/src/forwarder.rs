//! Event forwarding to enterprise log/event sinks.
//!
//! Acknowledgment-only: the forwarder reports the full input count as
//! accepted without a real downstream check. This semantic is preserved
//! until a real downstream integration is specified.

use serde_json::Value;

use palisade_core::Result;

/// Relays assessment events to a named downstream platform.
#[derive(Debug, Default, Clone)]
pub struct EventForwarder;

impl EventForwarder {
    /// Creates the forwarder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Forwards an ordered batch of opaque events to `platform`, returning
    /// the count of events accepted for forwarding.
    ///
    /// # Errors
    ///
    /// The stub never fails; the `Result` is the seam a real downstream
    /// client will need.
    pub async fn forward(&self, platform: &str, events: &[Value]) -> Result<usize> {
        tracing::info!(
            platform = platform,
            events = events.len(),
            "forwarding assessment events"
        );
        Ok(events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn forward_acknowledges_full_batch() {
        let forwarder = EventForwarder::new();
        let events = vec![json!({"kind": "finding"}), json!({"kind": "finding"})];
        let accepted = forwarder.forward("splunk", &events).await.expect("forward");
        assert_eq!(accepted, 2);
    }

    #[tokio::test]
    async fn forward_accepts_empty_batch() {
        let forwarder = EventForwarder::new();
        let accepted = forwarder.forward("sentinel", &[]).await.expect("forward");
        assert_eq!(accepted, 0);
    }
}
