//! Acknowledgement tracker for "customer waiting" notifications
//!
//! The waiting topic is subscribed in client-individual ack mode for
//! at-least-once delivery: a notification counts as processed only once an
//! agent selects that customer. Until then the raw ack handle is parked
//! here, at most one per customer (last write wins on redelivery).

use std::collections::HashMap;

use relaydesk_stomp::AckHandle;

/// Unacknowledged waiting notifications keyed by customer id
#[derive(Debug, Default)]
pub struct AckTracker {
    pending: HashMap<String, AckHandle>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park the ack handle for a customer, replacing any prior handle for
    /// the same customer. The replaced handle is dropped unacked; the
    /// broker will redeliver on reconnect if it still cares.
    pub fn record_pending(&mut self, customer_id: &str, handle: AckHandle) {
        if let Some(old) = self.pending.insert(customer_id.to_string(), handle) {
            tracing::debug!(
                customer_id = %customer_id,
                replaced_ack = %old.ack_id(),
                "Replaced pending waiting notification"
            );
        }
    }

    /// Acknowledge the parked notification for a customer, exactly once.
    /// No-op when nothing is pending. Acknowledgement failures are logged,
    /// never propagated: a stale handle must not block the selection flow.
    pub fn acknowledge(&mut self, customer_id: &str) {
        let Some(handle) = self.pending.remove(customer_id) else {
            return;
        };
        if let Err(e) = handle.ack() {
            tracing::warn!(
                customer_id = %customer_id,
                error = %e,
                "Failed to acknowledge waiting notification"
            );
        } else {
            tracing::debug!(customer_id = %customer_id, "Acknowledged waiting notification");
        }
    }

    pub fn has_pending(&self, customer_id: &str) -> bool {
        self.pending.contains_key(customer_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all parked handles without acking, e.g. when the transport
    /// they belong to has gone away
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
