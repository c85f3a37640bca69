//! Ingest task channel
//!
//! Uploaded documents are processed by a background worker that reports on
//! the tenant's `task_complete` topic. The broker connection for this
//! channel is opened lazily when the first upload is registered and torn
//! down as soon as the pending set empties.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use relaydesk_shared::TaskComplete;
use relaydesk_stomp::{AckMode, SessionEvent};
use tokio::sync::Mutex;
use tokio_retry::strategy::FixedInterval;

use super::events::{topics, Notice};

/// Pending ingest tasks keyed by filename
#[derive(Debug, Default)]
pub struct TaskTracker {
    pending: HashSet<String>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an uploaded file. Returns true when the channel should be
    /// opened (the set was empty).
    pub fn add(&mut self, file: &str) -> bool {
        let was_empty = self.pending.is_empty();
        self.pending.insert(file.to_string());
        was_empty
    }

    /// Apply a worker report. Unknown filenames are ignored (duplicate
    /// delivery); returns the user-facing notice and whether the channel
    /// can now be torn down.
    pub fn complete(&mut self, report: &TaskComplete) -> (Notice, bool) {
        if !self.pending.remove(&report.file) {
            tracing::debug!(file = %report.file, "Ignoring report for unknown or finished task");
        }
        let notice = if report.is_success() {
            Notice::Info(format!("ingest complete: {}", report.file))
        } else {
            Notice::Warn(format!(
                "ingest failed: {} ({})",
                report.file,
                report.message.as_deref().unwrap_or("no detail")
            ))
        };
        (notice, self.pending.is_empty())
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Watch the tenant's `task_complete` topic until every pending task has
/// reported, then disconnect. Spawned when the first upload is registered.
///
/// The broker connection is re-established on a fixed delay for as long
/// as tasks remain pending; the subscription's client-individual ack mode
/// means unacked reports are redelivered on reconnect.
pub async fn watch_task_channel(
    broker_url: &str,
    tenant_id: &str,
    reconnect_delay: Duration,
    tracker: Arc<Mutex<TaskTracker>>,
) {
    let mut delays = FixedInterval::new(reconnect_delay);
    loop {
        if tracker.lock().await.is_idle() {
            return;
        }
        let (mut session, mut inbound) = match relaydesk_stomp::connect(broker_url).await {
            Ok(pair) => pair,
            Err(e) => {
                let delay = delays.next().unwrap_or(reconnect_delay);
                tracing::warn!(
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Task channel unreachable"
                );
                tokio::time::sleep(delay).await;
                continue;
            }
        };
        if let Err(e) = session.subscribe(
            &topics::scoped(tenant_id, topics::TASK_COMPLETE),
            AckMode::ClientIndividual,
        ) {
            tracing::warn!(error = %e, "Task channel subscribe failed");
            tokio::time::sleep(delays.next().unwrap_or(reconnect_delay)).await;
            continue;
        }
        tracing::info!(tenant_id = %tenant_id, "Task channel open");

        let mut finished = false;
        while let Some(event) = inbound.recv().await {
            match event {
                SessionEvent::Message(msg) => {
                    let report: TaskComplete = match serde_json::from_str(&msg.body) {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "Discarding malformed task report");
                            continue;
                        }
                    };
                    if let Some(handle) = msg.ack {
                        if let Err(e) = handle.ack() {
                            tracing::warn!(error = %e, "Failed to ack task report");
                        }
                    }

                    let (notice, done) = tracker.lock().await.complete(&report);
                    match notice {
                        Notice::Info(text) => tracing::info!("{text}"),
                        Notice::Warn(text) => tracing::warn!("{text}"),
                    }
                    if done {
                        finished = true;
                        break;
                    }
                }
                SessionEvent::ProtocolError { message, .. } => {
                    tracing::warn!(message = %message, "Broker error on task channel");
                }
                SessionEvent::Closed => break,
            }
        }

        if finished {
            if let Err(e) = session.disconnect() {
                tracing::debug!(error = %e, "Task channel already gone at disconnect");
            }
            tracing::info!("Task channel closed, no tasks outstanding");
            return;
        }
        tracing::warn!("Task channel lost with tasks pending; reconnecting");
        tokio::time::sleep(delays.next().unwrap_or(reconnect_delay)).await;
    }
}
