//! Agent session coordinator
//!
//! The single-threaded state machine behind one agent's console: it owns
//! the presence ledger, the acknowledgement tracker, and the message log,
//! and turns every inbound broker event or user action into a list of
//! commands for the connection manager. No hidden global state; no I/O.
//!
//! Handlers assume arbitrary interleaving of inbound frames between user
//! actions: a waiting notification may land between a click and the
//! resulting pick-up.

use relaydesk_shared::{ChatMessage, UserType};

use super::ack::AckTracker;
use super::events::{destinations, BrokerEvent, Command, Notice};
use super::handoff;
use super::ledger::{Presence, PresenceLedger};
use super::log::MessageLog;

/// Identity of one agent session; created at login, destroyed at logout
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub tenant_id: String,
    pub agent_id: String,
    pub agent_name: String,
}

/// Per-session coordination state
#[derive(Debug)]
pub struct Coordinator {
    identity: SessionIdentity,
    ledger: PresenceLedger,
    acks: AckTracker,
    log: MessageLog,
}

impl Coordinator {
    pub fn new(identity: SessionIdentity, forget_dropped_customers: bool) -> Self {
        Self {
            identity,
            ledger: PresenceLedger::new(forget_dropped_customers),
            acks: AckTracker::new(),
            log: MessageLog::new(),
        }
    }

    /// JOIN announcement published on every (re)connect
    pub fn join_announcement(&self) -> Vec<Command> {
        let join = ChatMessage::join(
            &self.identity.agent_id,
            &self.identity.tenant_id,
            UserType::Agent,
        );
        Command::publish(destinations::ADD_USER, &join)
            .into_iter()
            .collect()
    }

    /// Apply one inbound broker event
    pub fn handle_event(&mut self, event: BrokerEvent) -> Vec<Command> {
        match event {
            BrokerEvent::NewCustomer(message) => {
                // Duplicate JOINs add exactly one roster entry; the log
                // records every arrival
                self.ledger.observe(&message.sender);
                self.log.append(message);
                Vec::new()
            }
            BrokerEvent::CustomerMessage(message) => {
                // Appended unconditionally; filtering happens at render time
                self.log.append(message);
                Vec::new()
            }
            BrokerEvent::CustomerWaiting { notice, ack } => {
                let newly_waiting = self.ledger.mark_waiting(&notice.customer_id);
                if let Some(handle) = ack {
                    self.acks.record_pending(&notice.customer_id, handle);
                }
                if newly_waiting {
                    vec![Command::Notice(Notice::Info(format!(
                        "customer {} is waiting",
                        notice.customer_id
                    )))]
                } else {
                    Vec::new()
                }
            }
            BrokerEvent::TaskComplete { report, ack } => {
                // Ingest reports belong to the auxiliary task channel; if
                // one lands here, ack it and surface it rather than losing it
                tracing::warn!(file = %report.file, "Task report delivered on the chat session");
                if let Some(handle) = ack {
                    if let Err(e) = handle.ack() {
                        tracing::warn!(error = %e, "Failed to ack stray task report");
                    }
                }
                vec![Command::Notice(Notice::Info(format!(
                    "ingest finished for {}",
                    report.file
                )))]
            }
        }
    }

    /// Select a customer for active viewing: drop the previous claim (if
    /// any), acknowledge the pending waiting notification, then claim the
    /// new customer. The drop frames strictly precede the pick-up frames.
    pub fn select_customer(&mut self, customer_id: &str) -> Vec<Command> {
        if self.ledger.selected() == Some(customer_id) {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if let Some(previous) = self.ledger.select(customer_id) {
            self.ledger.release(&previous);
            commands.extend(handoff::drop_commands(
                &self.identity.agent_id,
                &self.identity.tenant_id,
                &previous,
            ));
        }

        self.ledger.assign(customer_id);
        self.acks.acknowledge(customer_id);
        commands.extend(handoff::pickup_commands(
            &self.identity.agent_id,
            &self.identity.agent_name,
            &self.identity.tenant_id,
            customer_id,
        ));
        commands
    }

    /// Release the current selection back to the pool. No-op (logged, not
    /// sent) when nothing is selected.
    pub fn drop_selected(&mut self) -> Vec<Command> {
        let Some(customer) = self.ledger.clear_selection() else {
            tracing::debug!("Drop requested with no customer selected");
            return Vec::new();
        };
        self.ledger.release(&customer);
        handoff::drop_commands(&self.identity.agent_id, &self.identity.tenant_id, &customer)
    }

    /// Send a chat message to the selected customer. Rejected before any
    /// publish when the text is blank or nothing is selected; no partial
    /// state mutation in either case.
    pub fn send_message(&mut self, text: &str) -> Vec<Command> {
        let text = text.trim();
        if text.is_empty() {
            return vec![Command::Notice(Notice::Warn(
                "cannot send an empty message".to_string(),
            ))];
        }
        let Some(customer) = self.ledger.selected().map(str::to_string) else {
            return vec![Command::Notice(Notice::Warn(
                "select a customer before sending".to_string(),
            ))];
        };

        let message = ChatMessage::chat(
            &self.identity.agent_id,
            &customer,
            &self.identity.tenant_id,
            text,
            UserType::Agent,
        );
        // Local echo first: the log records arrival order
        self.log.append(message.clone());
        Command::publish(destinations::SEND_MESSAGE, &message)
            .into_iter()
            .collect()
    }

    /// Session teardown, first step of the unmount ordering: release the
    /// selected customer before the transport is deactivated.
    pub fn shutdown(&mut self) -> Vec<Command> {
        let commands = self.drop_selected();
        self.acks.clear();
        commands
    }

    /// Pending handles belong to a transport; when it dies they are
    /// worthless and the broker will redeliver on the next connect.
    pub fn on_disconnect(&mut self) {
        self.acks.clear();
    }

    // -------------------------------------------------------------------------
    // Read accessors for rendering
    // -------------------------------------------------------------------------

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn selected(&self) -> Option<&str> {
        self.ledger.selected()
    }

    pub fn waiting(&self) -> Vec<&str> {
        self.ledger.waiting()
    }

    pub fn roster(&self) -> impl Iterator<Item = (&str, Presence)> {
        self.ledger.roster()
    }

    pub fn conversation(&self) -> Vec<&ChatMessage> {
        self.log
            .conversation(&self.identity.agent_id, self.ledger.selected())
    }

    pub fn pending_acks(&self) -> usize {
        self.acks.len()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }
}
