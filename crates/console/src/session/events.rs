//! Typed broker events and coordinator commands
//!
//! Inbound MESSAGE frames are decoded into `BrokerEvent`s by topic suffix;
//! every state transition in the coordinator returns a list of `Command`s
//! (publishes and user-facing notices) so the whole protocol is testable
//! without a transport.

use relaydesk_shared::{ChatMessage, CustomerWaiting, TaskComplete};
use relaydesk_stomp::{AckHandle, InboundMessage};
use serde::Serialize;
use thiserror::Error;

/// Well-known publish destinations on the chat broker
pub mod destinations {
    pub const ADD_USER: &str = "/app/chat.addUser";
    pub const SEND_MESSAGE: &str = "/app/chat.sendMessage";
    pub const PICK_UP: &str = "/app/chat.pickUp";
}

/// Tenant-scoped topic names, pattern `/topic/{tenantId}.{event}`
pub mod topics {
    pub const NEW_CUSTOMER: &str = "new_customer";
    pub const CUSTOMER_MESSAGE: &str = "customer_message";
    pub const CUSTOMER_WAITING: &str = "customer_waiting";
    pub const TASK_COMPLETE: &str = "task_complete";

    pub fn scoped(tenant_id: &str, event: &str) -> String {
        format!("/topic/{tenant_id}.{event}")
    }
}

/// Inbound broker event, decoded to its payload type
#[derive(Debug)]
pub enum BrokerEvent {
    /// A customer joined the tenant channel
    NewCustomer(ChatMessage),
    /// A conversation message addressed within the tenant
    CustomerMessage(ChatMessage),
    /// A customer entered the waiting pool; carries the manual-ack handle
    CustomerWaiting {
        notice: CustomerWaiting,
        ack: Option<AckHandle>,
    },
    /// Ingest worker finished processing one uploaded file
    TaskComplete {
        report: TaskComplete,
        ack: Option<AckHandle>,
    },
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("no handler for topic {0}")]
    UnknownTopic(String),

    #[error("bad payload on {topic}: {source}")]
    BadPayload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode an inbound MESSAGE by its topic suffix
pub fn decode(msg: InboundMessage) -> Result<BrokerEvent, EventError> {
    let suffix = msg
        .destination
        .rsplit_once('.')
        .map(|(_, s)| s)
        .unwrap_or(msg.destination.as_str());

    let bad = |source| EventError::BadPayload {
        topic: msg.destination.clone(),
        source,
    };

    match suffix {
        topics::NEW_CUSTOMER => Ok(BrokerEvent::NewCustomer(
            serde_json::from_str(&msg.body).map_err(bad)?,
        )),
        topics::CUSTOMER_MESSAGE => Ok(BrokerEvent::CustomerMessage(
            serde_json::from_str(&msg.body).map_err(bad)?,
        )),
        topics::CUSTOMER_WAITING => Ok(BrokerEvent::CustomerWaiting {
            notice: serde_json::from_str(&msg.body).map_err(bad)?,
            ack: msg.ack,
        }),
        topics::TASK_COMPLETE => Ok(BrokerEvent::TaskComplete {
            report: serde_json::from_str(&msg.body).map_err(bad)?,
            ack: msg.ack,
        }),
        _ => Err(EventError::UnknownTopic(msg.destination)),
    }
}

/// Side effect requested by a coordinator transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Publish a JSON body to a broker destination. Order within a returned
    /// command list is significant and must be preserved by the executor.
    Publish { destination: String, body: String },
    /// Non-blocking user-facing notification
    Notice(Notice),
}

/// User-facing, non-blocking notification (the toast surface)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warn(String),
}

impl Command {
    /// Build a publish command from a serializable payload. Serialization
    /// of our own wire types cannot realistically fail; if it does, the
    /// command is dropped and logged rather than aborting the transition.
    pub fn publish<T: Serialize>(destination: &str, payload: &T) -> Option<Command> {
        match serde_json::to_string(payload) {
            Ok(body) => Some(Command::Publish {
                destination: destination.to_string(),
                body,
            }),
            Err(e) => {
                tracing::error!(destination = %destination, error = %e, "Failed to serialize outbound payload");
                None
            }
        }
    }
}
