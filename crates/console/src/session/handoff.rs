//! Hand-off protocol frames
//!
//! Pick-up and drop control frames on the shared hand-off destination,
//! plus the customer-visible pickup notification. Exclusivity here is
//! advisory: the broker does not arbitrate between agents, the last pickup
//! notification wins on the customer's display.

use relaydesk_shared::{ChatMessage, HandOffFrame, HandOffKind, UserType};
use time::OffsetDateTime;

use super::events::{destinations, Command};

/// Frames for claiming a customer: the pickup control frame strictly
/// followed by the "now assisting" notification addressed to the customer.
pub fn pickup_commands(
    agent_id: &str,
    agent_name: &str,
    tenant_id: &str,
    customer_id: &str,
) -> Vec<Command> {
    let control = HandOffFrame {
        sender: agent_id.to_string(),
        customer: customer_id.to_string(),
        kind: HandOffKind::Pickup,
        tenant_id: tenant_id.to_string(),
        timestamp: OffsetDateTime::now_utc(),
    };
    let notification = ChatMessage::chat(
        agent_id,
        customer_id,
        tenant_id,
        format!("Agent {agent_name} is now assisting you"),
        UserType::Agent,
    );

    [
        Command::publish(destinations::PICK_UP, &control),
        Command::publish(destinations::SEND_MESSAGE, &notification),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Frame releasing a customer back to the pool
pub fn drop_commands(agent_id: &str, tenant_id: &str, customer_id: &str) -> Vec<Command> {
    let control = HandOffFrame {
        sender: agent_id.to_string(),
        customer: customer_id.to_string(),
        kind: HandOffKind::Drop,
        tenant_id: tenant_id.to_string(),
        timestamp: OffsetDateTime::now_utc(),
    };
    Command::publish(destinations::PICK_UP, &control)
        .into_iter()
        .collect()
}
