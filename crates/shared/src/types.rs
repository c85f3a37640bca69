//! Wire payloads shared across the Relaydesk platform
//!
//! Every broker frame body and REST payload exchanged with the tenant,
//! chat, and AI services is defined here with type-safe serde
//! serialization. All payloads are tenant-scoped.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// Chat messages (broker)
// =============================================================================

/// Discriminator carried in the `type` field of every chat frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    /// Announcement that a participant entered the tenant channel
    Join,
    /// A regular conversation message
    Chat,
    /// Server- or protocol-generated informational message
    System,
    /// AI-generated conversation summary
    Summary,
}

/// Which side of the conversation a participant is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Agent,
    Customer,
}

/// A single chat event, immutable once created.
///
/// The broker delivers these on the `{tenant}.new_customer` and
/// `{tenant}.customer_message` topics; the same shape is published to
/// `/app/chat.addUser` and `/app/chat.sendMessage`. Brokers in the wild
/// occasionally omit `timestamp`, so deserialization falls back to the
/// local arrival time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub user_type: UserType,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub timestamp: OffsetDateTime,
}

impl ChatMessage {
    /// JOIN announcement published when a participant connects
    pub fn join(sender: impl Into<String>, tenant_id: impl Into<String>, user_type: UserType) -> Self {
        Self {
            sender: sender.into(),
            receiver: None,
            tenant_id: tenant_id.into(),
            content: None,
            kind: MessageType::Join,
            user_type,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// CHAT message addressed to a single receiver
    pub fn chat(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        tenant_id: impl Into<String>,
        content: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: Some(receiver.into()),
            tenant_id: tenant_id.into(),
            content: Some(content.into()),
            kind: MessageType::Chat,
            user_type,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

// =============================================================================
// Hand-off control frames (broker)
// =============================================================================

/// Direction of a hand-off control frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandOffKind {
    /// Agent claims the customer
    Pickup,
    /// Agent releases the customer back to the pool
    Drop,
}

/// Control frame published to `/app/chat.pickUp`.
///
/// Exclusivity is advisory only: nothing on the client side prevents two
/// agents from claiming the same customer, the last pickup notification
/// wins on the customer's display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandOffFrame {
    /// Agent id issuing the claim or release
    pub sender: String,
    pub customer: String,
    #[serde(rename = "type")]
    pub kind: HandOffKind,
    pub tenant_id: String,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub timestamp: OffsetDateTime,
}

// =============================================================================
// Notifications (broker, manual-ack topics)
// =============================================================================

/// "Customer waiting" notification delivered on `{tenant}.customer_waiting`
/// in client-individual ack mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerWaiting {
    pub customer_id: String,
    pub tenant_id: String,
}

/// Ingest-worker completion report delivered on `{tenant}.task_complete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskComplete {
    /// Filename of the ingested document
    pub file: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskComplete {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// =============================================================================
// REST collaborator payloads
// =============================================================================

/// Tenant record returned by `GET /api/v1/tenants/{alias}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantInfo {
    pub tenant_id: String,
    pub alias: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One element of the `GET /api/v1/tenant_docs/{tenantId}/` listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocName {
    pub doc_name: String,
}

/// A single knowledge-base entry within a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntry {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub doc_name: Option<String>,
}

/// Envelope around the knowledge-base entry listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntries {
    pub entries: Vec<KbEntry>,
}

/// Customer currently active on the chat service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveUser {
    pub user_id: String,
}

/// Answer envelope from `POST /api/v1/rag`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub data: String,
}

/// Envelope from `POST /summary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub summary: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]  // Allow unwrap() in tests for cleaner test code
mod tests {
    use super::*;

    #[test]
    fn test_message_type_wire_casing() {
        let json = serde_json::to_string(&MessageType::Join).unwrap();
        assert_eq!(json, r#""JOIN""#);
        let parsed: MessageType = serde_json::from_str(r#""CHAT""#).unwrap();
        assert_eq!(parsed, MessageType::Chat);
    }

    #[test]
    fn test_chat_message_round_trip() {
        let msg = ChatMessage::chat("agent1", "c1", "t1", "hello", UserType::Agent);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"CHAT""#));
        assert!(json.contains(r#""user_type":"agent""#));

        let parsed: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sender, "agent1");
        assert_eq!(parsed.receiver.as_deref(), Some("c1"));
        assert_eq!(parsed.kind, MessageType::Chat);
    }

    #[test]
    fn test_join_omits_optional_fields() {
        let msg = ChatMessage::join("c9", "t1", UserType::Customer);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("receiver"));
        assert!(!json.contains("content"));
        assert!(json.contains(r#""type":"JOIN""#));
    }

    #[test]
    fn test_missing_timestamp_defaults_to_arrival_time() {
        let json = r#"{"sender":"c1","tenant_id":"t1","content":"hi","type":"CHAT","user_type":"customer"}"#;
        let parsed: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.sender, "c1");
        assert!(parsed.timestamp <= OffsetDateTime::now_utc());
    }

    #[test]
    fn test_handoff_kind_is_lowercase() {
        assert_eq!(serde_json::to_string(&HandOffKind::Pickup).unwrap(), r#""pickup""#);
        assert_eq!(serde_json::to_string(&HandOffKind::Drop).unwrap(), r#""drop""#);
    }

    #[test]
    fn test_task_complete_success_discriminator() {
        let ok: TaskComplete =
            serde_json::from_str(r#"{"file":"a.pdf","status":"success"}"#).unwrap();
        assert!(ok.is_success());
        assert!(ok.message.is_none());

        let failed: TaskComplete = serde_json::from_str(
            r#"{"file":"b.pdf","status":"error","message":"parse failure"}"#,
        )
        .unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.message.as_deref(), Some("parse failure"));
    }
}
