//! REST clients for the external collaborator services
//!
//! The tenant, chat, and AI services are opaque collaborators reached over
//! plain request/response HTTP. Their internal behavior is out of scope;
//! only the payload shapes and the 404-vs-500 status contract matter here.

pub mod ai;
pub mod chat;
pub mod tenant;

pub use ai::AiClient;
pub use chat::ChatClient;
pub use tenant::TenantClient;

use relaydesk_shared::{ServiceError, ServiceResult};

/// Map a response status onto the collaborator error contract: success
/// passes through, 404 becomes `NotFound` (empty state, not an error
/// banner), everything else is `Upstream`.
pub(crate) async fn expect_success(resp: reqwest::Response) -> ServiceResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ServiceError::NotFound);
    }

    // Services report failure detail as {"detail": "..."} when they can
    let detail = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    Err(ServiceError::Upstream {
        status: status.as_u16(),
        detail,
    })
}
