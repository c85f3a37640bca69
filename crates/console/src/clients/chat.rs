//! Chat service client

use relaydesk_shared::{ActiveUser, ServiceResult};

use super::expect_success;

/// Client for the chat backend's REST surface
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `GET /api/v1/tenants/{tenantId}/users/active`: customers currently
    /// connected to the tenant channel
    pub async fn active_users(&self, tenant_id: &str) -> ServiceResult<Vec<ActiveUser>> {
        let resp = self
            .http
            .get(format!(
                "{}/api/v1/tenants/{tenant_id}/users/active",
                self.base_url
            ))
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }
}
