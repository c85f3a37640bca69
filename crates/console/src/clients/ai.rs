//! AI service client
//!
//! Retrieval-augmented answering and conversation summaries.

use relaydesk_shared::{ConversationSummary, RagAnswer, ServiceError, ServiceResult};
use serde_json::json;

use super::expect_success;

/// Client for the AI/RAG service
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
}

impl AiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `POST /api/v1/rag`: run a retrieval query against the tenant's
    /// knowledge base. Empty queries are rejected before any network call.
    pub async fn rag_query(&self, tenant_id: &str, query: &str) -> ServiceResult<String> {
        if query.trim().is_empty() {
            return Err(ServiceError::Validation("query must not be empty".to_string()));
        }

        let resp = self
            .http
            .post(format!("{}/api/v1/rag", self.base_url))
            .json(&json!({ "query": query, "tenant_id": tenant_id }))
            .send()
            .await?;
        let answer: RagAnswer = expect_success(resp).await?.json().await?;
        Ok(answer.data)
    }

    /// `POST /summary`: summarize the conversation with one customer
    pub async fn conversation_summary(
        &self,
        tenant_id: &str,
        customer_id: &str,
    ) -> ServiceResult<String> {
        let resp = self
            .http
            .post(format!("{}/summary", self.base_url))
            .json(&json!({ "tenant_id": tenant_id, "customer_id": customer_id }))
            .send()
            .await?;
        let summary: ConversationSummary = expect_success(resp).await?.json().await?;
        Ok(summary.summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]  // Allow unwrap() in tests for cleaner test code
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rag_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/rag")
            .match_body(mockito::Matcher::Json(
                json!({"query": "refund policy?", "tenant_id": "t1"}),
            ))
            .with_status(200)
            .with_body(r#"{"data":"Refunds are accepted within 30 days."}"#)
            .create_async()
            .await;

        let client = AiClient::new(server.url());
        let answer = client.rag_query("t1", "refund policy?").await.unwrap();
        assert_eq!(answer, "Refunds are accepted within 30 days.");
    }

    #[tokio::test]
    async fn test_rag_query_rejects_blank_query() {
        let client = AiClient::new("http://127.0.0.1:1");
        let err = client.rag_query("t1", "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_conversation_summary() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/summary")
            .with_status(200)
            .with_body(r#"{"summary":"Customer asked about shipping."}"#)
            .create_async()
            .await;

        let client = AiClient::new(server.url());
        let summary = client.conversation_summary("t1", "c1").await.unwrap();
        assert_eq!(summary, "Customer asked about shipping.");
    }
}
