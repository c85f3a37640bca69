//! Tenant service client
//!
//! Tenant lookup, document listing, knowledge-base entry management, and
//! file upload.

use relaydesk_shared::{DocName, KbEntries, KbEntry, ServiceError, ServiceResult, TenantInfo};
use serde_json::json;

use super::expect_success;

/// Client for the tenant-info service
#[derive(Debug, Clone)]
pub struct TenantClient {
    http: reqwest::Client,
    base_url: String,
}

impl TenantClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `GET /api/v1/tenants/{alias}`: tenant lookup at login
    pub async fn get_tenant(&self, alias: &str) -> ServiceResult<TenantInfo> {
        let resp = self
            .http
            .get(format!("{}/api/v1/tenants/{alias}", self.base_url))
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// `GET /api/v1/tenants/find?tenant_id=`: reverse lookup by id
    pub async fn find_tenant(&self, tenant_id: &str) -> ServiceResult<TenantInfo> {
        let resp = self
            .http
            .get(format!("{}/api/v1/tenants/find", self.base_url))
            .query(&[("tenant_id", tenant_id)])
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// `GET /api/v1/tenant_docs/{tenantId}/`: names of ingested documents
    pub async fn list_tenant_docs(&self, tenant_id: &str) -> ServiceResult<Vec<DocName>> {
        let resp = self
            .http
            .get(format!("{}/api/v1/tenant_docs/{tenant_id}/", self.base_url))
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// Document names with the 404 -> empty-state contract applied: a
    /// tenant with no ingested documents renders an empty list, not an
    /// error banner.
    pub async fn fetch_doc_names(&self, tenant_id: &str) -> ServiceResult<Vec<String>> {
        match self.list_tenant_docs(tenant_id).await {
            Ok(docs) => Ok(docs.into_iter().map(|d| d.doc_name).collect()),
            Err(ServiceError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// `GET /api/v1/knowledge_base/{tenantId}/entries?docName=`: entries
    /// of one document
    pub async fn list_kb_entries(
        &self,
        tenant_id: &str,
        doc_name: &str,
    ) -> ServiceResult<Vec<KbEntry>> {
        let resp = self
            .http
            .get(format!(
                "{}/api/v1/knowledge_base/{tenant_id}/entries",
                self.base_url
            ))
            .query(&[("docName", doc_name)])
            .send()
            .await?;
        let entries: KbEntries = expect_success(resp).await?.json().await?;
        Ok(entries.entries)
    }

    /// `PUT /api/v1/knowledge_base/{tenantId}/entries/{id}`: edit one
    /// entry's content
    pub async fn update_kb_entry(
        &self,
        tenant_id: &str,
        entry_id: &str,
        new_content: &str,
    ) -> ServiceResult<()> {
        let resp = self
            .http
            .put(format!(
                "{}/api/v1/knowledge_base/{tenant_id}/entries/{entry_id}",
                self.base_url
            ))
            .json(&json!({ "newContent": new_content }))
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }

    /// `DELETE /api/v1/knowledge_base/{tenantId}/entries/{id}`
    pub async fn delete_kb_entry(&self, tenant_id: &str, entry_id: &str) -> ServiceResult<()> {
        let resp = self
            .http
            .delete(format!(
                "{}/api/v1/knowledge_base/{tenant_id}/entries/{entry_id}",
                self.base_url
            ))
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }

    /// `POST /files/upload/`: multipart upload of one document for
    /// ingestion. Rejected before any network call when the payload is
    /// empty.
    pub async fn upload_file(
        &self,
        tenant_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ServiceResult<()> {
        if file_name.trim().is_empty() || bytes.is_empty() {
            return Err(ServiceError::Validation(
                "a non-empty file is required for upload".to_string(),
            ));
        }

        let form = reqwest::multipart::Form::new()
            .text("tenant_id", tenant_id.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            );
        let resp = self
            .http
            .post(format!("{}/files/upload/", self.base_url))
            .multipart(form)
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]  // Allow unwrap() in tests for cleaner test code
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_doc_names_404_maps_to_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tenant_docs/t1/")
            .with_status(404)
            .with_body(r#"{"detail":"no documents"}"#)
            .create_async()
            .await;

        let client = TenantClient::new(server.url());
        let docs = client.fetch_doc_names("t1").await.unwrap();
        assert!(docs.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_doc_names_500_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/tenant_docs/t1/")
            .with_status(500)
            .with_body(r#"{"detail":"index offline"}"#)
            .create_async()
            .await;

        let client = TenantClient::new(server.url());
        let err = client.fetch_doc_names("t1").await.unwrap_err();
        match err {
            ServiceError::Upstream { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail.as_deref(), Some("index offline"));
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_doc_names_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/tenant_docs/t1/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"doc_name":"faq.pdf"},{"doc_name":"returns.txt"}]"#)
            .create_async()
            .await;

        let client = TenantClient::new(server.url());
        let docs = client.fetch_doc_names("t1").await.unwrap();
        assert_eq!(docs, vec!["faq.pdf", "returns.txt"]);
    }

    #[tokio::test]
    async fn test_kb_entries_unwrap_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/knowledge_base/t1/entries")
            .match_query(mockito::Matcher::UrlEncoded(
                "docName".into(),
                "faq.pdf".into(),
            ))
            .with_status(200)
            .with_body(r#"{"entries":[{"id":"e1","content":"Q: ..."}]}"#)
            .create_async()
            .await;

        let client = TenantClient::new(server.url());
        let entries = client.list_kb_entries("t1", "faq.pdf").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "e1");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_payload_before_network() {
        // No mock server: a network call would fail the test with Http, not
        // Validation
        let client = TenantClient::new("http://127.0.0.1:1");
        let err = client.upload_file("t1", "doc.pdf", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_tenant_by_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/tenants/find")
            .match_query(mockito::Matcher::UrlEncoded("tenant_id".into(), "t1".into()))
            .with_status(200)
            .with_body(r#"{"tenant_id":"t1","alias":"acme"}"#)
            .create_async()
            .await;

        let client = TenantClient::new(server.url());
        let tenant = client.find_tenant("t1").await.unwrap();
        assert_eq!(tenant.alias, "acme");
        assert!(tenant.name.is_none());
    }

    #[tokio::test]
    async fn test_get_tenant_by_alias() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/tenants/acme")
            .with_status(200)
            .with_body(r#"{"tenant_id":"t1","alias":"acme","name":"Acme Corp"}"#)
            .create_async()
            .await;

        let client = TenantClient::new(server.url());
        let tenant = client.get_tenant("acme").await.unwrap();
        assert_eq!(tenant.tenant_id, "t1");
        assert_eq!(tenant.name.as_deref(), Some("Acme Corp"));
    }
}
