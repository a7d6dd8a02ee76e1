//! HTTP request engine
//!
//! Uniform authenticated request handling against the App Store Connect
//! origin: URL/query construction, auth header attachment, JSON decode on
//! 2xx, error-envelope surfacing on everything else. Retry policy, if any,
//! belongs to callers.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::form_urlencoded;

use crate::auth::TokenIssuer;
use crate::config::ConnectConfig;
use crate::envelope::ErrorEnvelope;
use crate::error::{ConnectError, Result};
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

/// Versioned base of the App Store Connect REST API
pub const API_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// Query parameter pairs; repeated keys (e.g. `filter[x]`) are legal
pub type Query = [(String, String)];

/// Authenticated JSON:API client for App Store Connect
pub struct ConnectClient {
    pub(crate) issuer: Arc<TokenIssuer>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) base_url: String,
}

impl ConnectClient {
    /// Create a client over the production HTTP transport
    pub fn new(config: ConnectConfig) -> Self {
        Self::with_transport(Arc::new(TokenIssuer::new(config)), Arc::new(HttpTransport::new()))
    }

    /// Create a client with an injected issuer and transport
    pub fn with_transport(issuer: Arc<TokenIssuer>, transport: Arc<dyn Transport>) -> Self {
        Self {
            issuer,
            transport,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// The token issuer backing this client
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// GET a relative resource path with query parameters
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T> {
        let url = join_query(&format!("{}{}", self.base_url, path), query);
        self.request(Method::GET, url, None).await
    }

    /// GET an absolute URL, e.g. a pagination `next` link
    pub async fn get_url<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.request(Method::GET, url.to_string(), None).await
    }

    /// POST a JSON body to a relative resource path
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.request(Method::POST, url, Some(body)).await
    }

    /// PATCH a JSON body to a relative resource path
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.request(Method::PATCH, url, Some(body)).await
    }

    /// DELETE a relative resource path; the API returns no body
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        self.request_raw(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let response = self.request_raw(method, url, body).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub(crate) async fn request_raw(
        &self,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> Result<TransportResponse> {
        debug!(%method, %url, "API request");

        let mut request = TransportRequest::new(method, url).with_headers(self.issuer.auth_headers()?);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }
        Ok(response)
    }
}

/// Convert a non-2xx response into the remote-API error taxonomy: the first
/// structured error's `detail`, falling back to the HTTP status text
pub(crate) fn api_error(response: &TransportResponse) -> ConnectError {
    let envelope: ErrorEnvelope = serde_json::from_slice(&response.body).unwrap_or_default();
    let message = envelope
        .first_detail()
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| response.status_text().to_string());
    ConnectError::Api {
        status: response.status.as_u16(),
        message,
    }
}

/// Append URL-encoded query pairs to a URL, preserving repeated keys
pub(crate) fn join_query(url: &str, query: &Query) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        serializer.append_pair(key, value);
    }
    format!("{}?{}", url, serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResourceEnvelope;
    use crate::testing::{test_client, FakeTransport};
    use serde_json::json;

    #[test]
    fn test_join_query_preserves_repeated_keys() {
        let query = vec![
            ("filter[platform]".to_string(), "IOS".to_string()),
            ("filter[platform]".to_string(), "MAC_OS".to_string()),
            ("limit".to_string(), "50".to_string()),
        ];
        let url = join_query("https://example.com/v1/apps", &query);
        assert_eq!(
            url,
            "https://example.com/v1/apps?filter%5Bplatform%5D=IOS&filter%5Bplatform%5D=MAC_OS&limit=50"
        );
    }

    #[test]
    fn test_join_query_without_params() {
        assert_eq!(join_query("https://example.com/v1/apps", &[]), "https://example.com/v1/apps");
    }

    #[tokio::test]
    async fn test_get_decodes_envelope_and_sends_auth() {
        let transport = FakeTransport::new();
        transport.push_json(200, json!({"data": [{"type": "apps", "id": "1"}]}));
        let client = test_client(transport.clone());

        let envelope: ResourceEnvelope = client.get("/apps", &[]).await.unwrap();
        assert_eq!(envelope.data_items().len(), 1);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, format!("{}/apps", API_BASE_URL));
        let auth = requests[0]
            .headers
            .iter()
            .find(|(name, _)| name == "Authorization")
            .map(|(_, value)| value.clone())
            .unwrap();
        assert!(auth.starts_with("Bearer "));
    }

    #[tokio::test]
    async fn test_error_detail_extraction() {
        let transport = FakeTransport::new();
        transport.push_json(404, json!({"errors": [{"detail": "Not found"}]}));
        let client = test_client(transport);

        let err = client
            .get::<ResourceEnvelope>("/apps/missing", &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API Error: Not found");
        match err {
            ConnectError::Api { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_falls_back_to_status_text() {
        let transport = FakeTransport::new();
        transport.push_bytes(503, b"<html>oops</html>".to_vec());
        let client = test_client(transport);

        let err = client.get::<ResourceEnvelope>("/apps", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "API Error: Service Unavailable");
    }

    #[tokio::test]
    async fn test_post_carries_json_body() {
        let transport = FakeTransport::new();
        transport.push_json(201, json!({"data": {"type": "betaGroups", "id": "g1"}}));
        let client = test_client(transport.clone());

        let body = json!({"data": {"type": "betaGroups", "attributes": {"name": "Internal"}}});
        let _: ResourceEnvelope = client.post("/betaGroups", body.clone()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].body, Some(body));
    }

    #[tokio::test]
    async fn test_delete_ignores_empty_body() {
        let transport = FakeTransport::new();
        transport.push_bytes(204, Vec::new());
        let client = test_client(transport.clone());

        client.delete("/betaTesters/t1").await.unwrap();
        assert_eq!(transport.requests()[0].method, Method::DELETE);
    }
}
