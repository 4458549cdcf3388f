//! HTTP client for the document API.
//!
//! Queries are served from an [`ApiCache`] until a mutation invalidates one of
//! the tags they provided. Error responses are normalized into
//! [`Error::Api`], [`Error::Unauthorized`] or [`Error::Network`].

mod auth;
mod documents;
mod search;
mod users;
mod workspaces;

use crate::cache::{ApiCache, Tag};
use crate::config::Config;
use crate::error::{Error, Result, DEFAULT_API_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE};
use crate::models::{ApiResponse, Page};
use crate::session::SessionStore;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Response body of endpoints that return `data: null`
pub(crate) type Empty = Option<serde_json::Value>;

pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
    session: Option<SessionStore>,
    cache: ApiCache,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid API URL: {}", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            token: RwLock::new(None),
            session: None,
            cache: ApiCache::new(),
        })
    }

    /// Client for the configured API, authenticated from the environment
    /// override or the stored session
    pub fn from_config(config: &Config) -> Result<Self> {
        let session = SessionStore::new(&config.paths.session_file);
        let token = config.env_token().or_else(|| session.token());
        if token.is_none() {
            debug!("No session token available");
        }
        let client = Self::new(&config.api_url, config.timeout())?.with_session(session);
        client.set_token(token);
        Ok(client)
    }

    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn cache(&self) -> &ApiCache {
        &self.cache
    }

    pub fn session(&self) -> Option<&SessionStore> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// URL for the given path segments below the base URL; each segment is
    /// percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid API URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(token) = self.current_token() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                Error::Http(e)
            } else {
                debug!("Transport error: {}", e);
                Error::Network(NETWORK_ERROR_MESSAGE.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
                return empty_response(status);
            }
            return Ok(serde_json::from_slice(&body)?);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(Error::Unauthorized);
        }

        Err(Error::Api {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    fn handle_unauthorized(&self) {
        warn!("API rejected the session token");
        self.set_token(None);
        self.cache.clear();
        if let Some(session) = &self.session {
            if let Err(e) = session.clear() {
                warn!("Failed to remove session file: {}", e);
            }
        }
    }

    /// Cached GET: served from the cache when present, otherwise fetched and
    /// stored under `tags`
    async fn query<T, Q>(
        &self,
        key: String,
        tags: Vec<Tag>,
        segments: &[&str],
        params: Option<&Q>,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned + Serialize,
        Q: Serialize + ?Sized,
    {
        if let Some(cached) = self.cache.get::<ApiResponse<T>>(&key) {
            return Ok(cached);
        }
        self.fetch(key, tags, segments, params).await
    }

    /// Uncached GET that refreshes the cache entry with whatever arrives
    async fn fetch<T, Q>(
        &self,
        key: String,
        tags: Vec<Tag>,
        segments: &[&str],
        params: Option<&Q>,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned + Serialize,
        Q: Serialize + ?Sized,
    {
        let mut request = self.request(Method::GET, segments)?;
        if let Some(params) = params {
            request = request.query(params);
        }
        let response: ApiResponse<T> = self.send(request).await?;
        self.cache.insert(key, &response, tags);
        Ok(response)
    }

    /// Mutating call. `invalidates` is applied once the request completes,
    /// whether or not it succeeded.
    async fn mutate<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        invalidates: &[Tag],
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.request(method, segments)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let result = self.send(request).await;
        self.cache.invalidate(invalidates);
        result
    }
}

/// Envelope for a success response without a body. Decodes only when `T`
/// accepts `null`, as [`Empty`] does.
fn empty_response<T: DeserializeOwned>(status: StatusCode) -> Result<ApiResponse<T>> {
    debug!("Empty {} response", status);
    Ok(serde_json::from_value(serde_json::json!({
        "success": true,
        "statusCode": status.as_u16(),
        "message": "",
        "data": null,
    }))?)
}

fn into_page<T>(response: ApiResponse<Vec<T>>) -> Page<T> {
    Page {
        items: response.data,
        meta: response.meta,
    }
}

/// Cache key for an endpoint and its serialized arguments
fn cache_key<Q: Serialize + ?Sized>(endpoint: &str, params: &Q) -> String {
    match serde_json::to_string(params) {
        Ok(args) => format!("{}?{}", endpoint, args),
        Err(_) => endpoint.to_string(),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Human-readable message from an error body: `message`, then `error`, then a
/// generic fallback
fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return DEFAULT_API_ERROR_MESSAGE.to_string();
    };

    let message = match parsed.message {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Array(items)) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    };

    message
        .filter(|m| !m.trim().is_empty())
        .or(parsed.error.filter(|e| !e.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_API_ERROR_MESSAGE.to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::test_document;
    use crate::session::Session;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_error_message_precedence() {
        assert_eq!(error_message(r#"{"message":"Document not found"}"#), "Document not found");
        assert_eq!(error_message(r#"{"error":"Bad Request"}"#), "Bad Request");
        assert_eq!(
            error_message(r#"{"message":["name too short","email invalid"],"error":"Bad Request"}"#),
            "name too short; email invalid"
        );
        assert_eq!(error_message("<html>502</html>"), DEFAULT_API_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message":""}"#), DEFAULT_API_ERROR_MESSAGE);
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::new("http://localhost:3001/api/", Duration::from_secs(5)).unwrap();
        let url = client.endpoint(&["documents", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/documents/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/documents/doc-1"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document_json(&test_document("doc-1"))))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_token("tok-1");
        let doc = client.get_document("doc-1").await.unwrap();
        assert_eq!(doc.id, "doc-1");
    }

    #[tokio::test]
    async fn test_api_error_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/documents/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Document not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).get_document("missing").await.unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Document not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("session.json"));
        store.save(&Session::new("stale".to_string(), None)).unwrap();

        let client = client_for(&server).with_session(store.clone()).with_token("stale");
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert!(!client.has_token());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_network_error() {
        let client = ApiClient::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
        let err = client.get_document("doc-1").await.unwrap_err();
        match err {
            Error::Network(message) => assert_eq!(message, NETWORK_ERROR_MESSAGE),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(Error::Network(String::new()).status(), Some(0));
    }
}
