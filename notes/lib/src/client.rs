//! HTTP client for the Notes API.
//!
//! This module provides [`NotesClient`] for executing requests against the
//! three Notes API endpoints (create, search, append) with uniform header
//! injection and tracing instrumentation.
//!
//! Two call surfaces are exposed:
//!
//! - `try_create` / `try_search` / `try_append` return [`Result`] values
//!   carrying a structured [`NotesError`] with the status code and message.
//! - `create_note` / `search_notes` / `append_to_note` never fail past the
//!   client boundary: errors are logged and converted to `None`, an empty
//!   `Vec`, or `false`. Callers branch on the sentinel instead of matching
//!   on an error.

use std::fmt::Display;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tracing::{instrument, warn, Span};
use url::Url;

use crate::error::NotesError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the API key on every request.
const API_KEY_HEADER: &str = "X-API-Key";

/// A note as returned by the server: decoded JSON, shape not validated.
///
/// The server is expected to include at least an `"id"` field, but the
/// client does not enforce that. Use [`note_id`] to extract it when present.
pub type Note = serde_json::Map<String, serde_json::Value>;

/// Extracts the `"id"` field from a note, accepting string or integer ids.
///
/// Returns `None` when the field is absent or has a non-scalar type.
pub fn note_id(note: &Note) -> Option<String> {
    match note.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Outbound payload for creating a note.
///
/// `tags` defaults to empty and `category` defaults to `"topics"`; both can
/// be overridden with the builder methods.
///
/// ## Examples
///
/// ```rust
/// use notes_lib::NoteDraft;
///
/// let draft = NoteDraft::new("Quantum Computing", "Initial findings")
///     .tag("physics")
///     .category("projects");
/// ```
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoteDraft {
    title: String,
    content: String,
    tags: Vec<String>,
    category: String,
}

impl NoteDraft {
    /// Creates a draft with no tags and the default `"topics"` category.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            category: "topics".to_string(),
        }
    }

    /// Adds a single tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replaces the tag list.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the category folder (e.g. `"topics"`, `"projects"`).
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Returns the draft title.
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Outbound body for the append endpoint.
#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    content: &'a str,
}

/// Filter criteria for searching notes.
///
/// Unset fields are omitted from the query string entirely rather than sent
/// as empty values. Tags are serialized as a single comma-joined parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    keyword: Option<String>,
    tags: Vec<String>,
    category: Option<String>,
}

impl SearchFilter {
    /// Creates an empty filter that matches all notes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the keyword to search note content for.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Adds a tag to filter by.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replaces the tag list to filter by.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the category to filter by.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builds the query pairs, omitting any unset filter.
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}

/// Builder for configuring a [`NotesClient`].
#[derive(Debug)]
pub struct NotesClientBuilder {
    base_url: Url,
    api_key: String,
    agent_label: String,
    timeout: Duration,
}

impl NotesClientBuilder {
    fn new(base_url: Url, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            agent_label: "notes-client".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the informational agent label. Never sent over the wire.
    pub fn agent_label(mut self, label: impl Into<String>) -> Self {
        self.agent_label = label.into();
        self
    }

    /// Sets the request timeout.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    ///
    /// let client = NotesClient::builder(base_url, "key")
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// ```
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the [`NotesClient`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<NotesClient, NotesError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::try_from(self.api_key.as_str())
            .map_err(|_| NotesError::InvalidApiKey)?;
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(NotesError::Request)?;

        Ok(NotesClient {
            client,
            base_url: self.base_url,
            agent_label: self.agent_label,
        })
    }
}

/// Async client for the Notes API.
///
/// The client wraps `reqwest::Client` with connection pooling and attaches
/// `Content-Type: application/json` and `X-API-Key` headers to every
/// request. Construction performs no network activity, and the client holds
/// no mutable state, so it can be shared freely across tasks.
///
/// ## Examples
///
/// ```rust,ignore
/// use notes_lib::{NoteDraft, NotesClient};
/// use url::Url;
///
/// let base_url = Url::parse("https://notes.example.com")?;
/// let client = NotesClient::new(base_url, "sk-xxx", "Research Agent")?;
///
/// let draft = NoteDraft::new("Quantum Computing", "Initial findings");
/// if let Some(note) = client.create_note(&draft).await {
///     println!("created: {:?}", note.get("id"));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct NotesClient {
    client: reqwest::Client,
    base_url: Url,
    agent_label: String,
}

impl NotesClient {
    /// Creates a new builder for configuring a client.
    pub fn builder(base_url: Url, api_key: impl Into<String>) -> NotesClientBuilder {
        NotesClientBuilder::new(base_url, api_key.into())
    }

    /// Creates a client with the default timeout.
    ///
    /// ## Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        agent_label: impl Into<String>,
    ) -> Result<Self, NotesError> {
        Self::builder(base_url, api_key)
            .agent_label(agent_label)
            .build()
    }

    /// Returns the base URL for this client.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the informational agent label.
    pub fn agent_label(&self) -> &str {
        &self.agent_label
    }

    /// Creates a note, returning the server's decoded response.
    ///
    /// Sends `POST {base}/notes` with the draft as the JSON body.
    ///
    /// ## Errors
    ///
    /// Returns an error if the request fails, the server responds with a
    /// non-success status, or the response body is not JSON.
    #[instrument(
        name = "notes_request",
        skip_all,
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        )
    )]
    pub async fn try_create(&self, draft: &NoteDraft) -> Result<Note, NotesError> {
        let url = self.base_url.join("notes")?;
        Span::current().record("http.url", url.as_str());

        let response = self.client.post(url).json(draft).send().await?;
        let response = Self::check_status(response).await?;
        let note = response.json::<Note>().await?;
        Ok(note)
    }

    /// Searches notes, returning the decoded list of matches.
    ///
    /// Sends `GET {base}/notes` with query parameters built from the filter.
    /// Unset filters produce no parameter at all.
    ///
    /// ## Errors
    ///
    /// Returns an error if the request fails, the server responds with a
    /// non-success status, or the response body is not a JSON array.
    #[instrument(
        name = "notes_request",
        skip_all,
        fields(
            http.method = "GET",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        )
    )]
    pub async fn try_search(&self, filter: &SearchFilter) -> Result<Vec<Note>, NotesError> {
        let url = self.base_url.join("notes")?;
        Span::current().record("http.url", url.as_str());

        let response = self
            .client
            .get(url)
            .query(&filter.query_pairs())
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let notes = response.json::<Vec<Note>>().await?;
        Ok(notes)
    }

    /// Appends content to an existing note.
    ///
    /// Sends `POST {base}/notes/{id}/append` with body `{"content": ...}`.
    /// A single atomic remote call: durability and ordering are the server's
    /// responsibility.
    ///
    /// The id is placed into the URL path verbatim, without percent-encoding.
    /// Ids are server-issued and expected to be path-safe; an id containing
    /// `/` addresses a different route.
    ///
    /// ## Errors
    ///
    /// Returns an error if the request fails or the server responds with a
    /// non-success status.
    #[instrument(
        name = "notes_request",
        skip_all,
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        )
    )]
    pub async fn try_append(
        &self,
        note_id: impl Display,
        content: &str,
    ) -> Result<(), NotesError> {
        let url = self.base_url.join(&format!("notes/{note_id}/append"))?;
        Span::current().record("http.url", url.as_str());

        let response = self
            .client
            .post(url)
            .json(&AppendBody { content })
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Creates a note, or returns `None` on any failure.
    ///
    /// Failures are logged on the diagnostic channel and never propagate;
    /// callers branch on the `Option` instead.
    pub async fn create_note(&self, draft: &NoteDraft) -> Option<Note> {
        match self.try_create(draft).await {
            Ok(note) => Some(note),
            Err(e) => {
                warn!(error = %e, title = draft.title(), "create note failed");
                None
            }
        }
    }

    /// Searches notes, or returns an empty list on any failure.
    ///
    /// The result is always safe to iterate; failures are logged on the
    /// diagnostic channel and never propagate.
    pub async fn search_notes(&self, filter: &SearchFilter) -> Vec<Note> {
        match self.try_search(filter).await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(error = %e, "search notes failed");
                Vec::new()
            }
        }
    }

    /// Appends content to a note, returning `false` on any failure.
    ///
    /// Failures are logged on the diagnostic channel and never propagate.
    pub async fn append_to_note(&self, note_id: impl Display, content: &str) -> bool {
        let id = note_id.to_string();
        match self.try_append(&id, content).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, note_id = %id, "append to note failed");
                false
            }
        }
    }

    /// Maps a non-success response to [`NotesError::HttpStatus`], preserving
    /// the body text as the error message when readable.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, NotesError> {
        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());

        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        Err(NotesError::HttpStatus {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;
    use wiremock::matchers::{
        body_json, header, method, path, query_param, query_param_is_missing,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NotesClient {
        let base_url = Url::parse(&server.uri()).unwrap();
        NotesClient::new(base_url, "test-key", "test-agent").unwrap()
    }

    /// Client pointed at a port nothing listens on.
    fn unreachable_client() -> NotesClient {
        let base_url = Url::parse("http://127.0.0.1:1").unwrap();
        NotesClient::new(base_url, "test-key", "test-agent").unwrap()
    }

    #[test]
    fn test_draft_defaults() {
        let draft = NoteDraft::new("T", "C");
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            body,
            json!({"title": "T", "content": "C", "tags": [], "category": "topics"})
        );
    }

    #[test]
    fn test_filter_omits_unset_fields() {
        assert!(SearchFilter::new().query_pairs().is_empty());

        let pairs = SearchFilter::new().keyword("rust").query_pairs();
        assert_eq!(pairs, vec![("keyword", "rust".to_string())]);
    }

    #[test]
    fn test_filter_joins_tags_with_comma() {
        let pairs = SearchFilter::new().tags(["a", "b"]).query_pairs();
        assert_eq!(pairs, vec![("tags", "a,b".to_string())]);
    }

    #[test]
    fn test_note_id_extraction() {
        let note: Note = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(note_id(&note), Some("7".to_string()));

        let note: Note = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(note_id(&note), Some("abc".to_string()));

        let note: Note = serde_json::from_value(json!({"title": "no id"})).unwrap();
        assert_eq!(note_id(&note), None);
    }

    #[tokio::test]
    async fn test_create_sends_headers_and_default_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notes"))
            .and(header("content-type", "application/json"))
            .and(header("x-api-key", "test-key"))
            .and(body_json(json!({
                "title": "T",
                "content": "C",
                "tags": [],
                "category": "topics"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let note = client.try_create(&NoteDraft::new("T", "C")).await.unwrap();
        assert_eq!(note.get("id"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_create_decodes_response_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notes"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 7, "title": "X"})),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let note = client.create_note(&NoteDraft::new("X", "body")).await.unwrap();

        let expected: Note = serde_json::from_value(json!({"id": 7, "title": "X"})).unwrap();
        assert_eq!(note, expected);
    }

    #[tokio::test]
    async fn test_create_with_tags_and_category() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notes"))
            .and(body_json(json!({
                "title": "T",
                "content": "C",
                "tags": ["a", "b"],
                "category": "projects"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let draft = NoteDraft::new("T", "C").tags(["a", "b"]).category("projects");
        assert!(client.create_note(&draft).await.is_some());
    }

    #[tokio::test]
    async fn test_search_empty_filter_sends_no_params() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notes"))
            .and(query_param_is_missing("keyword"))
            .and(query_param_is_missing("tags"))
            .and(query_param_is_missing("category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let notes = client.try_search(&SearchFilter::new()).await.unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_search_keyword_returns_empty_list_not_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notes"))
            .and(query_param("keyword", "Quantum Computing"))
            .and(query_param_is_missing("tags"))
            .and(query_param_is_missing("category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let filter = SearchFilter::new().keyword("Quantum Computing");
        let notes = client.search_notes(&filter).await;
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_search_serializes_tags_as_csv() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notes"))
            .and(query_param("tags", "a,b"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "hit"}])),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let notes = client.search_notes(&SearchFilter::new().tags(["a", "b"])).await;
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_append_sends_exact_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notes/7/append"))
            .and(body_json(json!({"content": "more text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        assert!(client.append_to_note(7, "more text").await);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_connection_refused_soft_failures() {
        let client = unreachable_client();

        let created = client.create_note(&NoteDraft::new("T", "C")).await;
        assert!(created.is_none());

        let found = client.search_notes(&SearchFilter::new().keyword("x")).await;
        assert!(found.is_empty());

        let appended = client.append_to_note(1, "more").await;
        assert!(!appended);

        assert!(logs_contain("create note failed"));
        assert!(logs_contain("search notes failed"));
        assert!(logs_contain("append to note failed"));
    }

    #[tokio::test]
    async fn test_timeout_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let base_url = Url::parse(&mock_server.uri()).unwrap();
        let client = NotesClient::builder(base_url, "test-key")
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let err = client.try_search(&SearchFilter::new()).await.unwrap_err();
        assert!(matches!(err, NotesError::Request(ref e) if e.is_timeout()));
        assert!(err.is_retryable());

        // Sentinel surface: the timeout collapses to an empty list.
        let notes = client.search_notes(&SearchFilter::new()).await;
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_append_uses_id_verbatim_in_path() {
        let mock_server = MockServer::start().await;

        // Ids are not percent-encoded, so a `/` addresses a different route.
        Mock::given(method("POST"))
            .and(path("/notes/a/b/append"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        assert!(client.append_to_note("a/b", "more").await);
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        let client = unreachable_client();

        let err = client.try_create(&NoteDraft::new("T", "C")).await.unwrap_err();
        assert!(matches!(err, NotesError::Request(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_carries_status_and_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.try_search(&SearchFilter::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            NotesError::HttpStatus { status: 500, ref message } if message == "Internal Server Error"
        ));

        // Sentinel surface: same failure collapses to an empty list.
        let notes = client.search_notes(&SearchFilter::new()).await;
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notes/99/append"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such note"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.try_append(99, "more").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());

        assert!(!client.append_to_note(99, "more").await);
    }

    #[tokio::test]
    async fn test_custom_timeout() {
        let base_url = Url::parse("https://notes.example.com").unwrap();
        let client = NotesClient::builder(base_url, "key")
            .timeout(Duration::from_secs(60))
            .agent_label("Research Agent")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "https://notes.example.com/");
        assert_eq!(client.agent_label(), "Research Agent");
    }
}
