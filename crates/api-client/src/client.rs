//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{
    AuthApi, CategoriesApi, ClubEventsApi, ClubParticipantsApi, ClubsApi, CommentsApi, EventsApi,
    MembersApi, ParticipantsApi, PostsApi, ReportsApi,
};
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::fallback::Fallback;
use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::transport::{FileUpload, HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport};
use cozycampus_core::retry::retry_async;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Which backend service a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Service {
    /// Events, clubs, participants, categories
    #[default]
    Api,
    /// Posts and comments
    Forum,
}

/// Where the `Authorization` header of a request comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Credentials {
    /// The session token; a 401 expires the session
    #[default]
    Session,
    /// A token supplied with the request
    Token(String),
    /// No header at all
    Anonymous,
}

/// A request relative to one of the configured base URLs
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    service: Service,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: RequestBody,
    retry: Option<RetryPolicy>,
    credentials: Credentials,
}

impl ApiRequest {
    /// Create a request for `path` (slash-separated, relative to the base URL)
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            service: Service::Api,
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: RequestBody::Empty,
            retry: None,
            credentials: Credentials::Session,
        }
    }

    /// GET `path`
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST `path`
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT `path`
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE `path`
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a path segment (percent-encoded)
    #[must_use]
    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a file as a multipart form
    #[must_use]
    pub fn file(mut self, upload: FileUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }

    /// Target the forum service
    #[must_use]
    pub fn forum(mut self) -> Self {
        self.service = Service::Forum;
        self
    }

    /// Override the client's retry policy for this request
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Send without the session token
    ///
    /// A 401 answer is then reported as an ordinary API error and leaves the
    /// session alone.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.credentials = Credentials::Anonymous;
        self
    }

    /// Authenticate with `token` instead of the session token
    ///
    /// Like [`anonymous`](Self::anonymous), a 401 does not expire the session.
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.credentials = Credentials::Token(token.into());
        self
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL, for logs
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// CozyCampus API client
///
/// Cheap to clone; clones share the transport, the session and the
/// placeholder id counter.
#[derive(Clone)]
pub struct CampusClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    session: Session,
    fallback: Fallback,
}

impl fmt::Debug for CampusClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CampusClient")
            .field("base_url", &self.config.base_url)
            .field("forum_url", &self.config.forum_url)
            .field("session", &self.session)
            .field("fallback", &self.fallback.mode())
            .finish_non_exhaustive()
    }
}

impl CampusClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client sending through `transport`
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> ApiResult<Self> {
        config.validate()?;

        let mut session = Session::new(config.login_route.clone());
        if let Some(ref token) = config.token {
            session = session.with_token(token.clone());
        }

        Ok(Self {
            transport,
            fallback: Fallback::new(config.fallback),
            config: Arc::new(config),
            session,
        })
    }

    /// Builder-style method to replace the session
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the development fallback policy
    #[must_use]
    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access sign-in and account endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access event endpoints
    #[must_use]
    pub fn events(&self) -> EventsApi {
        EventsApi::new(self.clone())
    }

    /// Access club event endpoints
    #[must_use]
    pub fn club_events(&self) -> ClubEventsApi {
        EventsApi::club(self.clone())
    }

    /// Access club endpoints
    #[must_use]
    pub fn clubs(&self) -> ClubsApi {
        ClubsApi::new(self.clone())
    }

    /// Access club membership endpoints
    #[must_use]
    pub fn members(&self) -> MembersApi {
        MembersApi::new(self.clone())
    }

    /// Access event participation endpoints
    #[must_use]
    pub fn participants(&self) -> ParticipantsApi {
        ParticipantsApi::events(self.clone())
    }

    /// Access club event participation endpoints
    #[must_use]
    pub fn club_participants(&self) -> ClubParticipantsApi {
        ClubParticipantsApi::club_events(self.clone())
    }

    /// Access forum post endpoints
    #[must_use]
    pub fn posts(&self) -> PostsApi {
        PostsApi::new(self.clone())
    }

    /// Access forum comment endpoints
    #[must_use]
    pub fn comments(&self) -> CommentsApi {
        CommentsApi::new(self.clone())
    }

    /// Access forum report endpoints
    #[must_use]
    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.clone())
    }

    /// Access category endpoints
    #[must_use]
    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Request execution
    // -------------------------------------------------------------------------

    /// Execute a request and deserialize the response body
    ///
    /// An empty body deserializes as JSON `null`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        let body = response.body.trim();
        serde_json::from_str(if body.is_empty() { "null" } else { body }).map_err(ApiError::from)
    }

    /// Execute a request and return the body as JSON, `null` when empty
    pub async fn execute_value(&self, request: ApiRequest) -> ApiResult<Value> {
        self.execute(request).await
    }

    /// Execute a request whose body is irrelevant
    pub async fn execute_unit(&self, request: ApiRequest) -> ApiResult<()> {
        self.send(request).await.map(|_| ())
    }

    /// Execute a request and return the raw body
    pub async fn execute_text(&self, request: ApiRequest) -> ApiResult<String> {
        self.send(request).await.map(|response| response.body)
    }

    /// Execute an upload and extract the stored file URL
    ///
    /// The backend answers either with the bare URL or with an object
    /// carrying `url`, `imageUrl` or `image`.
    pub async fn execute_upload(&self, request: ApiRequest) -> ApiResult<String> {
        let body = self.execute_text(request).await?;
        upload_url(&body)
    }

    /// Perform a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(ApiRequest::get(path)).await
    }

    /// Perform a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// Resolve the absolute URL of a request
    pub fn url_for(&self, request: &ApiRequest) -> ApiResult<Url> {
        let base = match request.service {
            Service::Api => &self.config.base_url,
            Service::Forum => &self.config.forum_url,
        };

        let mut url =
            Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("{base} cannot be a base")))?
            .pop_if_empty()
            .extend(&request.segments);

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        Ok(url)
    }

    /// Send with the request's retry policy
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path(), request_id = tracing::field::Empty))]
    async fn send(&self, request: ApiRequest) -> ApiResult<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let url = self.url_for(&request)?;
        let policy = request.retry.as_ref().unwrap_or(&self.config.retry);

        let outcome = retry_async(
            &policy.config,
            |attempt| self.send_once(&request_id, &request, &url, attempt),
            |error| policy.should_retry(error),
        )
        .await;

        match outcome {
            Ok(result) => Ok(result.value),
            Err(failure) => {
                let context = ErrorContext {
                    request_id: Some(request_id.clone()),
                    endpoint: request.path(),
                    method: request.method.to_string(),
                };
                warn!(
                    context = %context,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "Request failed"
                );

                if failure.exhausted && failure.attempts > 1 {
                    Err(ApiError::RetriesExhausted {
                        attempts: failure.attempts,
                        last_error: Box::new(failure.error),
                    })
                } else {
                    Err(failure.error)
                }
            }
        }
    }

    /// Execute a single attempt
    async fn send_once(
        &self,
        request_id: &str,
        request: &ApiRequest,
        url: &Url,
        attempt: u32,
    ) -> ApiResult<HttpResponse> {
        let http_request = HttpRequest {
            method: request.method.clone(),
            url: url.clone(),
            headers: self.headers_for(request_id, request),
            body: request.body.clone(),
            timeout: self.config.timeout,
        };

        let start = Instant::now();
        let response = self.transport.send(http_request).await?;
        let elapsed = start.elapsed();

        debug!(
            attempt = attempt,
            status = response.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Response received"
        );

        match response.status {
            status if (200..300).contains(&status) => Ok(response),
            401 if request.credentials == Credentials::Session => {
                self.session.expire();
                Err(ApiError::Unauthorized)
            }
            status => Err(ApiError::api_response(status, error_message(&response.body))),
        }
    }

    fn headers_for(&self, request_id: &str, request: &ApiRequest) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            (X_REQUEST_ID.to_string(), request_id.to_string()),
        ];

        if matches!(request.body, RequestBody::Json(_)) {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        let bearer = match &request.credentials {
            Credentials::Session => self.session.bearer(),
            Credentials::Token(token) => Some(format!("Bearer {token}")),
            Credentials::Anonymous => None,
        };
        if let Some(bearer) = bearer {
            headers.push(("Authorization".to_string(), bearer));
        }

        headers
    }
}

/// Message from an error body: the JSON `message` (or `error`) field, else the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or_else(|| body.trim().to_string(), str::to_string),
        Ok(Value::String(message)) => message,
        _ => body.trim().to_string(),
    }
}

fn upload_url(body: &str) -> ApiResult<String> {
    let url = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(url)) => Some(url),
        Ok(Value::Object(map)) => ["url", "imageUrl", "image"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Ok(_) => None,
        Err(_) => Some(body.trim().to_string()),
    };

    url.filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::UnexpectedShape("upload response without a URL".to_string()))
}
