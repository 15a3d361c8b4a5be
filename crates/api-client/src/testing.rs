//! Test doubles for the transport and session seams
//!
//! Available in unit tests and to downstream crates with the `testing`
//! feature.

use crate::error::{ApiError, ApiResult};
use crate::session::SessionListener;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Transport that replays queued responses and records every request
///
/// When the queue runs dry, further requests fail with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResult<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response
    #[must_use]
    pub fn push_json(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    /// Queue a plain-text response
    #[must_use]
    pub fn push_text(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    /// Queue a failure where no response arrives
    #[must_use]
    pub fn push_error(self, error: ApiError) -> Self {
        self.push(Err(error))
    }

    fn push(self, response: ApiResult<HttpResponse>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Requests sent so far
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests sent so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The most recent request
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("connection refused".to_string())))
    }
}

/// Session listener counting expirations
#[derive(Debug, Default)]
pub struct RecordingListener {
    count: AtomicUsize,
    last_route: Mutex<Option<String>>,
}

impl RecordingListener {
    /// Number of expirations observed
    #[must_use]
    pub fn expirations(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Route passed with the most recent expiration
    #[must_use]
    pub fn last_route(&self) -> Option<String> {
        self.last_route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionListener for RecordingListener {
    fn session_expired(&self, login_route: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self
            .last_route
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(login_route.to_string());
    }
}
