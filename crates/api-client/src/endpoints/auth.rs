//! Authentication endpoints
//!
//! Sign-in is the only place a bearer token is obtained: a successful
//! [`AuthApi::login`] stores it in the client's [`Session`](crate::Session),
//! and [`AuthApi::logout`] forgets it.
//!
//! Every request here is sent once and without the session token, so a 401
//! (wrong password, expired code) is an ordinary API error and never
//! triggers the session-expired listener.

use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use crate::wire::null_default;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Authentication API interface
#[derive(Clone)]
pub struct AuthApi {
    client: CampusClient,
}

impl AuthApi {
    /// Create a new authentication API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self { client }
    }

    fn request(method: reqwest::Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, "auth")
            .segment(path)
            .anonymous()
            .retry(RetryPolicy::none())
    }

    /// Sign in and keep the returned token in the session
    ///
    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let email = checked_email(email)?;
        if password.is_empty() {
            return Err(ApiError::validation("the password is required"));
        }

        let request = Self::request(reqwest::Method::POST, "login")
            .json(&json!({ "email": email, "password": password }))?;
        let response: AuthResponse = self.client.execute(request).await?;

        let token = response
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::UnexpectedShape("login response without a token".to_string()))?;
        self.client.session().set_token(token);
        info!(email = %email, "Signed in");
        Ok(response)
    }

    /// Create an account; the backend then mails a verification code
    ///
    /// POST /auth/register
    pub async fn register(&self, registration: &Registration) -> ApiResult<String> {
        registration.check()?;
        let request = Self::request(reqwest::Method::POST, "register").json(registration)?;
        self.message(request).await
    }

    /// Mail a verification code
    ///
    /// GET /auth/send-otp/<email>
    pub async fn send_otp(&self, email: &str) -> ApiResult<String> {
        let email = checked_email(email)?;
        self.message(Self::request(reqwest::Method::GET, "send-otp").segment(email))
            .await
    }

    /// Mail a fresh verification code
    ///
    /// POST /auth/resend-otp?email=<email>
    pub async fn resend_otp(&self, email: &str) -> ApiResult<String> {
        let email = checked_email(email)?;
        self.message(Self::request(reqwest::Method::POST, "resend-otp").query("email", email))
            .await
    }

    /// Confirm an account with the mailed code
    ///
    /// POST /auth/verify
    pub async fn verify(&self, email: &str, code: &str) -> ApiResult<String> {
        let email = checked_email(email)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::validation("the verification code is required"));
        }
        let request = Self::request(reqwest::Method::POST, "verify")
            .json(&json!({ "email": email, "verificationCode": code }))?;
        self.message(request).await
    }

    /// Mail a password reset token
    ///
    /// POST /auth/generate-reset-password-token?email=<email>
    pub async fn request_password_reset(&self, email: &str) -> ApiResult<String> {
        let email = checked_email(email)?;
        let request = Self::request(reqwest::Method::POST, "generate-reset-password-token")
            .query("email", email);
        self.message(request).await
    }

    /// Check a mailed reset token before asking for the new password
    ///
    /// POST /auth/validate-reset-token
    pub async fn validate_reset_token(&self, email: &str, token: &str) -> ApiResult<String> {
        let email = checked_email(email)?;
        let request = Self::request(reqwest::Method::POST, "validate-reset-token")
            .json(&json!({ "email": email, "resetPasswordToken": token.trim() }))?;
        self.message(request).await
    }

    /// Set a new password; both entries must match
    ///
    /// POST /auth/reset-password
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        confirmation: &str,
    ) -> ApiResult<String> {
        let email = checked_email(email)?;
        check_passwords(new_password, confirmation)?;
        let request = Self::request(reqwest::Method::POST, "reset-password").json(&json!({
            "email": email,
            "newPassword": new_password,
            "confirmationPassword": confirmation,
        }))?;
        self.message(request).await
    }

    /// Sign out
    ///
    /// The token is dropped from the session before the backend is told, so
    /// no later call can use it. A failing logout request is only logged.
    ///
    /// POST /auth/logout
    pub async fn logout(&self) {
        let Some(token) = self.client.session().token() else {
            return;
        };
        self.client.session().clear();

        let request = ApiRequest::post("auth/logout")
            .bearer(token)
            .retry(RetryPolicy::none());
        match self.client.execute_unit(request).await {
            Ok(()) => info!("Signed out"),
            Err(error) => warn!(error = %error, "Logout request failed, signed out locally"),
        }
    }

    async fn message(&self, request: ApiRequest) -> ApiResult<String> {
        let body = self.client.execute_text(request).await?;
        Ok(response_message(&body))
    }
}

/// Text of an auth answer: the `message` field, a bare string, or the raw body
fn response_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| body.trim().to_string(), str::to_string),
        Ok(Value::String(message)) => message,
        _ => body.trim().to_string(),
    }
}

fn checked_email(email: &str) -> ApiResult<&str> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ApiError::validation(format!("invalid email address: {email}"))),
    }
}

fn check_passwords(password: &str, confirmation: &str) -> ApiResult<()> {
    if password.is_empty() {
        return Err(ApiError::validation("the password is required"));
    }
    if password != confirmation {
        return Err(ApiError::validation("the passwords do not match"));
    }
    Ok(())
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Answer to a sign-in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Signed-in user id, when the backend sends it
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Backend role name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Informational message
    #[serde(default, deserialize_with = "null_default")]
    pub message: String,
}

/// Fields of a new account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Sign-in email
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Same password, typed again
    pub confirm_password: String,
}

impl Registration {
    /// Registration whose confirmation repeats `password`
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            confirm_password: password.clone(),
            password,
        }
    }

    fn check(&self) -> ApiResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(ApiError::validation("first and last name are required"));
        }
        checked_email(&self.email)?;
        check_passwords(&self.password, &self.confirm_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::scripted;
    use crate::session::Session;
    use crate::testing::{RecordingListener, ScriptedTransport};
    use crate::transport::RequestBody;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_login_stores_token() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(200, json!({"token": "jwt-1", "userId": 7})),
        );

        let response = client.auth().login(" lina@campus.tn ", "secret").await.unwrap();
        assert_eq!(response.user_id, Some(7));
        assert_eq!(client.session().token().as_deref(), Some("jwt-1"));

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.path(), "/api/auth/login");
        assert!(request.header("authorization").is_none());
        assert_eq!(
            request.body,
            RequestBody::Json(json!({"email": "lina@campus.tn", "password": "secret"}))
        );
    }

    #[tokio::test]
    async fn test_login_without_token_is_an_error() {
        let (client, _) =
            scripted(ScriptedTransport::new().push_json(200, json!({"message": "ok"})));

        let err = client.auth().login("lina@campus.tn", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape(_)));
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_expire_session() {
        let listener = Arc::new(RecordingListener::default());
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(401, json!({"message": "Identifiants invalides"})),
        );
        let client = client.with_session(Session::new("/auth").with_listener(listener.clone()));

        let err = client.auth().login("lina@campus.tn", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Identifiants invalides");
        assert_eq!(listener.expirations(), 0);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_then_notifies_backend() {
        let (client, transport) = scripted(ScriptedTransport::new().push_text(500, "boom"));
        client.session().set_token("jwt-1");

        client.auth().logout().await;

        assert!(!client.session().is_authenticated());
        assert_eq!(transport.request_count(), 1);
        assert_eq!(
            transport.last_request().unwrap().header("authorization"),
            Some("Bearer jwt-1")
        );

        client.auth().logout().await;
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_registration_checked_locally() {
        let (client, transport) = scripted(ScriptedTransport::new());

        let mut mismatch = Registration::new("Lina", "Ben Ali", "lina@campus.tn", "secret");
        mismatch.confirm_password = "other".to_string();
        assert!(matches!(
            client.auth().register(&mismatch).await,
            Err(ApiError::Validation(_))
        ));

        let bad_email = Registration::new("Lina", "Ben Ali", "lina", "secret");
        assert!(client.auth().register(&bad_email).await.is_err());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_otp_routes_and_messages() {
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_text(200, "Code envoyé")
                .push_json(200, json!({"message": "Compte vérifié"})),
        );

        assert_eq!(client.auth().send_otp("lina@campus.tn").await.unwrap(), "Code envoyé");
        assert_eq!(
            transport.last_request().unwrap().url.path(),
            "/api/auth/send-otp/lina@campus.tn"
        );

        let message = client.auth().verify("lina@campus.tn", " 123456 ").await.unwrap();
        assert_eq!(message, "Compte vérifié");
        assert_eq!(
            transport.last_request().unwrap().body,
            RequestBody::Json(json!({"email": "lina@campus.tn", "verificationCode": "123456"}))
        );
    }
}
