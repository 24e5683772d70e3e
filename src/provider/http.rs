//! HTTP/JSON identity provider client.
//!
//! Endpoints are resolved relative to the configured base URL:
//!
//! | capability           | request                                  |
//! |----------------------|------------------------------------------|
//! | `find_user_by_email` | `GET  v1/users/{email}`                  |
//! | `create_user`        | `POST v1/users`                          |
//! | `confirm_user`       | `POST v1/users/{email}/confirm`          |
//! | `sign_in`            | `POST v1/sessions`                       |
//!
//! Rejections come back as `4xx` with `{"errors":[{"code","description"}]}`
//! and are reported through [`OperationResult`]. Anything else the provider
//! answers with (`5xx`, garbage bodies, transport errors) is a
//! [`ProviderFailure`].

use super::{
    IdentityProvider, OperationResult, ProviderError, ProviderFailure, ProviderUser, Session,
    SignInResult,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, error, info_span, instrument, Instrument};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const MAX_ERROR_BODY_CHARS: usize = 256;

#[derive(Clone, Debug)]
pub struct HttpProviderConfig {
    base_url: Url,
    client_id: String,
    client_secret: SecretString,
    timeout: Duration,
}

impl HttpProviderConfig {
    #[must_use]
    pub fn new(base_url: Url, client_id: String, client_secret: SecretString) -> Self {
        Self {
            base_url,
            client_id,
            client_secret,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    session_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
pub struct HttpIdentityProvider {
    client: Client,
    config: HttpProviderConfig,
}

impl HttpIdentityProvider {
    /// Build the client; the base URL must be `http` or `https`.
    ///
    /// # Errors
    /// Returns an error if the URL cannot carry paths or the HTTP client fails to build.
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderFailure> {
        let url = &config.base_url;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ProviderFailure::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderFailure> {
        let mut url = self.config.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ProviderFailure::InvalidUrl(self.config.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.config.client_secret.expose_secret())
            .header("X-Client-Id", &self.config.client_id)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ProviderFailure> {
        let span = info_span!("provider.request", provider.operation = operation);
        let response = self.authorized(request).send().instrument(span).await?;
        debug!("{operation}: provider answered {}", response.status());
        Ok(response)
    }
}

async fn unexpected_status(response: Response) -> ProviderFailure {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("Unexpected identity provider status {}", status);

    ProviderFailure::UnexpectedStatus {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Parse the provider's error list; an empty list becomes a single status-derived error.
fn reported_errors(status: StatusCode, body: &str) -> Result<Vec<ProviderError>, ProviderFailure> {
    let parsed: ErrorBody = serde_json::from_str(body)
        .map_err(|e| ProviderFailure::InvalidResponse(format!("{status}: {e}")))?;

    if parsed.errors.is_empty() {
        return Ok(vec![ProviderError::new(
            status.as_str(),
            status.canonical_reason().unwrap_or("Request rejected"),
        )]);
    }

    Ok(parsed.errors)
}

async fn operation_result(response: Response) -> Result<OperationResult, ProviderFailure> {
    let status = response.status();

    if status.is_success() {
        return Ok(OperationResult::success());
    }

    if status.is_client_error() {
        let body = response.text().await?;
        return reported_errors(status, &body).map(OperationResult::failed);
    }

    Err(unexpected_status(response).await)
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self))]
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderUser>, ProviderFailure> {
        let url = self.endpoint(&["v1", "users", email])?;
        let response = self
            .send("find_user_by_email", self.client.get(url))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await?;
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(|e| ProviderFailure::InvalidResponse(e.to_string()))
            }
            _ => Err(unexpected_status(response).await),
        }
    }

    #[instrument(skip(self, password, attributes))]
    async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &BTreeMap<String, String>,
    ) -> Result<OperationResult, ProviderFailure> {
        let url = self.endpoint(&["v1", "users"])?;
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "attributes": attributes,
        });

        let response = self
            .send("create_user", self.client.post(url).json(&payload))
            .await?;

        operation_result(response).await
    }

    #[instrument(skip(self, user, code), fields(email = %user.email))]
    async fn confirm_user(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<OperationResult, ProviderFailure> {
        let url = self.endpoint(&["v1", "users", &user.email, "confirm"])?;
        let payload = json!({
            "code": code,
            "force_confirm": force_confirm,
        });

        let response = self
            .send("confirm_user", self.client.post(url).json(&payload))
            .await?;

        operation_result(response).await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
        remember_me: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderFailure> {
        let url = self.endpoint(&["v1", "sessions"])?;
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "remember_me": remember_me,
            "lockout_on_failure": lockout_on_failure,
        });

        let response = self
            .send("sign_in", self.client.post(url).json(&payload))
            .await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            let session: SessionBody = serde_json::from_str(&body)
                .map_err(|e| ProviderFailure::InvalidResponse(e.to_string()))?;

            return Ok(SignInResult::SignedIn(Session {
                token: SecretString::from(session.session_token),
                expires_in: session.expires_in,
            }));
        }

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            // The login form shows one generic message, so an unreadable body still rejects
            let body = response.text().await.unwrap_or_default();
            let errors = reported_errors(status, &body).unwrap_or_default();
            return Ok(SignInResult::Rejected(errors));
        }

        Err(unexpected_status(response).await)
    }
}
