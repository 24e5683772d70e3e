//! External identity provider capability.
//!
//! Every durable piece of account state (user records, credentials,
//! confirmation codes, sessions) lives in the provider. This module only
//! describes what the account flows consume from it; [`http`] talks to a
//! provider over HTTP/JSON.

pub mod http;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use self::http::{HttpIdentityProvider, HttpProviderConfig};

/// Profile attribute holding the user's display name.
pub const NAME_ATTRIBUTE: &str = "name";

/// A `(code, description)` pair reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: String,
    pub description: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Remote user record, keyed by email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ProviderUser {
    /// A record only counts as registered once the provider assigned it a status.
    #[must_use]
    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }
}

/// Outcome of a provider mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResult {
    succeeded: bool,
    errors: Vec<ProviderError>,
}

impl OperationResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            succeeded: true,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn failed(errors: Vec<ProviderError>) -> Self {
        Self {
            succeeded: false,
            errors,
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    #[must_use]
    pub fn errors(&self) -> &[ProviderError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<ProviderError> {
        self.errors
    }
}

/// Session issued by the provider on a successful sign-in.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: SecretString,
    /// Lifetime in seconds, when the provider states one.
    pub expires_in: Option<u64>,
}

#[derive(Clone, Debug)]
pub enum SignInResult {
    SignedIn(Session),
    Rejected(Vec<ProviderError>),
}

impl SignInResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Failures talking to the provider, as opposed to errors it reports.
#[derive(Debug, Error)]
pub enum ProviderFailure {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
    #[error("invalid identity provider URL: {0}")]
    InvalidUrl(String),
}

/// Capabilities the account flows need from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look a user up by email; `Ok(None)` when the provider has no record.
    async fn find_user_by_email(&self, email: &str)
        -> Result<Option<ProviderUser>, ProviderFailure>;

    /// Register a new identity with the given profile attributes.
    async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &BTreeMap<String, String>,
    ) -> Result<OperationResult, ProviderFailure>;

    /// Activate a pending identity with its confirmation code.
    async fn confirm_user(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<OperationResult, ProviderFailure>;

    /// Authenticate and open a session.
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
        remember_me: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderFailure>;
}
