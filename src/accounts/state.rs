//! Shared, read-only state for the account handlers.

use crate::{accounts::forms::DEFAULT_PASSWORD_MIN_LENGTH, provider::IdentityProvider};
use std::{fmt, sync::Arc};
use url::Url;

const DEFAULT_SESSION_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AccountsConfig {
    public_base_url: String,
    password_min_length: usize,
    session_ttl_seconds: u64,
}

impl AccountsConfig {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        Self {
            public_base_url,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_password_min_length(mut self, length: usize) -> Self {
        self.password_min_length = length;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    #[must_use]
    pub fn password_min_length(&self) -> usize {
        self.password_min_length
    }

    /// Lifetime of a remembered session when the provider does not state one.
    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        Url::parse(&self.public_base_url).is_ok_and(|url| url.scheme() == "https")
    }
}

pub struct AccountsState {
    provider: Arc<dyn IdentityProvider>,
    config: AccountsConfig,
}

impl AccountsState {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, config: AccountsConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &AccountsConfig {
        &self.config
    }
}

impl fmt::Debug for AccountsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountsState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
