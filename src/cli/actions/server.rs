use crate::{
    accounts::{self, AccountsConfig, AccountsState},
    provider::{HttpIdentityProvider, HttpProviderConfig},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub provider_url: Url,
    pub provider_client_id: String,
    pub provider_client_secret: SecretString,
    pub provider_timeout: Duration,
    pub public_base_url: String,
    pub password_min_length: usize,
    pub session_ttl_seconds: u64,
}

/// Build the provider client and serve the account pages.
///
/// # Errors
/// Returns an error if the provider client cannot be built or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    let provider_config = HttpProviderConfig::new(
        args.provider_url,
        args.provider_client_id,
        args.provider_client_secret,
    )
    .with_timeout(args.provider_timeout);

    info!(
        "Identity provider: {} (timeout {}s)",
        provider_config.base_url(),
        provider_config.timeout().as_secs()
    );

    let provider = HttpIdentityProvider::new(provider_config)
        .context("Failed to build identity provider client")?;

    let config = AccountsConfig::new(args.public_base_url)
        .with_password_min_length(args.password_min_length)
        .with_session_ttl_seconds(args.session_ttl_seconds);

    debug!("Accounts config: {:?}", config);

    let state = Arc::new(AccountsState::new(Arc::new(provider), config));

    accounts::new(args.port, state).await
}
