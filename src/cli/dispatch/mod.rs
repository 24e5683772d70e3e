//! Map validated CLI matches to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{accounts, provider, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let provider_opts = provider::Options::parse(matches)?;
    let accounts_opts = accounts::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        provider_url: provider_opts.url,
        provider_client_id: provider_opts.client_id,
        provider_client_secret: provider_opts.client_secret,
        provider_timeout: provider_opts.timeout,
        public_base_url: accounts_opts.public_base_url,
        password_min_length: accounts_opts.password_min_length,
        session_ttl_seconds: accounts_opts.session_ttl_seconds,
    }))
}
