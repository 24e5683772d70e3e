use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_CLIENT_ID: &str = "provider-client-id";
pub const ARG_PROVIDER_CLIENT_SECRET: &str = "provider-client-secret";
pub const ARG_PROVIDER_TIMEOUT_SECONDS: &str = "provider-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    pub timeout: Duration,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or the URL is not http(s).
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_required = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };

        let raw_url = read_required(ARG_PROVIDER_URL)?;
        let url = Url::parse(&raw_url)
            .with_context(|| format!("Invalid identity provider URL: {raw_url}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Identity provider URL must use http or https: {raw_url}"
            ));
        }

        let timeout = matches
            .get_one::<u64>(ARG_PROVIDER_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            url,
            client_id: read_required(ARG_PROVIDER_CLIENT_ID)?,
            client_secret: SecretString::from(read_required(ARG_PROVIDER_CLIENT_SECRET)?),
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Identity provider base URL, example: https://idp.webadvert.dev/")
                .env("WEBADVERT_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_CLIENT_ID)
                .long(ARG_PROVIDER_CLIENT_ID)
                .help("Client id registered with the identity provider")
                .env("WEBADVERT_PROVIDER_CLIENT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_CLIENT_SECRET)
                .long(ARG_PROVIDER_CLIENT_SECRET)
                .help("Client secret registered with the identity provider")
                .env("WEBADVERT_PROVIDER_CLIENT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_TIMEOUT_SECONDS)
                .long(ARG_PROVIDER_TIMEOUT_SECONDS)
                .help("Timeout for identity provider requests in seconds")
                .env("WEBADVERT_PROVIDER_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
