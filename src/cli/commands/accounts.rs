use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_PUBLIC_BASE_URL: &str = "public-base-url";
pub const ARG_PASSWORD_MIN_LENGTH: &str = "password-min-length";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub public_base_url: String,
    pub password_min_length: usize,
    pub session_ttl_seconds: u64,
}

impl Options {
    /// Parse account page arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the public base URL is not a valid URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let public_base_url = matches
            .get_one::<String>(ARG_PUBLIC_BASE_URL)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_PUBLIC_BASE_URL}"))?;
        Url::parse(&public_base_url)
            .with_context(|| format!("Invalid public base URL: {public_base_url}"))?;

        Ok(Self {
            public_base_url,
            password_min_length: matches
                .get_one::<usize>(ARG_PASSWORD_MIN_LENGTH)
                .copied()
                .unwrap_or(6),
            session_ttl_seconds: matches
                .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(604_800),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PUBLIC_BASE_URL)
                .long(ARG_PUBLIC_BASE_URL)
                .help("Public URL of the site; https marks session cookies Secure")
                .env("WEBADVERT_PUBLIC_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_PASSWORD_MIN_LENGTH)
                .long(ARG_PASSWORD_MIN_LENGTH)
                .help("Minimum password length checked before calling the identity provider")
                .env("WEBADVERT_PASSWORD_MIN_LENGTH")
                .default_value("6")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Remembered session lifetime when the provider does not state one")
                .env("WEBADVERT_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(u64)),
        )
}
