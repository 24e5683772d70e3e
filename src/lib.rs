//! # WebAdvert accounts front-end
//!
//! `webadvert` serves the signup, email confirmation and login pages of the
//! WebAdvert site. It keeps no user data of its own: every flow is a thin
//! translation from an HTML form into a call on an external identity provider.
//!
//! ## Flows
//!
//! - **Signup:** validate the form, refuse emails the provider already knows,
//!   then ask the provider to create the user and send the user to the confirm page.
//! - **Confirm:** look the user up and submit the emailed confirmation code,
//!   forcing activation of the account.
//! - **Login:** hand the credentials to the provider with lockout disabled and
//!   store the session token it issues in a cookie. Failures always read
//!   "Email or password is incorrect" so the page cannot be used to find out which
//!   emails are registered.
//!
//! Provider rejections are rendered back into the originating form; provider
//! outages degrade to a generic form error and never take the process down.

pub mod accounts;
pub mod cli;
pub mod provider;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
