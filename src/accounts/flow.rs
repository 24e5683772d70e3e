//! Signup, confirm and login sequencing against the identity provider.
//!
//! These functions hold no rules about what a valid password or code is; they
//! validate the form shape, make the provider calls in order, and classify the
//! outcome. The HTTP handlers turn a [`FlowError`] back into form errors.

use crate::{
    accounts::forms::{normalize_email, ConfirmForm, FormErrors, LoginForm, SignupForm},
    provider::{
        IdentityProvider, ProviderError, ProviderFailure, Session, SignInResult, NAME_ATTRIBUTE,
    },
};
use secrecy::SecretString;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

pub const KEY_USER_EXISTS: &str = "User Exists";
pub const USER_EXISTS: &str = "User with this email already exists";

pub const KEY_USER_NOT_FOUND: &str = "User Not Found";
pub const USER_NOT_FOUND: &str = "A user with the given address was not found";

pub const KEY_LOGIN_FAILURE: &str = "Login Failure";
pub const LOGIN_FAILURE: &str = "Email or password is incorrect";

pub const KEY_PROVIDER_UNAVAILABLE: &str = "Provider Unavailable";
pub const PROVIDER_UNAVAILABLE: &str =
    "The identity service is unavailable, please try again later";

pub const KEY_PROVIDER_REJECTED: &str = "Request Rejected";
pub const PROVIDER_REJECTED: &str = "The identity service rejected the request";

/// Every way a flow can end without redirecting.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("form validation failed")]
    Validation(FormErrors),
    #[error("user already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("identity provider rejected the request")]
    Provider(Vec<ProviderError>),
    #[error("identity provider unavailable: {0}")]
    Unavailable(#[source] ProviderFailure),
    #[error("sign-in rejected")]
    AuthFailure,
}

impl FlowError {
    /// Errors to show on the re-rendered form.
    #[must_use]
    pub fn into_form_errors(self) -> FormErrors {
        match self {
            Self::Validation(errors) => errors,
            Self::Conflict => FormErrors::single(KEY_USER_EXISTS, USER_EXISTS),
            Self::NotFound => FormErrors::single(KEY_USER_NOT_FOUND, USER_NOT_FOUND),
            Self::Provider(reported) if reported.is_empty() => {
                FormErrors::single(KEY_PROVIDER_REJECTED, PROVIDER_REJECTED)
            }
            Self::Provider(reported) => {
                let mut errors = FormErrors::new();
                for error in &reported {
                    errors.add(&error.code, &error.description);
                }
                errors
            }
            Self::Unavailable(_) => {
                FormErrors::single(KEY_PROVIDER_UNAVAILABLE, PROVIDER_UNAVAILABLE)
            }
            Self::AuthFailure => FormErrors::single(KEY_LOGIN_FAILURE, LOGIN_FAILURE),
        }
    }
}

fn unavailable(failure: ProviderFailure) -> FlowError {
    error!("Identity provider call failed: {failure}");

    FlowError::Unavailable(failure)
}

/// Register a new user; returns the normalized email on success.
///
/// # Errors
/// Returns a [`FlowError`] describing why the form must be shown again.
#[instrument(skip_all)]
pub async fn signup(
    provider: &dyn IdentityProvider,
    form: &SignupForm,
    password_min_length: usize,
) -> Result<String, FlowError> {
    form.validate(password_min_length).map_err(FlowError::Validation)?;

    let email = normalize_email(&form.email);

    let existing = provider
        .find_user_by_email(&email)
        .await
        .map_err(unavailable)?;

    if existing.as_ref().is_some_and(|user| user.has_status()) {
        debug!("User already exists");
        return Err(FlowError::Conflict);
    }

    let attributes = BTreeMap::from([(NAME_ATTRIBUTE.to_string(), email.clone())]);
    let password = SecretString::from(form.password.clone());

    let result = provider
        .create_user(&email, &password, &attributes)
        .await
        .map_err(unavailable)?;

    if !result.succeeded() {
        debug!("Provider rejected signup: {:?}", result.errors());
        return Err(FlowError::Provider(result.into_errors()));
    }

    info!("User signed up, awaiting confirmation");

    Ok(email)
}

/// Activate a pending user with the emailed confirmation code.
///
/// # Errors
/// Returns a [`FlowError`] describing why the form must be shown again.
#[instrument(skip_all)]
pub async fn confirm(provider: &dyn IdentityProvider, form: &ConfirmForm) -> Result<(), FlowError> {
    form.validate().map_err(FlowError::Validation)?;

    let email = normalize_email(&form.email);

    let Some(user) = provider
        .find_user_by_email(&email)
        .await
        .map_err(unavailable)?
    else {
        debug!("User not found");
        return Err(FlowError::NotFound);
    };

    let result = provider
        .confirm_user(&user, form.code.trim(), true)
        .await
        .map_err(unavailable)?;

    if !result.succeeded() {
        debug!("Provider rejected confirmation: {:?}", result.errors());
        return Err(FlowError::Provider(result.into_errors()));
    }

    info!("User confirmed");

    Ok(())
}

/// Sign in with lockout disabled and return the provider-issued session.
///
/// # Errors
/// Returns a [`FlowError`] describing why the form must be shown again. A
/// rejection is always [`FlowError::AuthFailure`], whatever the provider said.
#[instrument(skip_all)]
pub async fn login(
    provider: &dyn IdentityProvider,
    form: &LoginForm,
) -> Result<Session, FlowError> {
    form.validate().map_err(FlowError::Validation)?;

    let email = normalize_email(&form.email);
    let password = SecretString::from(form.password.clone());

    match provider
        .sign_in(&email, &password, form.remember_me, false)
        .await
        .map_err(unavailable)?
    {
        SignInResult::SignedIn(session) => {
            info!("User signed in");
            Ok(session)
        }
        SignInResult::Rejected(errors) => {
            debug!("Provider rejected sign-in: {:?}", errors);
            Err(FlowError::AuthFailure)
        }
    }
}
