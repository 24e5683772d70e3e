//! Form models for the account pages and their validation rules.
//!
//! Validation is a fast local check only; the identity provider enforces its
//! own policies (password strength, code format) on top. Every rule is
//! evaluated so the page can show all problems at once.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use utoipa::ToSchema;

pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_CONFIRM_PASSWORD: &str = "confirmPassword";
pub const FIELD_CODE: &str = "code";
pub const FIELD_REMEMBER_ME: &str = "rememberMe";

pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 6;

/// Error messages keyed by field name, or by a synthetic key for form-level errors.
///
/// Keys keep the order in which they were first reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry error set, used for form-level failures.
    #[must_use]
    pub fn single(key: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(key, message);
        errors
    }

    pub fn add(&mut self, key: &str, message: &str) {
        if let Some((_, messages)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            messages.push(message.to_string());
        } else {
            self.entries.push((key.to_string(), vec![message.to_string()]));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages recorded for `key`, empty when there are none.
    #[must_use]
    pub fn field(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, messages)| messages.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, messages)| (key.as_str(), messages.as_slice()))
    }

    /// Errors whose key is not one of the form's own fields.
    pub fn form_level<'a>(
        &'a self,
        fields: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a str, &'a [String])> + 'a {
        self.iter().filter(move |(key, _)| !fields.contains(key))
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Lightweight email syntax check, applied to trimmed input.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Normalize an email before it is used as the provider key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(errors: &mut FormErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add(FIELD_EMAIL, "Email is required");
    } else if !valid_email(email) {
        errors.add(FIELD_EMAIL, "Email is not a valid email address");
    }
}

/// HTML checkboxes post `on` when ticked and nothing otherwise.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1"
    ))
}

#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// # Errors
    /// Returns every field error found.
    pub fn validate(&self, password_min_length: usize) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        check_email(&mut errors, &self.email);

        if self.password.trim().is_empty() {
            errors.add(FIELD_PASSWORD, "Password is required");
        } else if self.password.chars().count() < password_min_length {
            errors.add(
                FIELD_PASSWORD,
                &format!("Password must be at least {password_min_length} characters long"),
            );
        }

        if self.confirm_password.trim().is_empty() {
            errors.add(FIELD_CONFIRM_PASSWORD, "Confirm Password is required");
        } else if self.confirm_password != self.password {
            errors.add(
                FIELD_CONFIRM_PASSWORD,
                "Password and its confirmation do not match",
            );
        }

        errors.into_result()
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("email", &self.email)
            .field("password", &"***")
            .field("confirm_password", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ConfirmForm {
    pub email: String,
    pub code: String,
}

impl ConfirmForm {
    /// # Errors
    /// Returns every field error found.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        check_email(&mut errors, &self.email);

        if self.code.trim().is_empty() {
            errors.add(FIELD_CODE, "Code is required");
        }

        errors.into_result()
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(deserialize_with = "checkbox")]
    pub remember_me: bool,
}

impl LoginForm {
    /// Login only checks presence; a malformed email simply fails to sign in.
    ///
    /// # Errors
    /// Returns every field error found.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if self.email.trim().is_empty() {
            errors.add(FIELD_EMAIL, "Email is required");
        }

        if self.password.trim().is_empty() {
            errors.add(FIELD_PASSWORD, "Password is required");
        }

        errors.into_result()
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"***")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}
