//! In-memory identity provider for flow and router tests.

use crate::provider::{
    IdentityProvider, OperationResult, ProviderError, ProviderFailure, ProviderUser, Session,
    SignInResult,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

pub(crate) const CONFIRMATION_CODE: &str = "123456";
pub(crate) const REJECTED_PASSWORD: &str = "weakpass";

const UNCONFIRMED: &str = "UNCONFIRMED";
const CONFIRMED: &str = "CONFIRMED";

#[derive(Clone, Debug)]
struct StoredUser {
    status: Option<String>,
    password: String,
    attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub(crate) struct SignInCall {
    pub email: String,
    pub remember_me: bool,
    pub lockout_on_failure: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Calls {
    pub find: usize,
    pub create: usize,
    pub confirm_force: Vec<bool>,
    pub sign_in: Vec<SignInCall>,
}

/// Behaves like a small user pool: created users start `UNCONFIRMED`, the
/// code [`CONFIRMATION_CODE`] confirms them, and only confirmed users sign in.
#[derive(Default)]
pub(crate) struct MemoryProvider {
    users: Mutex<HashMap<String, StoredUser>>,
    calls: Mutex<Calls>,
    outage: AtomicBool,
}

#[allow(clippy::unwrap_used)]
impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, email: &str, status: Option<&str>, password: &str) -> Self {
        self.users.lock().unwrap().insert(
            email.to_string(),
            StoredUser {
                status: status.map(ToString::to_string),
                password: password.to_string(),
                attributes: BTreeMap::new(),
            },
        );
        self
    }

    pub fn set_outage(&self, outage: bool) {
        self.outage.store(outage, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_of(&self, email: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(email)
            .and_then(|user| user.status.clone())
    }

    pub fn attribute(&self, email: &str, name: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(email)
            .and_then(|user| user.attributes.get(name).cloned())
    }

    fn check_outage(&self) -> Result<(), ProviderFailure> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(ProviderFailure::UnexpectedStatus {
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl IdentityProvider for MemoryProvider {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderUser>, ProviderFailure> {
        self.calls.lock().unwrap().find += 1;
        self.check_outage()?;

        Ok(self.users.lock().unwrap().get(email).map(|user| ProviderUser {
            email: email.to_string(),
            status: user.status.clone(),
            attributes: user.attributes.clone(),
        }))
    }

    async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &BTreeMap<String, String>,
    ) -> Result<OperationResult, ProviderFailure> {
        self.calls.lock().unwrap().create += 1;
        self.check_outage()?;

        if password.expose_secret() == REJECTED_PASSWORD {
            return Ok(OperationResult::failed(vec![ProviderError::new(
                "InvalidPassword",
                "Password did not conform with policy: Password must have symbol characters",
            )]));
        }

        let mut users = self.users.lock().unwrap();
        if users.get(email).is_some_and(|user| user.status.is_some()) {
            return Ok(OperationResult::failed(vec![ProviderError::new(
                "UsernameExists",
                "An account with the given email already exists.",
            )]));
        }

        users.insert(
            email.to_string(),
            StoredUser {
                status: Some(UNCONFIRMED.to_string()),
                password: password.expose_secret().to_string(),
                attributes: attributes.clone(),
            },
        );

        Ok(OperationResult::success())
    }

    async fn confirm_user(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<OperationResult, ProviderFailure> {
        self.calls.lock().unwrap().confirm_force.push(force_confirm);
        self.check_outage()?;

        let mut users = self.users.lock().unwrap();
        let Some(stored) = users.get_mut(&user.email) else {
            return Ok(OperationResult::failed(vec![ProviderError::new(
                "UserNotFound",
                "Username/client id combination not found.",
            )]));
        };

        if stored.status.as_deref() == Some(CONFIRMED) {
            return Ok(OperationResult::failed(vec![ProviderError::new(
                "NotAuthorized",
                "User cannot be confirmed. Current status is CONFIRMED",
            )]));
        }

        if code != CONFIRMATION_CODE {
            return Ok(OperationResult::failed(vec![ProviderError::new(
                "CodeMismatch",
                "Invalid verification code provided, please try again.",
            )]));
        }

        stored.status = Some(CONFIRMED.to_string());
        Ok(OperationResult::success())
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
        remember_me: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderFailure> {
        self.calls.lock().unwrap().sign_in.push(SignInCall {
            email: email.to_string(),
            remember_me,
            lockout_on_failure,
        });
        self.check_outage()?;

        let users = self.users.lock().unwrap();
        let signed_in = users.get(email).is_some_and(|user| {
            user.status.as_deref() == Some(CONFIRMED) && user.password == password.expose_secret()
        });

        if signed_in {
            return Ok(SignInResult::SignedIn(Session {
                token: SecretString::from(format!("session-{email}")),
                expires_in: Some(3600),
            }));
        }

        Ok(SignInResult::Rejected(vec![ProviderError::new(
            "NotAuthorized",
            "Incorrect username or password.",
        )]))
    }
}
