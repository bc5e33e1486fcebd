//! Process-local identity provider.
//!
//! Raises the same error names as the hosted provider so classification can
//! be exercised end to end. Confirmation codes are six random digits and can
//! be read back with [`InMemoryIdentityProvider::issued_code`].

use crate::session::errors::{
    INVALID_PARAMETER, INVALID_PASSWORD, NOT_AUTHORIZED, USERNAME_EXISTS, USER_NOT_CONFIRMED,
    USER_NOT_FOUND,
};
use crate::session::identity::{
    AuthenticatedUser, IdentityProvider, ProviderError, ProviderResult, SignUpResult,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 8;
const CODE_MISMATCH: &str = "CodeMismatchException";
const NO_SESSION: &str = "NoCurrentUser";

struct MemoryUser {
    password: String,
    confirmed: bool,
    disabled: bool,
    groups: Vec<String>,
    code: Option<String>,
}

#[derive(Default)]
struct IdentityState {
    users: BTreeMap<String, MemoryUser>,
    current: Option<String>,
    session_lookups: usize,
    resend_count: usize,
    fail_sign_out: bool,
}

/// In-memory [`IdentityProvider`].
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<IdentityState>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already confirmed account.
    pub fn with_user<I, S>(self, email: &str, password: &str, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().users.insert(
            email.to_string(),
            MemoryUser {
                password: password.to_string(),
                confirmed: true,
                disabled: false,
                groups: groups.into_iter().map(Into::into).collect(),
                code: None,
            },
        );
        self
    }

    /// Registers an account that still has to confirm its code.
    pub fn with_unconfirmed_user(self, email: &str, password: &str) -> Self {
        self.state.lock().users.insert(
            email.to_string(),
            MemoryUser {
                password: password.to_string(),
                confirmed: false,
                disabled: false,
                groups: Vec::new(),
                code: Some(generate_code()),
            },
        );
        self
    }

    /// Starts with `email` already signed in.
    pub fn with_session(self, email: &str) -> Self {
        self.state.lock().current = Some(email.to_string());
        self
    }

    pub fn disable_user(&self, email: &str) {
        if let Some(user) = self.state.lock().users.get_mut(email) {
            user.disabled = true;
        }
    }

    /// Replaces the group claims of `email`, as an administrator would.
    pub fn set_groups<I, S>(&self, email: &str, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(user) = self.state.lock().users.get_mut(email) {
            user.groups = groups.into_iter().map(Into::into).collect();
        }
    }

    /// Ends the current session without going through the client.
    pub fn expire_session(&self) {
        self.state.lock().current = None;
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.state.lock().fail_sign_out = fail;
    }

    pub fn issued_code(&self, email: &str) -> Option<String> {
        self.state
            .lock()
            .users
            .get(email)
            .and_then(|user| user.code.clone())
    }

    pub fn current_user(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    pub fn session_lookups(&self) -> usize {
        self.state.lock().session_lookups
    }

    pub fn resend_count(&self) -> usize {
        self.state.lock().resend_count
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, username: &str, password: &str) -> ProviderResult<SignUpResult> {
        let mut state = self.state.lock();
        if state.users.contains_key(username) {
            return Err(ProviderError::new(
                USERNAME_EXISTS,
                "An account with the given email already exists.",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ProviderError::new(
                INVALID_PASSWORD,
                "Password did not conform with policy: Password not long enough",
            ));
        }

        state.users.insert(
            username.to_string(),
            MemoryUser {
                password: password.to_string(),
                confirmed: false,
                disabled: false,
                groups: Vec::new(),
                code: Some(generate_code()),
            },
        );
        Ok(SignUpResult {
            username: username.to_string(),
        })
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> ProviderResult<()> {
        let mut state = self.state.lock();
        let user = state
            .users
            .get_mut(username)
            .ok_or_else(|| {
                ProviderError::new(USER_NOT_FOUND, "Username/client id combination not found.")
            })?;

        if user.code.as_deref() != Some(code) {
            return Err(ProviderError::new(
                CODE_MISMATCH,
                "Invalid verification code provided, please try again.",
            ));
        }
        user.confirmed = true;
        user.code = None;
        state.current = Some(username.to_string());
        Ok(())
    }

    async fn sign_in(&self, username: &str, password: &str) -> ProviderResult<AuthenticatedUser> {
        let mut state = self.state.lock();
        let user = state
            .users
            .get(username)
            .ok_or_else(|| ProviderError::new(USER_NOT_FOUND, "User does not exist."))?;

        if user.disabled {
            return Err(ProviderError::new(NOT_AUTHORIZED, "User is disabled."));
        }
        if user.password != password {
            return Err(ProviderError::new(
                NOT_AUTHORIZED,
                "Incorrect username or password.",
            ));
        }
        if !user.confirmed {
            return Err(ProviderError::new(
                USER_NOT_CONFIRMED,
                "User is not confirmed.",
            ));
        }

        let authenticated = AuthenticatedUser {
            email: username.to_string(),
            email_verified: true,
            groups: user.groups.clone(),
        };
        state.current = Some(username.to_string());
        Ok(authenticated)
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        let mut state = self.state.lock();
        state.current = None;
        if state.fail_sign_out {
            return Err(ProviderError::new("NetworkError", "Network error"));
        }
        Ok(())
    }

    async fn current_authenticated_user(&self) -> ProviderResult<AuthenticatedUser> {
        let mut state = self.state.lock();
        state.session_lookups += 1;
        let no_session = || ProviderError::new(NO_SESSION, "The user is not authenticated");

        let email = state.current.clone().ok_or_else(no_session)?;
        let user = state.users.get(&email).ok_or_else(no_session)?;
        if user.disabled {
            return Err(ProviderError::new(NOT_AUTHORIZED, "User is disabled."));
        }
        Ok(AuthenticatedUser {
            email,
            email_verified: user.confirmed,
            groups: user.groups.clone(),
        })
    }

    async fn resend_sign_up(&self, username: &str) -> ProviderResult<()> {
        let mut state = self.state.lock();
        state.resend_count += 1;
        let user = state
            .users
            .get_mut(username)
            .ok_or_else(|| {
                ProviderError::new(USER_NOT_FOUND, "Username/client id combination not found.")
            })?;
        if user.confirmed {
            return Err(ProviderError::new(
                INVALID_PARAMETER,
                "User is already confirmed.",
            ));
        }
        user.code = Some(generate_code());
        Ok(())
    }
}

fn generate_code() -> String {
    format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000)
}
