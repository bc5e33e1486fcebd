//! Closed authentication failure taxonomy.
//!
//! [`classify_provider_error`] is the single place provider names turn into
//! [`AuthErrorKind`]. The "account disabled" case is told apart from bad
//! credentials by the provider's structured code when present, and otherwise
//! by the `User is disabled` text in the message. The text check breaks if
//! the provider rewords that message.

use crate::session::identity::ProviderError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const USERNAME_EXISTS: &str = "UsernameExistsException";
pub const INVALID_PASSWORD: &str = "InvalidPasswordException";
pub const INVALID_PARAMETER: &str = "InvalidParameterException";
pub const NOT_AUTHORIZED: &str = "NotAuthorizedException";
pub const USER_NOT_FOUND: &str = "UserNotFoundException";
pub const USER_NOT_CONFIRMED: &str = "UserNotConfirmedException";

/// Structured code for a disabled account.
pub const USER_DISABLED_CODE: &str = "UserDisabled";
const USER_DISABLED_TEXT: &str = "User is disabled";

const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    UsernameAlreadyExists,
    PasswordPolicyViolation,
    AccountDisabled,
    InvalidCredentials,
    UserNotFound,
    AccountNotConfirmed,
    /// Required field left blank; rejected before any provider call.
    MissingCredentials,
    UnknownAuthError,
}

/// User-facing authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthFailure {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_credentials() -> Self {
        Self::new(
            AuthErrorKind::MissingCredentials,
            "Username and password are required.",
        )
    }

    /// Classifies `error` and attaches the message shown next to the form.
    pub fn from_provider(error: &ProviderError) -> Self {
        let kind = classify_provider_error(error);
        let message = match kind {
            AuthErrorKind::UsernameAlreadyExists => {
                "An account with this email already exists.".to_string()
            }
            AuthErrorKind::PasswordPolicyViolation => {
                "Password does not meet the requirements.".to_string()
            }
            AuthErrorKind::AccountDisabled => "Account disabled.".to_string(),
            AuthErrorKind::InvalidCredentials => "Incorrect username or password.".to_string(),
            AuthErrorKind::UserNotFound => "User does not exist.".to_string(),
            AuthErrorKind::AccountNotConfirmed => {
                "Account not confirmed. Enter the code sent to your email.".to_string()
            }
            AuthErrorKind::MissingCredentials => {
                "Username and password are required.".to_string()
            }
            AuthErrorKind::UnknownAuthError => {
                let text = error.message.trim();
                if text.is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    text.to_string()
                }
            }
        };
        Self { kind, message }
    }
}

impl Display for AuthFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for AuthFailure {}

pub fn classify_provider_error(error: &ProviderError) -> AuthErrorKind {
    match error.name.as_str() {
        USERNAME_EXISTS => AuthErrorKind::UsernameAlreadyExists,
        INVALID_PASSWORD | INVALID_PARAMETER => AuthErrorKind::PasswordPolicyViolation,
        NOT_AUTHORIZED if is_account_disabled(error) => AuthErrorKind::AccountDisabled,
        NOT_AUTHORIZED => AuthErrorKind::InvalidCredentials,
        USER_NOT_FOUND => AuthErrorKind::UserNotFound,
        USER_NOT_CONFIRMED => AuthErrorKind::AccountNotConfirmed,
        _ => AuthErrorKind::UnknownAuthError,
    }
}

fn is_account_disabled(error: &ProviderError) -> bool {
    match error.code.as_deref() {
        Some(code) => code == USER_DISABLED_CODE,
        None => error.message.contains(USER_DISABLED_TEXT),
    }
}
