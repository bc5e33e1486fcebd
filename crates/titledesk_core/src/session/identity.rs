//! Identity provider contract.

use crate::logging::mask_email;
use crate::model::session::SessionDescriptor;
use async_trait::async_trait;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw provider failure, as named by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    /// Exception-style name such as `NotAuthorizedException`.
    pub name: String,
    pub message: String,
    /// Structured reason, when the provider exposes one.
    pub code: Option<String>,
}

impl ProviderError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl Error for ProviderError {}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Identity returned by sign-in and session lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
    pub email_verified: bool,
    /// Group claims carried by the session token.
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub username: String,
}

/// Hosted identity service consumed by the client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, username: &str, password: &str) -> ProviderResult<SignUpResult>;
    async fn confirm_sign_up(&self, username: &str, code: &str) -> ProviderResult<()>;
    async fn sign_in(&self, username: &str, password: &str) -> ProviderResult<AuthenticatedUser>;
    async fn sign_out(&self) -> ProviderResult<()>;
    /// Fails with a provider error when no session exists.
    async fn current_authenticated_user(&self) -> ProviderResult<AuthenticatedUser>;
    async fn resend_sign_up(&self, username: &str) -> ProviderResult<()>;
}

/// Looks up the live session and returns it as a descriptor.
///
/// Any lookup failure, including "no session", yields an anonymous
/// descriptor.
pub async fn fetch_session<P>(provider: &P) -> SessionDescriptor
where
    P: IdentityProvider + ?Sized,
{
    match provider.current_authenticated_user().await {
        Ok(user) => match descriptor_for(user) {
            Some(descriptor) => descriptor,
            None => {
                warn!("event=session_lookup module=session status=error error_code=missing_email");
                SessionDescriptor::anonymous()
            }
        },
        Err(err) => {
            debug!(
                "event=session_lookup module=session status=skip reason={}",
                err.name
            );
            SessionDescriptor::anonymous()
        }
    }
}

/// Authenticated descriptor for `user`, or `None` when it has no email.
pub fn descriptor_for(user: AuthenticatedUser) -> Option<SessionDescriptor> {
    let descriptor =
        SessionDescriptor::authenticated(user.email, user.email_verified, user.groups).ok()?;
    debug!(
        "event=session_descriptor module=session status=ok email={} roles={}",
        mask_email(&descriptor.email),
        descriptor.roles.len()
    );
    Some(descriptor)
}
