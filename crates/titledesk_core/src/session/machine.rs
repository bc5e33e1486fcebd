//! Session state machine.
//!
//! # Responsibility
//! - Reconcile sign-up, code confirmation, sign-in, sign-out and startup
//!   recovery into one `SessionDescriptor`.
//! - Turn every provider failure into an `AuthFailure` kept for display.
//!
//! # Invariants
//! - `Anonymous -> PendingConfirmation -> Authenticated`, plus
//!   `Anonymous -> Authenticated` on sign-in and `* -> Anonymous` on sign-out.
//! - The descriptor is replaced wholesale, never patched.
//! - A failed operation leaves the status unchanged, except sign-in of an
//!   unconfirmed account, which moves to `PendingConfirmation`.
//! - A code is submitted automatically once it reaches the configured length,
//!   and the same code is never submitted twice in a row.

use crate::config::DEFAULT_CONFIRMATION_CODE_LENGTH;
use crate::logging::mask_email;
use crate::model::session::{SessionDescriptor, SessionStatus};
use crate::session::errors::{AuthErrorKind, AuthFailure};
use crate::session::identity::{descriptor_for, fetch_session, IdentityProvider};
use log::{info, warn};
use std::sync::Arc;

pub type AuthResult<T> = Result<T, AuthFailure>;

/// Credential fields as entered in the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialForm {
    pub username: String,
    pub password: String,
    pub code: String,
}

impl CredentialForm {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

pub struct SessionStateMachine<P: ?Sized> {
    provider: Arc<P>,
    descriptor: SessionDescriptor,
    form: CredentialForm,
    pending_username: Option<String>,
    last_error: Option<AuthFailure>,
    last_submitted_code: Option<String>,
    code_length: usize,
}

impl<P> SessionStateMachine<P>
where
    P: IdentityProvider + ?Sized,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self::with_code_length(provider, DEFAULT_CONFIRMATION_CODE_LENGTH)
    }

    pub fn with_code_length(provider: Arc<P>, code_length: usize) -> Self {
        Self {
            provider,
            descriptor: SessionDescriptor::anonymous(),
            form: CredentialForm::default(),
            pending_username: None,
            last_error: None,
            last_submitted_code: None,
            code_length,
        }
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn status(&self) -> SessionStatus {
        self.descriptor.status
    }

    pub fn last_error(&self) -> Option<&AuthFailure> {
        self.last_error.as_ref()
    }

    /// Address the confirmation code was sent to.
    pub fn pending_username(&self) -> Option<&str> {
        self.pending_username.as_deref()
    }

    pub fn form(&self) -> &CredentialForm {
        &self.form
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn update_username(&mut self, username: impl Into<String>) {
        self.form.username = username.into();
    }

    pub fn update_password(&mut self, password: impl Into<String>) {
        self.form.password = password.into();
    }

    /// Records a code edit and submits it once it reaches full length.
    ///
    /// Returns `None` when no confirmation was attempted.
    pub async fn update_code(&mut self, code: impl Into<String>) -> Option<AuthResult<()>> {
        self.form.code = code.into();

        if self.descriptor.status != SessionStatus::PendingConfirmation
            || self.form.code.chars().count() != self.code_length
            || self.last_submitted_code.as_deref() == Some(self.form.code.as_str())
        {
            return None;
        }

        let code = self.form.code.clone();
        Some(self.confirm_sign_up(&code).await)
    }

    /// Adopts an existing provider session, if any. Never reports an error.
    pub async fn recover_session(&mut self) -> &SessionDescriptor {
        let recovered = fetch_session(self.provider.as_ref()).await;
        if recovered.is_authenticated() {
            info!(
                "event=session_recover module=session status=ok email={} roles={}",
                mask_email(&recovered.email),
                recovered.roles.len()
            );
            self.descriptor = recovered;
        } else {
            info!("event=session_recover module=session status=skip reason=no_session");
            self.descriptor = SessionDescriptor::anonymous();
        }
        &self.descriptor
    }

    pub async fn sign_up(&mut self, username: &str, password: &str) -> AuthResult<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(self.fail("sign_up", AuthFailure::missing_credentials()));
        }

        match self.provider.sign_up(username, password).await {
            Ok(result) => {
                let username = if result.username.trim().is_empty() {
                    username.to_string()
                } else {
                    result.username
                };
                info!(
                    "event=sign_up module=session status=ok email={}",
                    mask_email(&username)
                );
                self.enter_pending(username);
                self.form.password.clear();
                Ok(())
            }
            Err(err) => Err(self.fail("sign_up", AuthFailure::from_provider(&err))),
        }
    }

    pub async fn confirm_sign_up(&mut self, code: &str) -> AuthResult<()> {
        let Some(username) = self
            .pending_username
            .clone()
            .filter(|_| self.descriptor.status == SessionStatus::PendingConfirmation)
        else {
            return Err(self.fail(
                "confirm_sign_up",
                AuthFailure::new(
                    AuthErrorKind::UnknownAuthError,
                    "No sign-up is awaiting confirmation.",
                ),
            ));
        };

        if self.last_submitted_code.as_deref() == Some(code) {
            return match &self.last_error {
                Some(failure) => Err(failure.clone()),
                None => Ok(()),
            };
        }
        self.last_submitted_code = Some(code.to_string());

        match self.provider.confirm_sign_up(&username, code).await {
            Ok(()) => {
                let descriptor = SessionDescriptor::authenticated(
                    username.as_str(),
                    true,
                    std::iter::empty::<String>(),
                )
                .map_err(|err| {
                    AuthFailure::new(AuthErrorKind::UnknownAuthError, err.to_string())
                });
                match descriptor {
                    Ok(descriptor) => {
                        info!(
                            "event=confirm_sign_up module=session status=ok email={}",
                            mask_email(&username)
                        );
                        self.authenticate(descriptor);
                        Ok(())
                    }
                    Err(failure) => Err(self.fail("confirm_sign_up", failure)),
                }
            }
            Err(err) => Err(self.fail("confirm_sign_up", AuthFailure::from_provider(&err))),
        }
    }

    pub async fn sign_in(&mut self, username: &str, password: &str) -> AuthResult<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(self.fail("sign_in", AuthFailure::missing_credentials()));
        }

        match self.provider.sign_in(username, password).await {
            Ok(mut user) => {
                if user.email.trim().is_empty() {
                    user.email = username.to_string();
                }
                match descriptor_for(user) {
                    Some(descriptor) => {
                        info!(
                            "event=sign_in module=session status=ok email={} roles={}",
                            mask_email(&descriptor.email),
                            descriptor.roles.len()
                        );
                        self.authenticate(descriptor);
                        Ok(())
                    }
                    None => Err(self.fail(
                        "sign_in",
                        AuthFailure::new(
                            AuthErrorKind::UnknownAuthError,
                            "Signed-in account has no email address.",
                        ),
                    )),
                }
            }
            Err(err) => {
                let mut failure = AuthFailure::from_provider(&err);
                if failure.kind == AuthErrorKind::AccountNotConfirmed {
                    self.enter_pending(username.to_string());
                    failure.message = if self.resend_confirmation_code().await {
                        "Account not confirmed. A new code has been sent."
                    } else {
                        "Account not confirmed. A new code could not be sent."
                    }
                    .to_string();
                }
                Err(self.fail("sign_in", failure))
            }
        }
    }

    /// Returns to `Anonymous` whatever the provider answers.
    pub async fn sign_out(&mut self) {
        if let Err(err) = self.provider.sign_out().await {
            warn!(
                "event=sign_out module=session status=error error_code={}",
                err.name
            );
        }
        self.descriptor = SessionDescriptor::anonymous();
        self.form.clear();
        self.pending_username = None;
        self.last_error = None;
        self.last_submitted_code = None;
        info!("event=sign_out module=session status=ok");
    }

    /// Asks the provider for a new code and reports whether one was sent.
    ///
    /// Failures are logged only; `last_error` is left alone.
    pub async fn resend_confirmation_code(&mut self) -> bool {
        let Some(username) = self.pending_username.clone() else {
            warn!("event=resend_code module=session status=skip reason=no_pending_sign_up");
            return false;
        };

        match self.provider.resend_sign_up(&username).await {
            Ok(()) => {
                self.last_submitted_code = None;
                info!(
                    "event=resend_code module=session status=ok email={}",
                    mask_email(&username)
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=resend_code module=session status=error error_code={}",
                    err.name
                );
                false
            }
        }
    }

    fn enter_pending(&mut self, username: String) {
        self.descriptor = SessionDescriptor::pending(username.as_str());
        self.pending_username = Some(username);
        self.last_error = None;
        self.last_submitted_code = None;
        self.form.code.clear();
    }

    fn authenticate(&mut self, descriptor: SessionDescriptor) {
        self.descriptor = descriptor;
        self.pending_username = None;
        self.last_error = None;
        self.last_submitted_code = None;
        self.form.clear();
    }

    fn fail(&mut self, operation: &'static str, failure: AuthFailure) -> AuthFailure {
        warn!(
            "event={} module=session status=error error_kind={:?}",
            operation, failure.kind
        );
        self.last_error = Some(failure.clone());
        failure
    }
}
