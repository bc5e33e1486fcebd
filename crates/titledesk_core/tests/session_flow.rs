use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use titledesk_core::{
    AuthErrorKind, AuthenticatedUser, CredentialForm, IdentityProvider, InMemoryIdentityProvider,
    ProviderError, ProviderResult, SessionStateMachine, SessionStatus, SignUpResult,
};

fn wrong_code(code: &str) -> String {
    if code == "111111" {
        "222222".to_string()
    } else {
        "111111".to_string()
    }
}

#[tokio::test]
async fn sign_up_then_full_code_authenticates() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let mut session = SessionStateMachine::new(provider.clone());

    session
        .sign_up("a@b.com", "Passw0rd!")
        .await
        .expect("sign up should succeed");
    assert_eq!(session.status(), SessionStatus::PendingConfirmation);
    assert_eq!(session.pending_username(), Some("a@b.com"));
    assert!(session.form().password.is_empty());

    let code = provider.issued_code("a@b.com").expect("code issued");
    assert!(session.update_code(&code[..5]).await.is_none());
    assert_eq!(session.status(), SessionStatus::PendingConfirmation);

    session
        .update_code(code.as_str())
        .await
        .expect("full code is submitted")
        .expect("provider accepts code");

    let descriptor = session.descriptor();
    assert_eq!(descriptor.status, SessionStatus::Authenticated);
    assert_eq!(descriptor.email, "a@b.com");
    assert!(descriptor.email_verified);
    assert!(descriptor.roles.is_empty());
    assert!(session.pending_username().is_none());
    assert_eq!(session.form().code, "");
}

#[tokio::test]
async fn wrong_code_keeps_pending_and_is_not_resubmitted() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let mut session = SessionStateMachine::new(provider.clone());
    session
        .sign_up("a@b.com", "Passw0rd!")
        .await
        .expect("sign up should succeed");

    let code = provider.issued_code("a@b.com").expect("code issued");
    let wrong = wrong_code(&code);
    let failure = session
        .update_code(wrong.as_str())
        .await
        .expect("full code is submitted")
        .expect_err("wrong code must fail");

    assert_eq!(failure.kind, AuthErrorKind::UnknownAuthError);
    assert_eq!(session.status(), SessionStatus::PendingConfirmation);
    assert_eq!(session.form().code, wrong);
    assert_eq!(session.last_error(), Some(&failure));

    assert!(session.update_code(wrong.as_str()).await.is_none());

    session
        .update_code(code.as_str())
        .await
        .expect("new code is submitted")
        .expect("correct code accepted");
    assert_eq!(session.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn duplicate_sign_up_is_classified() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new().with_user("a@b.com", "Passw0rd!", Vec::<String>::new()),
    );
    let mut session = SessionStateMachine::new(provider);

    let failure = session
        .sign_up("a@b.com", "Passw0rd!")
        .await
        .expect_err("existing account");
    assert_eq!(failure.kind, AuthErrorKind::UsernameAlreadyExists);
    assert_eq!(session.status(), SessionStatus::Anonymous);

    let failure = session
        .sign_up("c@d.com", "short")
        .await
        .expect_err("weak password");
    assert_eq!(failure.kind, AuthErrorKind::PasswordPolicyViolation);
    assert_eq!(session.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn blank_credentials_never_reach_provider() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let mut session = SessionStateMachine::new(provider.clone());

    let failure = session.sign_in("", "x").await.expect_err("blank username");
    assert_eq!(failure.kind, AuthErrorKind::MissingCredentials);
    let failure = session.sign_up("a@b.com", "").await.expect_err("blank password");
    assert_eq!(failure.kind, AuthErrorKind::MissingCredentials);
    assert!(provider.issued_code("a@b.com").is_none());
}

#[tokio::test]
async fn disabled_and_bad_password_get_distinct_messages() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new()
            .with_user("off@b.com", "Passw0rd!", Vec::<String>::new())
            .with_user("on@b.com", "Passw0rd!", Vec::<String>::new()),
    );
    provider.disable_user("off@b.com");
    let mut session = SessionStateMachine::new(provider);

    let failure = session
        .sign_in("off@b.com", "Passw0rd!")
        .await
        .expect_err("disabled account");
    assert_eq!(failure.kind, AuthErrorKind::AccountDisabled);
    assert_eq!(failure.message, "Account disabled.");

    let failure = session
        .sign_in("on@b.com", "nope-nope")
        .await
        .expect_err("bad password");
    assert_eq!(failure.kind, AuthErrorKind::InvalidCredentials);
    assert_eq!(failure.message, "Incorrect username or password.");

    let failure = session
        .sign_in("ghost@b.com", "Passw0rd!")
        .await
        .expect_err("unknown user");
    assert_eq!(failure.kind, AuthErrorKind::UserNotFound);
    assert_eq!(session.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn unconfirmed_sign_in_moves_to_pending_and_resends() {
    let provider =
        Arc::new(InMemoryIdentityProvider::new().with_unconfirmed_user("a@b.com", "Passw0rd!"));
    let mut session = SessionStateMachine::new(provider.clone());

    let failure = session
        .sign_in("a@b.com", "Passw0rd!")
        .await
        .expect_err("unconfirmed account");
    assert_eq!(failure.kind, AuthErrorKind::AccountNotConfirmed);
    assert_eq!(failure.message, "Account not confirmed. A new code has been sent.");
    assert_eq!(session.status(), SessionStatus::PendingConfirmation);
    assert_eq!(session.pending_username(), Some("a@b.com"));
    assert_eq!(provider.resend_count(), 1);

    let code = provider.issued_code("a@b.com").expect("fresh code");
    session
        .update_code(code.as_str())
        .await
        .expect("code submitted")
        .expect("code accepted");
    assert_eq!(session.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn sign_in_captures_roles_and_clears_form() {
    let provider = Arc::new(InMemoryIdentityProvider::new().with_user(
        "admin@b.com",
        "Passw0rd!",
        ["Administrators", "Editors"],
    ));
    let mut session = SessionStateMachine::new(provider);
    session.update_username("admin@b.com");
    session.update_password("Passw0rd!");

    session
        .sign_in("admin@b.com", "Passw0rd!")
        .await
        .expect("sign in");
    assert!(session.descriptor().has_role("Administrators"));
    assert!(session.descriptor().has_role("Editors"));
    assert_eq!(session.form(), &CredentialForm::default());
}

#[tokio::test]
async fn sign_out_resets_even_when_provider_fails() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new().with_user("a@b.com", "Passw0rd!", ["Administrators"]),
    );
    provider.fail_sign_out(true);
    let mut session = SessionStateMachine::new(provider);
    session.sign_in("a@b.com", "Passw0rd!").await.expect("sign in");

    session.sign_out().await;
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.descriptor().roles.is_empty());
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn recovery_adopts_existing_session_or_stays_anonymous() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new()
            .with_user("a@b.com", "Passw0rd!", ["Administrators"])
            .with_session("a@b.com"),
    );
    let mut session = SessionStateMachine::new(provider.clone());
    let recovered = session.recover_session().await.clone();
    assert_eq!(recovered.status, SessionStatus::Authenticated);
    assert!(recovered.has_role("Administrators"));

    provider.expire_session();
    let mut fresh = SessionStateMachine::new(provider);
    assert_eq!(
        fresh.recover_session().await.status,
        SessionStatus::Anonymous
    );
    assert!(fresh.last_error().is_none());
}

/// Provider whose resend always fails, to check the failure is swallowed.
#[derive(Default)]
struct FlakyResendProvider {
    resend_attempts: Mutex<usize>,
}

#[async_trait]
impl IdentityProvider for FlakyResendProvider {
    async fn sign_up(&self, username: &str, _password: &str) -> ProviderResult<SignUpResult> {
        Ok(SignUpResult {
            username: username.to_string(),
        })
    }

    async fn confirm_sign_up(&self, _username: &str, _code: &str) -> ProviderResult<()> {
        Ok(())
    }

    async fn sign_in(&self, _username: &str, _password: &str) -> ProviderResult<AuthenticatedUser> {
        Err(ProviderError::new(
            "UserNotConfirmedException",
            "User is not confirmed.",
        ))
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        Ok(())
    }

    async fn current_authenticated_user(&self) -> ProviderResult<AuthenticatedUser> {
        Err(ProviderError::new("NoCurrentUser", "no session"))
    }

    async fn resend_sign_up(&self, _username: &str) -> ProviderResult<()> {
        *self.resend_attempts.lock() += 1;
        Err(ProviderError::new("LimitExceededException", "Attempt limit exceeded"))
    }
}

#[tokio::test]
async fn resend_failure_is_swallowed() {
    let provider = Arc::new(FlakyResendProvider::default());
    let mut session = SessionStateMachine::new(provider.clone());

    let failure = session
        .sign_in("a@b.com", "Passw0rd!")
        .await
        .expect_err("unconfirmed");
    assert_eq!(failure.kind, AuthErrorKind::AccountNotConfirmed);
    assert_eq!(
        failure.message,
        "Account not confirmed. A new code could not be sent."
    );
    assert_eq!(session.status(), SessionStatus::PendingConfirmation);

    assert!(!session.resend_confirmation_code().await);
    assert_eq!(*provider.resend_attempts.lock(), 2);
    assert_eq!(session.status(), SessionStatus::PendingConfirmation);
    assert_eq!(
        session.last_error().map(|failure| failure.kind),
        Some(AuthErrorKind::AccountNotConfirmed)
    );
}
