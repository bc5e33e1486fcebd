//! Session descriptor model.
//!
//! # Responsibility
//! - Describe the identity the client currently acts as.
//!
//! # Invariants
//! - `status == Authenticated` implies a non-empty `email`.
//! - `roles` is a rendering hint only; the remote API enforces access.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authentication lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Anonymous,
    /// Sign-up accepted; waiting for the emailed code.
    PendingConfirmation,
    Authenticated,
}

/// Snapshot of the current identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionDescriptor {
    pub status: SessionStatus,
    pub email: String,
    pub email_verified: bool,
    pub roles: BTreeSet<String>,
}

/// Descriptor shape that violates the session invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidationError {
    MissingEmail,
}

impl Display for SessionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEmail => write!(f, "authenticated session requires a non-empty email"),
        }
    }
}

impl Error for SessionValidationError {}

impl SessionDescriptor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Pending descriptor for an address that still has to confirm its code.
    pub fn pending(email: impl Into<String>) -> Self {
        Self {
            status: SessionStatus::PendingConfirmation,
            email: email.into(),
            email_verified: false,
            roles: BTreeSet::new(),
        }
    }

    /// Builds an authenticated descriptor, enforcing the email invariant.
    pub fn authenticated<I, S>(
        email: impl Into<String>,
        email_verified: bool,
        roles: I,
    ) -> Result<Self, SessionValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let descriptor = Self {
            status: SessionStatus::Authenticated,
            email: email.into(),
            email_verified,
            roles: roles.into_iter().map(Into::into).collect(),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<(), SessionValidationError> {
        if self.status == SessionStatus::Authenticated && self.email.trim().is_empty() {
            return Err(SessionValidationError::MissingEmail);
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
