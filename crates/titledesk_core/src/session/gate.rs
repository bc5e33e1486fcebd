//! Delete affordance hint.
//!
//! The gate only decides whether the delete control is offered. It is not
//! an access check: the remote catalog enforces authorization, and the
//! mutation coordinator re-evaluates the gate against a freshly fetched
//! session before every delete.

use crate::config::DEFAULT_ADMIN_GROUP;
use crate::model::session::SessionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGate {
    admin_group: String,
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_GROUP)
    }
}

impl AuthorizationGate {
    pub fn new(admin_group: impl Into<String>) -> Self {
        Self {
            admin_group: admin_group.into(),
        }
    }

    pub fn admin_group(&self) -> &str {
        &self.admin_group
    }

    pub fn can_delete(&self, session: &SessionDescriptor) -> bool {
        session.is_authenticated() && session.has_role(&self.admin_group)
    }
}

/// `true` iff the session is authenticated and in `Administrators`.
pub fn can_delete(session: &SessionDescriptor) -> bool {
    AuthorizationGate::default().can_delete(session)
}

#[cfg(test)]
mod tests {
    use super::{can_delete, AuthorizationGate};
    use crate::model::session::{SessionDescriptor, SessionStatus};

    fn with(status: SessionStatus, roles: &[&str]) -> SessionDescriptor {
        SessionDescriptor {
            status,
            email: "a@b.com".to_string(),
            email_verified: true,
            roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }

    #[test]
    fn only_authenticated_administrators_may_delete() {
        for status in [
            SessionStatus::Anonymous,
            SessionStatus::PendingConfirmation,
            SessionStatus::Authenticated,
        ] {
            for roles in [&[][..], &["Editors"][..], &["Administrators"][..]] {
                let expected =
                    status == SessionStatus::Authenticated && roles.contains(&"Administrators");
                assert_eq!(
                    can_delete(&with(status, roles)),
                    expected,
                    "{status:?} {roles:?}"
                );
            }
        }
    }

    #[test]
    fn stale_roles_on_pending_session_do_not_grant_delete() {
        let stale = with(SessionStatus::PendingConfirmation, &["Administrators"]);
        assert!(!can_delete(&stale));
    }

    #[test]
    fn role_match_is_exact() {
        let lowercase = with(SessionStatus::Authenticated, &["administrators"]);
        assert!(!can_delete(&lowercase));
    }

    #[test]
    fn custom_admin_group() {
        let gate = AuthorizationGate::new("Editors");
        assert!(gate.can_delete(&with(SessionStatus::Authenticated, &["Editors"])));
        assert!(!gate.can_delete(&with(SessionStatus::Authenticated, &["Administrators"])));
    }
}
