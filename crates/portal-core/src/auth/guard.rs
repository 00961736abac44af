use super::SessionManager;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(String),
    /// Signed in, but without a required role.
    Deny,
}

/// For login/register style pages: signed-in users go home instead.
pub fn public_guard(session: &SessionManager) -> GuardOutcome {
    if session.is_authenticated() {
        GuardOutcome::Redirect(HOME_ROUTE.to_string())
    } else {
        GuardOutcome::Allow
    }
}

/// For protected pages. An empty `roles` list only requires a session.
pub fn auth_guard<S: AsRef<str>>(session: &SessionManager, roles: &[S]) -> GuardOutcome {
    if !session.is_authenticated() {
        return GuardOutcome::Redirect(LOGIN_ROUTE.to_string());
    }
    if roles.is_empty() || session.has_any_role(roles) {
        GuardOutcome::Allow
    } else {
        GuardOutcome::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::TokenStore;

    fn session_with_token(token: bool) -> SessionManager {
        let tokens = TokenStore::in_memory();
        if token {
            tokens.save("A1", None, 3600, false);
        }
        SessionManager::new(ApiClient::new("http://127.0.0.1:9").unwrap(), tokens)
    }

    #[test]
    fn test_public_guard() {
        assert_eq!(public_guard(&session_with_token(false)), GuardOutcome::Allow);
        assert_eq!(
            public_guard(&session_with_token(true)),
            GuardOutcome::Redirect("/".to_string())
        );
    }

    #[test]
    fn test_auth_guard_requires_session() {
        let session = session_with_token(false);
        assert_eq!(
            auth_guard::<&str>(&session, &[]),
            GuardOutcome::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_auth_guard_roles() {
        // Restored sessions have no profile yet, so role checks fail closed
        let session = session_with_token(true);
        assert_eq!(auth_guard::<&str>(&session, &[]), GuardOutcome::Allow);
        assert_eq!(auth_guard(&session, &["admin"]), GuardOutcome::Deny);
    }
}
