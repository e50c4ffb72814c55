//! Auth gate trait and an in-memory implementation

use crate::api::observable::Observable;
use tokio::sync::watch;
use tracing::info;

/// Authentication phase of the app session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// No session
    #[default]
    SignedOut,
    /// Login or token validation in progress
    Pending,
    /// Identity provider accepted the user but the backend has no account yet
    NeedsRegistration,
    /// Account exists but the mandatory profile fields are missing
    ProfileIncomplete,
    /// Fully signed in
    Authenticated,
    /// Login or validation failed
    Failed(String),
}

impl AuthStatus {
    /// Only a fully authenticated session may share location
    pub fn allows_sharing(&self) -> bool {
        matches!(self, AuthStatus::Authenticated)
    }
}

/// Snapshot of the authentication layer, published as one value so the token
/// and the session it belongs to can never be observed out of step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSession {
    /// Bumped whenever a session begins or ends
    pub generation: u64,
    pub status: AuthStatus,
    pub access_token: Option<String>,
}

impl AuthSession {
    pub fn allows_sharing(&self) -> bool {
        self.status.allows_sharing()
    }
}

/// What the controller consumes from the authentication layer
pub trait AuthGate: Send + Sync {
    /// Current session, read at send time
    fn session(&self) -> AuthSession;

    /// Session signal; the controller forces a stop when the status leaves
    /// `Authenticated` or the generation moves on
    fn subscribe(&self) -> watch::Receiver<AuthSession>;

    fn is_authenticated(&self) -> bool {
        self.session().allows_sharing()
    }

    fn access_token(&self) -> Option<String> {
        self.session().access_token
    }
}

/// In-memory gate driven by whoever owns the identity provider session
#[derive(Debug, Default)]
pub struct SessionAuthGate {
    session: Observable<AuthSession>,
}

impl SessionAuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that starts out signed in with `token`
    pub fn authenticated(token: impl Into<String>) -> Self {
        let gate = Self::new();
        gate.sign_in(token);
        gate
    }

    /// Begin a new session, ending any previous one
    pub fn sign_in(&self, token: impl Into<String>) {
        let token = token.into();
        self.session.update(|session| {
            session.generation += 1;
            session.status = AuthStatus::Authenticated;
            session.access_token = Some(token);
            true
        });
        info!("session authenticated");
    }

    /// Swap in a refreshed token within the same session
    pub fn refresh_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.session.update(|session| {
            if session.access_token.as_deref() == Some(token.as_str()) {
                return false;
            }
            session.access_token = Some(token);
            true
        });
    }

    pub fn sign_out(&self) {
        self.session.update(|session| {
            session.generation += 1;
            session.status = AuthStatus::SignedOut;
            session.access_token = None;
            true
        });
        info!("session signed out");
    }

    /// Move to another phase. Entering or leaving `Authenticated` starts a new
    /// generation; a repeated status does not notify.
    pub fn set_status(&self, status: AuthStatus) {
        self.session.update(|session| {
            if session.status == status {
                return false;
            }
            if session.status.allows_sharing() != status.allows_sharing() {
                session.generation += 1;
            }
            session.status = status;
            true
        });
    }

    pub fn status(&self) -> AuthStatus {
        self.session.get().status
    }

    pub fn generation(&self) -> u64 {
        self.session.get().generation
    }
}

impl AuthGate for SessionAuthGate {
    fn session(&self) -> AuthSession {
        self.session.get()
    }

    fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_authenticated_allows_sharing() {
        assert!(AuthStatus::Authenticated.allows_sharing());
        for status in [
            AuthStatus::SignedOut,
            AuthStatus::Pending,
            AuthStatus::NeedsRegistration,
            AuthStatus::ProfileIncomplete,
            AuthStatus::Failed("bad credentials".to_string()),
        ] {
            assert!(!status.allows_sharing(), "{:?}", status);
        }
    }

    #[test]
    fn test_sign_in_and_out() {
        let gate = SessionAuthGate::new();
        assert!(!gate.is_authenticated());
        assert_eq!(gate.access_token(), None);

        gate.sign_in("abc");
        assert!(gate.is_authenticated());
        assert_eq!(gate.access_token().as_deref(), Some("abc"));

        gate.refresh_token("def");
        assert_eq!(gate.access_token().as_deref(), Some("def"));
        assert_eq!(gate.status(), AuthStatus::Authenticated);

        gate.sign_out();
        assert!(!gate.is_authenticated());
        assert_eq!(gate.access_token(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_sign_out() {
        let gate = SessionAuthGate::authenticated("abc");
        let mut rx = gate.subscribe();

        gate.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status, AuthStatus::SignedOut);
    }

    #[test]
    fn test_every_sign_in_starts_a_new_generation() {
        let gate = SessionAuthGate::authenticated("abc");
        let first = gate.generation();

        gate.refresh_token("def");
        assert_eq!(gate.generation(), first);

        // Logout and login back to back still leave a trace in the latest value
        let rx = gate.subscribe();
        gate.sign_out();
        gate.sign_in("ghi");
        let session = rx.borrow().clone();
        assert_eq!(session.status, AuthStatus::Authenticated);
        assert_eq!(session.generation, first + 2);
        assert_eq!(session.access_token.as_deref(), Some("ghi"));

        // Switching accounts without signing out also counts
        gate.sign_in("jkl");
        assert_eq!(gate.generation(), first + 3);
    }

    #[test]
    fn test_set_status_bumps_generation_only_across_authenticated() {
        let gate = SessionAuthGate::new();
        gate.set_status(AuthStatus::Pending);
        gate.set_status(AuthStatus::NeedsRegistration);
        assert_eq!(gate.generation(), 0);

        gate.set_status(AuthStatus::Authenticated);
        assert_eq!(gate.generation(), 1);
        gate.set_status(AuthStatus::ProfileIncomplete);
        assert_eq!(gate.generation(), 2);
    }

    #[test]
    fn test_repeated_status_does_not_notify() {
        let gate = SessionAuthGate::authenticated("abc");
        let rx = gate.subscribe();
        gate.set_status(AuthStatus::Authenticated);
        assert!(!rx.has_changed().unwrap());
    }
}
