//! # Authentication Controller
//!
//! Orchestrates login and logout across the credential store, the
//! session store, the audit sink, and the view router. Side-effect
//! ordering is fixed: credential check, then session write, then audit
//! write, then navigation. A failed audit write never fails the
//! operation it describes; it is logged locally instead.

use std::sync::Arc;

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::config::AppConfig;
use crate::error::{codes, ServiceError, ServiceResult};
use crate::observability::Logger;
use crate::router::{ViewFactory, ViewRouter, ViewState};
use crate::session::SessionStore;

use super::crypto;
use super::identity::{AccountStatus, CredentialStore, Identity};

const ENTITY_USER: &str = "User";

/// The session/authentication/navigation control plane, owned by the
/// GUI shell and driven from the UI thread.
pub struct AuthController<C: CredentialStore, A: AuditSink, F: ViewFactory> {
    credentials: Arc<C>,
    audit: Arc<A>,
    session: SessionStore,
    router: ViewRouter<F>,
}

impl<C: CredentialStore, A: AuditSink, F: ViewFactory> AuthController<C, A, F> {
    pub fn new(credentials: Arc<C>, audit: Arc<A>, factory: F, config: &AppConfig) -> Self {
        Self {
            credentials,
            audit,
            session: SessionStore::with_timeout(chrono::Duration::minutes(
                config.session_timeout_minutes,
            )),
            router: ViewRouter::new(factory),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    pub fn router(&self) -> &ViewRouter<F> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut ViewRouter<F> {
        &mut self.router
    }

    /// User-triggered navigation against the live session.
    ///
    /// An idle-expired session is dropped before the route is computed,
    /// so a timed-out user can no longer reach any dashboard.
    pub fn navigate(&mut self, to: ViewState) -> ServiceResult<ViewState> {
        self.session.expire_if_idle();
        self.session.touch();
        self.router.navigate(to, &self.session)
    }

    /// Navigation by historical panel name.
    pub fn navigate_by_name(&mut self, name: &str) -> ServiceResult<ViewState> {
        self.session.expire_if_idle();
        self.session.touch();
        self.router.navigate_by_name(name, &self.session)
    }

    /// Authenticate and open a session.
    ///
    /// On success the session holds the full identity-derived attribute
    /// set, a `LOGIN` audit entry exists, and the router sits on the
    /// role's dashboard. On failure the session is untouched (and
    /// therefore still empty or still the previous user's — never
    /// partial), a failed `LOGIN` entry exists, and the error category
    /// tells the caller what went wrong.
    pub fn login(&mut self, username: &str, password: &str) -> ServiceResult<Identity> {
        // Caller-side input check; short-circuits before any store access
        // and before any audit write.
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::validation(
                codes::EMPTY_CREDENTIALS,
                "username and password are required",
            ));
        }

        let identity = match self.credentials.find_by_username(username) {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                // Burn a hash's worth of time so "no such user" is not
                // distinguishable from "bad password" by the clock.
                crypto::dummy_verify();
                return Err(self.fail_login(username, ServiceError::invalid_credentials()));
            }
            Err(err) => return Err(self.fail_login(username, err)),
        };

        match identity.verify_password(password) {
            Ok(true) => {}
            Ok(false) => {
                return Err(self.fail_login(username, ServiceError::invalid_credentials()));
            }
            Err(err) => return Err(self.fail_login(username, err)),
        }

        match identity.account_status {
            AccountStatus::Active => {}
            AccountStatus::Suspended => {
                return Err(self.fail_login(username, ServiceError::account_suspended()));
            }
            AccountStatus::PendingVerification => {
                return Err(self.fail_login(username, ServiceError::account_not_verified()));
            }
        }

        // A login over someone else's live session must not hand the new
        // user the previous identity's materialized views.
        if self
            .session
            .current_user_id()
            .map_or(false, |id| id != identity.id)
        {
            self.router.reset_to_home();
        }

        // Verified: populate the session in one step, then audit, then
        // navigate. Each of these is infallible from the caller's view.
        self.session.begin(&identity);
        self.record_best_effort(
            AuditEntry::new(AuditAction::Login, ENTITY_USER, true)
                .with_actor(identity.id, identity.username.clone())
                .with_entity_id(identity.id.to_string()),
        );
        let view = self
            .router
            .complete_login(&self.session)
            .unwrap_or_else(|_| self.router.reset_to_home());
        Logger::info(
            "LOGIN_OK",
            &[
                ("username", identity.username.as_str()),
                ("role", identity.role.as_str()),
                ("view", view.name()),
            ],
        );
        Ok(identity)
    }

    /// Close the current session and return to the anonymous entry view.
    ///
    /// The session is cleared *before* the router moves, so the old
    /// dashboard can never render against a live session. Idempotent:
    /// logging out with no active session is a no-op.
    pub fn logout(&mut self) {
        let actor = self
            .session
            .current_user_id()
            .zip(self.session.current_username().map(String::from));

        self.session.clear();
        self.router.reset_to_home();

        if let Some((id, username)) = actor {
            self.record_best_effort(
                AuditEntry::new(AuditAction::Logout, ENTITY_USER, true).with_actor(id, &username),
            );
            Logger::info("LOGOUT", &[("username", username.as_str())]);
        }
    }

    /// Record a failed login attempt and hand back the causing error.
    ///
    /// The session is never touched on this path.
    fn fail_login(&mut self, username: &str, err: ServiceError) -> ServiceError {
        self.record_best_effort(
            AuditEntry::new(AuditAction::Login, ENTITY_USER, false)
                .with_actor_name(username)
                .with_error(err.message()),
        );
        Logger::warn(
            "LOGIN_FAILED",
            &[("username", username), ("category", err.category().as_str())],
        );
        err
    }

    /// Audit writes never block the critical path; failures are logged.
    fn record_best_effort(&self, entry: AuditEntry) {
        if let Err(err) = self.audit.record(&entry) {
            Logger::error(
                "AUDIT_WRITE_FAILED",
                &[
                    ("action", entry.action.as_str()),
                    ("detail", err.message()),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::auth::crypto::PasswordPolicy;
    use crate::auth::identity::{InMemoryCredentialStore, Role};
    use crate::error::ErrorCategory;
    use crate::router::{View, ViewState};
    use crate::session::SessionKey;

    struct NullView;

    impl View for NullView {
        fn state(&self) -> ViewState {
            ViewState::Home
        }
    }

    struct NullFactory;

    impl ViewFactory for NullFactory {
        fn build(&self, _state: ViewState) -> Box<dyn View> {
            Box::new(NullView)
        }
    }

    /// Sink that always fails, for the best-effort audit contract.
    struct FailingAuditSink;

    impl AuditSink for FailingAuditSink {
        fn record(&self, _entry: &AuditEntry) -> ServiceResult<()> {
            Err(ServiceError::audit_unavailable("disk full"))
        }
    }

    fn seeded_store() -> Arc<InMemoryCredentialStore> {
        let store = InMemoryCredentialStore::new();
        let policy = PasswordPolicy::default();
        store.seed(
            Identity::new("admin", "admin-pass-1", "admin@example.org", Role::Admin, &policy)
                .unwrap(),
        );
        store.seed(
            Identity::new("donor1", "correct-password", "donor1@example.org", Role::Donor, &policy)
                .unwrap(),
        );
        store.seed(
            Identity::new("ghost", "password123", "ghost@example.org", Role::Volunteer, &policy)
                .unwrap()
                .with_status(AccountStatus::Suspended),
        );
        Arc::new(store)
    }

    fn controller(
        store: Arc<InMemoryCredentialStore>,
        audit: Arc<MemoryAuditSink>,
    ) -> AuthController<InMemoryCredentialStore, MemoryAuditSink, NullFactory> {
        AuthController::new(store, audit, NullFactory, &AppConfig::default())
    }

    #[test]
    fn test_empty_fields_short_circuit_without_audit() {
        let audit = Arc::new(MemoryAuditSink::new());
        let mut ctl = controller(seeded_store(), audit.clone());

        for (u, p) in [("", "x"), ("admin", ""), ("   ", "x")] {
            let err = ctl.login(u, p).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Validation);
        }
        assert!(!ctl.session().is_authenticated());
        // No store access happened, so nothing was audited.
        assert!(audit.is_empty());
    }

    #[test]
    fn test_unknown_user_and_wrong_password_are_indistinguishable() {
        let audit = Arc::new(MemoryAuditSink::new());
        let mut ctl = controller(seeded_store(), audit.clone());

        let absent = ctl.login("no-such-user", "whatever1").unwrap_err();
        let wrong = ctl.login("admin", "wrong-password").unwrap_err();
        assert_eq!(absent, wrong);
        assert_eq!(absent.category(), ErrorCategory::Authentication);
        assert!(!ctl.session().is_authenticated());
        assert_eq!(audit.len(), 2);
        assert!(audit.entries().iter().all(|e| !e.success));
    }

    #[test]
    fn test_successful_login_populates_session_audits_and_navigates() {
        let audit = Arc::new(MemoryAuditSink::new());
        let mut ctl = controller(seeded_store(), audit.clone());

        let identity = ctl.login("donor1", "correct-password").unwrap();
        assert_eq!(identity.role, Role::Donor);

        assert_eq!(
            ctl.session().get(SessionKey::IsAuthenticated).unwrap().as_flag(),
            Some(true)
        );
        assert_eq!(ctl.session().role(), Some(Role::Donor));
        assert_eq!(ctl.router().current(), ViewState::DonorDashboard);

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Login);
        assert!(entries[0].success);
        assert_eq!(entries[0].actor_id, Some(identity.id));
    }

    #[test]
    fn test_suspended_account_refused() {
        let audit = Arc::new(MemoryAuditSink::new());
        let mut ctl = controller(seeded_store(), audit.clone());

        let err = ctl.login("ghost", "password123").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.code(), codes::ACCOUNT_SUSPENDED);
        assert!(!ctl.session().is_authenticated());
    }

    #[test]
    fn test_failed_login_after_success_keeps_old_session_intact() {
        let audit = Arc::new(MemoryAuditSink::new());
        let mut ctl = controller(seeded_store(), audit);

        ctl.login("donor1", "correct-password").unwrap();
        let err = ctl.login("admin", "wrong-password").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Authentication);
        // The failure never touched the existing session.
        assert_eq!(ctl.session().current_username(), Some("donor1"));
    }

    #[test]
    fn test_logout_clears_session_then_router_and_is_idempotent() {
        let audit = Arc::new(MemoryAuditSink::new());
        let mut ctl = controller(seeded_store(), audit.clone());

        ctl.login("donor1", "correct-password").unwrap();
        ctl.logout();

        assert!(!ctl.session().is_authenticated());
        assert!(ctl.session().get(SessionKey::Username).is_none());
        assert_eq!(ctl.router().current(), ViewState::Home);
        assert_eq!(audit.len(), 2); // LOGIN + LOGOUT

        // Second logout: no-op, no extra audit entry.
        ctl.logout();
        assert!(!ctl.session().is_authenticated());
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn test_audit_failure_never_blocks_login() {
        let mut ctl = AuthController::new(
            seeded_store(),
            Arc::new(FailingAuditSink),
            NullFactory,
            &AppConfig::default(),
        );

        let identity = ctl.login("donor1", "correct-password").unwrap();
        assert_eq!(identity.username, "donor1");
        assert!(ctl.session().is_authenticated());
        assert_eq!(ctl.router().current(), ViewState::DonorDashboard);
    }
}
