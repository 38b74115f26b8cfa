//! # View Router
//!
//! An explicit finite-state machine over the application's logical
//! views, replacing the CardLayout-and-string-constants scheme the
//! desktop shell historically used. Exactly one view is current at any
//! time; every transition is checked against a fixed table, and entering
//! a dashboard re-validates the session's role at the router — never
//! inferred from which button the UI happened to expose.
//!
//! Dashboard views are materialized lazily through a [`ViewFactory`] and
//! cached per state. Logout discards every cached dashboard so a later
//! login, possibly as a different user, always gets a fresh instance.

use std::collections::HashMap;

use crate::auth::Role;
use crate::error::{ServiceError, ServiceResult};
use crate::observability::Logger;
use crate::session::SessionStore;

/// Logical view names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    Home,
    Login,
    Registration,
    OrphanageDashboard,
    DonorDashboard,
    VolunteerDashboard,
    AdminDashboard,
}

impl ViewState {
    /// Historical panel name, kept stable for external navigation calls.
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Home => "Home",
            ViewState::Login => "Login",
            ViewState::Registration => "Registration",
            ViewState::OrphanageDashboard => "OrphanageDashboard",
            ViewState::DonorDashboard => "DonorDashboard",
            ViewState::VolunteerDashboard => "VolunteerDashboard",
            ViewState::AdminDashboard => "AdminDashboard",
        }
    }

    /// Parse a historical panel name.
    pub fn from_name(name: &str) -> Option<ViewState> {
        match name {
            "Home" => Some(ViewState::Home),
            "Login" => Some(ViewState::Login),
            "Registration" => Some(ViewState::Registration),
            "OrphanageDashboard" => Some(ViewState::OrphanageDashboard),
            "DonorDashboard" => Some(ViewState::DonorDashboard),
            "VolunteerDashboard" => Some(ViewState::VolunteerDashboard),
            "AdminDashboard" => Some(ViewState::AdminDashboard),
            _ => None,
        }
    }

    pub fn is_dashboard(&self) -> bool {
        matches!(
            self,
            ViewState::OrphanageDashboard
                | ViewState::DonorDashboard
                | ViewState::VolunteerDashboard
                | ViewState::AdminDashboard
        )
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A materialized view instance. The GUI shell supplies the real
/// implementations; the router only tracks identity and lifetime.
pub trait View {
    fn state(&self) -> ViewState;
}

/// Constructs view instances on first navigation into a dashboard.
pub trait ViewFactory {
    fn build(&self, state: ViewState) -> Box<dyn View>;
}

/// Maps a role to its dashboard. Total by construction.
pub fn dashboard_for(role: Role) -> ViewState {
    match role {
        Role::Admin => ViewState::AdminDashboard,
        Role::OrphanageStaff => ViewState::OrphanageDashboard,
        Role::Donor => ViewState::DonorDashboard,
        Role::Volunteer => ViewState::VolunteerDashboard,
    }
}

/// Maps a raw role string to a dashboard, normalizing aliases.
///
/// Unrecognized strings degrade to the donor dashboard with a logged
/// warning; they must never crash the router.
pub fn dashboard_for_name(role: &str) -> ViewState {
    match Role::parse(role) {
        Some(role) => dashboard_for(role),
        None => {
            Logger::warn("UNKNOWN_ROLE", &[("role", role)]);
            ViewState::DonorDashboard
        }
    }
}

/// The routing state machine.
pub struct ViewRouter<F: ViewFactory> {
    current: ViewState,
    factory: F,
    dashboards: HashMap<ViewState, Box<dyn View>>,
}

impl<F: ViewFactory> ViewRouter<F> {
    /// New router at the anonymous entry view.
    pub fn new(factory: F) -> Self {
        Self {
            current: ViewState::Home,
            factory,
            dashboards: HashMap::new(),
        }
    }

    pub fn current(&self) -> ViewState {
        self.current
    }

    /// True when the dashboard instance for `state` has been built.
    pub fn is_materialized(&self, state: ViewState) -> bool {
        self.dashboards.contains_key(&state)
    }

    pub fn view(&self, state: ViewState) -> Option<&dyn View> {
        self.dashboards.get(&state).map(|v| v.as_ref())
    }

    /// User-triggered navigation.
    ///
    /// Dashboards are role-gated here regardless of how the call was
    /// reached; a rejected dashboard entry redirects to `Home` and the
    /// target view is never constructed. Illegal transitions leave the
    /// current view unchanged.
    pub fn navigate(&mut self, to: ViewState, session: &SessionStore) -> ServiceResult<ViewState> {
        if to == self.current {
            return Ok(to);
        }

        if to.is_dashboard() {
            self.check_dashboard_access(to, session)?;
        }

        if !transition_allowed(self.current, to) {
            return Err(ServiceError::illegal_transition(
                self.current.name(),
                to.name(),
            ));
        }

        if to.is_dashboard() {
            self.materialize(to);
        }
        Logger::debug("NAVIGATE", &[("from", self.current.name()), ("to", to.name())]);
        self.current = to;
        Ok(to)
    }

    /// Navigation by historical panel name.
    ///
    /// Unknown names are a `NotFound` failure resolved by falling back
    /// to `Home` rather than leaving the UI in an undefined state.
    pub fn navigate_by_name(
        &mut self,
        name: &str,
        session: &SessionStore,
    ) -> ServiceResult<ViewState> {
        match ViewState::from_name(name) {
            Some(view) => self.navigate(view, session),
            None => {
                Logger::warn("UNKNOWN_VIEW", &[("view", name)]);
                self.current = ViewState::Home;
                Err(ServiceError::view_not_found(name))
            }
        }
    }

    /// Transition `Login -> {Role}Dashboard` as the direct consequence
    /// of a successful authentication.
    ///
    /// The target is recomputed from the session, not taken from the
    /// caller, so the role backing the dashboard is always the one that
    /// was just verified.
    pub fn complete_login(&mut self, session: &SessionStore) -> ServiceResult<ViewState> {
        let role = session
            .role()
            .ok_or_else(|| ServiceError::role_required("any"))?;
        let target = dashboard_for(role);
        self.materialize(target);
        Logger::info("DASHBOARD_ENTER", &[("role", role.as_str()), ("view", target.name())]);
        self.current = target;
        Ok(target)
    }

    /// Transition `Registration -> Login` after successful account
    /// creation.
    pub fn complete_registration(&mut self) -> ServiceResult<ViewState> {
        if self.current != ViewState::Registration {
            return Err(ServiceError::illegal_transition(
                self.current.name(),
                ViewState::Login.name(),
            ));
        }
        self.current = ViewState::Login;
        Ok(ViewState::Login)
    }

    /// Return to the anonymous entry view, discarding every cached
    /// dashboard instance so no view state survives into the next login.
    ///
    /// Callers clear the session *before* invoking this; the old view
    /// must never render against an already-cleared session.
    pub fn reset_to_home(&mut self) -> ViewState {
        self.dashboards.clear();
        self.current = ViewState::Home;
        ViewState::Home
    }

    fn check_dashboard_access(&mut self, to: ViewState, session: &SessionStore) -> ServiceResult<()> {
        let allowed = match session.role() {
            Some(role) => dashboard_for(role) == to,
            None => false,
        };
        if allowed {
            return Ok(());
        }
        let required = match to {
            ViewState::AdminDashboard => Role::Admin.as_str(),
            ViewState::OrphanageDashboard => Role::OrphanageStaff.as_str(),
            ViewState::VolunteerDashboard => Role::Volunteer.as_str(),
            _ => Role::Donor.as_str(),
        };
        Logger::warn(
            "DASHBOARD_DENIED",
            &[("view", to.name()), ("required_role", required)],
        );
        self.current = ViewState::Home;
        Err(ServiceError::role_required(required))
    }

    fn materialize(&mut self, state: ViewState) {
        if !self.dashboards.contains_key(&state) {
            let view = self.factory.build(state);
            self.dashboards.insert(state, view);
        }
    }
}

/// The fixed transition table.
///
/// `Login -> {Role}Dashboard` appears here for completeness; in
/// practice that edge is driven through [`ViewRouter::complete_login`].
fn transition_allowed(from: ViewState, to: ViewState) -> bool {
    use ViewState::*;
    match (from, to) {
        (Home, Login) | (Home, Registration) => true,
        (Login, Home) | (Registration, Home) => true,
        (Registration, Login) => true,
        (from, Home) if from.is_dashboard() => true,
        (Login, to) if to.is_dashboard() => true,
        // Authenticated re-entry from the landing view; the role gate in
        // `navigate` still applies.
        (Home, to) if to.is_dashboard() => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::PasswordPolicy;
    use crate::auth::Identity;
    use crate::error::ErrorCategory;
    use std::cell::Cell;
    use std::rc::Rc;

    struct TestView {
        state: ViewState,
    }

    impl View for TestView {
        fn state(&self) -> ViewState {
            self.state
        }
    }

    #[derive(Clone, Default)]
    struct CountingFactory {
        built: Rc<Cell<usize>>,
    }

    impl CountingFactory {
        fn built(&self) -> usize {
            self.built.get()
        }
    }

    impl ViewFactory for CountingFactory {
        fn build(&self, state: ViewState) -> Box<dyn View> {
            self.built.set(self.built.get() + 1);
            Box::new(TestView { state })
        }
    }

    fn session_for(role: Role) -> SessionStore {
        let identity = Identity::new(
            "user",
            "password123",
            "user@example.org",
            role,
            &PasswordPolicy::default(),
        )
        .unwrap();
        let mut session = SessionStore::new();
        session.begin(&identity);
        session
    }

    fn router() -> (ViewRouter<CountingFactory>, CountingFactory) {
        let factory = CountingFactory::default();
        (ViewRouter::new(factory.clone()), factory)
    }

    #[test]
    fn test_initial_state_is_home() {
        let (router, _) = router();
        assert_eq!(router.current(), ViewState::Home);
    }

    #[test]
    fn test_anonymous_entry_transitions() {
        let (mut router, _) = router();
        let anon = SessionStore::new();
        assert_eq!(router.navigate(ViewState::Login, &anon).unwrap(), ViewState::Login);
        assert_eq!(router.navigate(ViewState::Home, &anon).unwrap(), ViewState::Home);
        assert_eq!(
            router.navigate(ViewState::Registration, &anon).unwrap(),
            ViewState::Registration
        );
        assert_eq!(router.complete_registration().unwrap(), ViewState::Login);
    }

    #[test]
    fn test_illegal_transition_leaves_state_unchanged() {
        let (mut router, _) = router();
        let anon = SessionStore::new();
        router.navigate(ViewState::Login, &anon).unwrap();
        let err = router.navigate(ViewState::Registration, &anon).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BusinessLogic);
        assert_eq!(router.current(), ViewState::Login);
    }

    #[test]
    fn test_login_routes_each_role_to_its_dashboard() {
        for (role, expected) in [
            (Role::Admin, ViewState::AdminDashboard),
            (Role::OrphanageStaff, ViewState::OrphanageDashboard),
            (Role::Donor, ViewState::DonorDashboard),
            (Role::Volunteer, ViewState::VolunteerDashboard),
        ] {
            let (mut router, _) = router();
            let session = session_for(role);
            assert_eq!(router.complete_login(&session).unwrap(), expected);
            assert_eq!(router.current(), expected);
        }
    }

    #[test]
    fn test_role_aliases_route_to_same_dashboard() {
        assert_eq!(dashboard_for_name("OrphanageRep"), ViewState::OrphanageDashboard);
        assert_eq!(dashboard_for_name("Staff"), ViewState::OrphanageDashboard);
        assert_eq!(dashboard_for_name("OrphanageStaff"), ViewState::OrphanageDashboard);
    }

    #[test]
    fn test_unknown_role_defaults_to_donor_dashboard() {
        assert_eq!(dashboard_for_name("Superuser"), ViewState::DonorDashboard);
        assert_eq!(dashboard_for_name(""), ViewState::DonorDashboard);
    }

    #[test]
    fn test_admin_dashboard_gated_by_role() {
        let (mut router, factory) = router();
        let donor_session = session_for(Role::Donor);
        let err = router
            .navigate(ViewState::AdminDashboard, &donor_session)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Authorization);
        assert_eq!(router.current(), ViewState::Home);
        // The admin view was never constructed.
        assert_eq!(factory.built(), 0);
        assert!(!router.is_materialized(ViewState::AdminDashboard));
    }

    #[test]
    fn test_anonymous_session_cannot_enter_any_dashboard() {
        for dashboard in [
            ViewState::OrphanageDashboard,
            ViewState::DonorDashboard,
            ViewState::VolunteerDashboard,
            ViewState::AdminDashboard,
        ] {
            let (mut router, factory) = router();
            let anon = SessionStore::new();
            let err = router.navigate(dashboard, &anon).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Authorization);
            assert_eq!(router.current(), ViewState::Home);
            assert_eq!(factory.built(), 0);
        }
    }

    #[test]
    fn test_dashboard_materialized_once_per_session() {
        let (mut router, factory) = router();
        let session = session_for(Role::Donor);
        router.complete_login(&session).unwrap();
        assert_eq!(factory.built(), 1);

        // Leaving and re-entering reuses the cached instance.
        router.navigate(ViewState::Home, &session).unwrap();
        router.complete_login(&session).unwrap();
        assert_eq!(factory.built(), 1);
    }

    #[test]
    fn test_logout_discards_cached_dashboards() {
        let (mut router, factory) = router();
        let session = session_for(Role::Donor);
        router.complete_login(&session).unwrap();
        assert_eq!(factory.built(), 1);

        assert_eq!(router.reset_to_home(), ViewState::Home);
        assert!(!router.is_materialized(ViewState::DonorDashboard));

        // Next login, same role: a brand new instance, not the cached one.
        let session2 = session_for(Role::Donor);
        router.complete_login(&session2).unwrap();
        assert_eq!(factory.built(), 2);
    }

    #[test]
    fn test_unknown_view_name_falls_back_to_home() {
        let (mut router, _) = router();
        let anon = SessionStore::new();
        router.navigate(ViewState::Login, &anon).unwrap();
        let err = router.navigate_by_name("SettingsPanel", &anon).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(router.current(), ViewState::Home);
    }

    #[test]
    fn test_navigate_by_known_name() {
        let (mut router, _) = router();
        let anon = SessionStore::new();
        assert_eq!(
            router.navigate_by_name("Login", &anon).unwrap(),
            ViewState::Login
        );
    }

    #[test]
    fn test_name_roundtrip() {
        for view in [
            ViewState::Home,
            ViewState::Login,
            ViewState::Registration,
            ViewState::OrphanageDashboard,
            ViewState::DonorDashboard,
            ViewState::VolunteerDashboard,
            ViewState::AdminDashboard,
        ] {
            assert_eq!(ViewState::from_name(view.name()), Some(view));
        }
    }
}
