//! # Session Store
//!
//! The single piece of mutable shared state in the control plane: who is
//! currently logged in, and as what. The store is an explicit owned
//! object threaded to whoever needs it, not a process-wide singleton,
//! and it holds a *typed* record rather than a string-keyed bag — a
//! session is either fully populated from a verified identity or empty,
//! with no partially-written state observable in between.
//!
//! All access happens on the UI thread; there is no internal locking.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::{Identity, Role};
use crate::observability::Logger;

/// Attribute keys readable through [`SessionStore::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    UserId,
    Username,
    Role,
    /// All roles; single-element today, kept as a list for hybrid-role
    /// accounts.
    Roles,
    FullName,
    Email,
    /// Present only for staff accounts.
    OrphanageId,
    IsAuthenticated,
    LoginTime,
}

/// Values returned from keyed session reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValue {
    Id(Uuid),
    Text(String),
    Role(Role),
    Roles(Vec<Role>),
    Flag(bool),
    Time(DateTime<Utc>),
}

impl SessionValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SessionValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SessionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<Role> {
        match self {
            SessionValue::Role(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<Uuid> {
        match self {
            SessionValue::Id(id) => Some(*id),
            _ => None,
        }
    }
}

/// The complete identity-derived attribute set for one logged-in user.
#[derive(Debug, Clone)]
struct ActiveSession {
    user_id: Uuid,
    username: String,
    role: Role,
    roles: Vec<Role>,
    full_name: Option<String>,
    email: String,
    orphanage_id: Option<Uuid>,
    login_time: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

/// Process-local store of the current authenticated identity.
///
/// Exactly one user is represented at a time; `begin` replaces any
/// previous session wholesale.
#[derive(Debug)]
pub struct SessionStore {
    current: Option<ActiveSession>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Empty store with the standard 30-minute idle timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::minutes(30))
    }

    pub fn with_timeout(idle_timeout: Duration) -> Self {
        Self {
            current: None,
            idle_timeout,
        }
    }

    /// Populate the session from a verified identity in one step.
    ///
    /// The orphanage link is carried only for staff roles; other roles
    /// never see one even if the record has it.
    pub fn begin(&mut self, identity: &Identity) {
        let now = Utc::now();
        self.current = Some(ActiveSession {
            user_id: identity.id,
            username: identity.username.clone(),
            role: identity.role,
            roles: vec![identity.role],
            full_name: identity.full_name.clone(),
            email: identity.email.clone(),
            orphanage_id: identity
                .orphanage_id
                .filter(|_| identity.role == Role::OrphanageStaff),
            login_time: now,
            last_activity: now,
        });
    }

    /// Drop all session state. Idempotent; clearing an anonymous
    /// session is a no-op.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Keyed read. Anonymous sessions answer `None` for every key.
    pub fn get(&self, key: SessionKey) -> Option<SessionValue> {
        let session = self.current.as_ref()?;
        match key {
            SessionKey::UserId => Some(SessionValue::Id(session.user_id)),
            SessionKey::Username => Some(SessionValue::Text(session.username.clone())),
            SessionKey::Role => Some(SessionValue::Role(session.role)),
            SessionKey::Roles => Some(SessionValue::Roles(session.roles.clone())),
            SessionKey::FullName => session
                .full_name
                .as_ref()
                .map(|name| SessionValue::Text(name.clone())),
            SessionKey::Email => Some(SessionValue::Text(session.email.clone())),
            SessionKey::OrphanageId => session.orphanage_id.map(SessionValue::Id),
            SessionKey::IsAuthenticated => Some(SessionValue::Flag(true)),
            SessionKey::LoginTime => Some(SessionValue::Time(session.login_time)),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_user_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|s| s.user_id)
    }

    pub fn current_username(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.username.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.current.as_ref().map(|s| s.role)
    }

    pub fn orphanage_id(&self) -> Option<Uuid> {
        self.current.as_ref().and_then(|s| s.orphanage_id)
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.current.as_ref().map(|s| s.login_time)
    }

    /// True when the primary role or any additional role matches.
    pub fn has_role(&self, role: Role) -> bool {
        self.current
            .as_ref()
            .map(|s| s.role == role || s.roles.contains(&role))
            .unwrap_or(false)
    }

    /// Record user activity, deferring the idle timeout.
    pub fn touch(&mut self) {
        if let Some(session) = self.current.as_mut() {
            session.last_activity = Utc::now();
        }
    }

    /// Drop the session if it has been idle past the timeout.
    ///
    /// Checked on access from the UI thread; there is no background
    /// sweeper. Returns true when the session was expired and cleared.
    pub fn expire_if_idle(&mut self) -> bool {
        let expired = self
            .current
            .as_ref()
            .map(|s| Utc::now() - s.last_activity > self.idle_timeout)
            .unwrap_or(false);
        if expired {
            let username = self.current_username().unwrap_or("").to_string();
            Logger::warn("SESSION_TIMEOUT", &[("username", username.as_str())]);
            self.clear();
        }
        expired
    }
}
