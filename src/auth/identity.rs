//! Identities, roles, and the credential store contract.
//!
//! An [`Identity`] is the canonical authenticated-user record. The
//! control plane reads identities through the [`CredentialStore`] trait
//! and never mutates them; registration is the only writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

use super::crypto::{self, PasswordPolicy};
use crate::error::{codes, ServiceError, ServiceResult};

/// Closed role enumeration controlling which dashboard is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    /// Historical registration flows also produced `OrphanageRep` and
    /// `Staff`; all three normalize here.
    #[serde(alias = "OrphanageRep", alias = "Staff")]
    OrphanageStaff,
    Donor,
    Volunteer,
}

impl Role {
    /// Parse a role string, normalizing historical aliases.
    ///
    /// This table is public contract: external registration data
    /// contains any of the alias spellings.
    pub fn parse(s: &str) -> Option<Role> {
        if s.eq_ignore_ascii_case("Admin") {
            Some(Role::Admin)
        } else if s.eq_ignore_ascii_case("OrphanageStaff")
            || s.eq_ignore_ascii_case("OrphanageRep")
            || s.eq_ignore_ascii_case("Staff")
        {
            Some(Role::OrphanageStaff)
        } else if s.eq_ignore_ascii_case("Donor") {
            Some(Role::Donor)
        } else if s.eq_ignore_ascii_case("Volunteer") {
            Some(Role::Volunteer)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::OrphanageStaff => "OrphanageStaff",
            Role::Donor => "Donor",
            Role::Volunteer => "Volunteer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Suspended,
    PendingVerification,
}

/// Canonical authenticated-user record.
///
/// Immutable from the control plane's point of view; the password hash
/// never serializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub email: String,
    pub full_name: Option<String>,
    /// Set for staff accounts linked to an orphanage profile.
    pub orphanage_id: Option<Uuid>,
    pub account_status: AccountStatus,
    pub registered_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new active identity, validating and hashing the password.
    pub fn new(
        username: impl Into<String>,
        password: &str,
        email: impl Into<String>,
        role: Role,
        policy: &PasswordPolicy,
    ) -> ServiceResult<Self> {
        policy.validate(password)?;
        let password_hash = crypto::hash_password(password)?;
        Ok(Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash,
            role,
            email: email.into(),
            full_name: None,
            orphanage_id: None,
            account_status: AccountStatus::Active,
            registered_at: Utc::now(),
        })
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_orphanage(mut self, orphanage_id: Uuid) -> Self {
        self.orphanage_id = Some(orphanage_id);
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.account_status = status;
        self
    }

    /// Verify a password attempt against the stored hash.
    pub fn verify_password(&self, password: &str) -> ServiceResult<bool> {
        crypto::verify_password(password, &self.password_hash)
    }
}

/// Credential store contract.
///
/// The real implementation lives in the data layer; the control plane
/// only needs lookup plus the write operations registration uses.
pub trait CredentialStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> ServiceResult<Option<Identity>>;

    fn username_exists(&self, username: &str) -> ServiceResult<bool>;

    fn email_exists(&self, email: &str) -> ServiceResult<bool>;

    fn create(&self, identity: &Identity) -> ServiceResult<()>;
}

/// In-memory credential store for tests and tools.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Vec<Identity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an identity directly, bypassing registration validation.
    pub fn seed(&self, identity: Identity) {
        self.users
            .write()
            .expect("credential store lock poisoned")
            .push(identity);
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_username(&self, username: &str) -> ServiceResult<Option<Identity>> {
        let users = self
            .users
            .read()
            .map_err(|_| ServiceError::from_store("credential store lock poisoned"))?;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    fn username_exists(&self, username: &str) -> ServiceResult<bool> {
        let users = self
            .users
            .read()
            .map_err(|_| ServiceError::from_store("credential store lock poisoned"))?;
        Ok(users.iter().any(|u| u.username == username))
    }

    fn email_exists(&self, email: &str) -> ServiceResult<bool> {
        let users = self
            .users
            .read()
            .map_err(|_| ServiceError::from_store("credential store lock poisoned"))?;
        Ok(users.iter().any(|u| u.email == email))
    }

    fn create(&self, identity: &Identity) -> ServiceResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| ServiceError::from_store("credential store lock poisoned"))?;
        if users.iter().any(|u| u.username == identity.username) {
            return Err(ServiceError::conflict(
                codes::DUPLICATE_USERNAME,
                format!("username '{}' already registered", identity.username),
            ));
        }
        users.push(identity.clone());
        Ok(())
    }
}
