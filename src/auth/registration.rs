//! Account registration.
//!
//! Validation runs in a fixed order before any write: field presence,
//! email shape, password policy, role-specific requirements, then
//! uniqueness. Only a fully valid request reaches the credential store.

use std::sync::Arc;

use uuid::Uuid;

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::error::{codes, ServiceError, ServiceResult};
use crate::observability::Logger;

use super::crypto::PasswordPolicy;
use super::identity::{CredentialStore, Identity, Role};

/// Everything a new account needs. The role arrives already parsed;
/// alias normalization happens at the UI boundary via [`Role::parse`].
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    /// Required for staff accounts, ignored for everyone else.
    pub orphanage_id: Option<Uuid>,
}

/// Creates accounts against the credential store.
pub struct RegistrationService<C: CredentialStore, A: AuditSink> {
    credentials: Arc<C>,
    audit: Arc<A>,
    policy: PasswordPolicy,
}

impl<C: CredentialStore, A: AuditSink> RegistrationService<C, A> {
    pub fn new(credentials: Arc<C>, audit: Arc<A>, policy: PasswordPolicy) -> Self {
        Self {
            credentials,
            audit,
            policy,
        }
    }

    /// Register a new account and return the created identity.
    pub fn register(&self, request: RegisterRequest) -> ServiceResult<Identity> {
        self.validate(&request)?;

        if self.credentials.username_exists(&request.username)? {
            return Err(ServiceError::conflict(
                codes::DUPLICATE_USERNAME,
                format!("username '{}' already registered", request.username),
            ));
        }
        if self.credentials.email_exists(&request.email)? {
            return Err(ServiceError::conflict(
                codes::DUPLICATE_EMAIL,
                format!("email '{}' already registered", request.email),
            ));
        }

        let mut identity = Identity::new(
            request.username,
            &request.password,
            request.email,
            request.role,
            &self.policy,
        )?;
        if let Some(full_name) = request.full_name {
            identity = identity.with_full_name(full_name);
        }
        if request.role == Role::OrphanageStaff {
            if let Some(orphanage_id) = request.orphanage_id {
                identity = identity.with_orphanage(orphanage_id);
            }
        }

        self.credentials.create(&identity)?;

        let entry = AuditEntry::new(AuditAction::Register, "User", true)
            .with_actor(identity.id, identity.username.clone())
            .with_entity_id(identity.id.to_string());
        if let Err(err) = self.audit.record(&entry) {
            Logger::error("AUDIT_WRITE_FAILED", &[("action", "REGISTER"), ("detail", err.message())]);
        }
        Logger::info(
            "REGISTERED",
            &[
                ("username", identity.username.as_str()),
                ("role", identity.role.as_str()),
            ],
        );
        Ok(identity)
    }

    fn validate(&self, request: &RegisterRequest) -> ServiceResult<()> {
        if request.username.trim().is_empty() {
            return Err(ServiceError::validation(
                codes::EMPTY_CREDENTIALS,
                "username is required",
            ));
        }
        if !request.email.contains('@') || request.email.trim().is_empty() {
            return Err(ServiceError::validation(
                codes::INVALID_EMAIL,
                format!("'{}' is not a valid email address", request.email),
            ));
        }
        self.policy.validate(&request.password)?;
        if request.role == Role::OrphanageStaff && request.orphanage_id.is_none() {
            return Err(ServiceError::validation(
                codes::MISSING_ORPHANAGE,
                "staff accounts must be linked to an orphanage",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::auth::identity::InMemoryCredentialStore;
    use crate::error::ErrorCategory;

    fn service() -> (
        RegistrationService<InMemoryCredentialStore, MemoryAuditSink>,
        Arc<InMemoryCredentialStore>,
        Arc<MemoryAuditSink>,
    ) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let service =
            RegistrationService::new(store.clone(), audit.clone(), PasswordPolicy::default());
        (service, store, audit)
    }

    fn donor_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "password123".to_string(),
            email: email.to_string(),
            full_name: Some("Test Donor".to_string()),
            role: Role::Donor,
            orphanage_id: None,
        }
    }

    #[test]
    fn test_register_creates_lookupable_identity() {
        let (service, store, audit) = service();
        let identity = service
            .register(donor_request("donor1", "donor1@example.org"))
            .unwrap();

        let found = store.find_by_username("donor1").unwrap().unwrap();
        assert_eq!(found.id, identity.id);
        assert_eq!(found.full_name.as_deref(), Some("Test Donor"));

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Register);
        assert!(entries[0].success);
    }

    #[test]
    fn test_invalid_email_rejected_before_any_write() {
        let (service, store, audit) = service();
        let err = service
            .register(donor_request("donor1", "not-an-email"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.code(), codes::INVALID_EMAIL);
        assert!(!store.username_exists("donor1").unwrap());
        assert!(audit.is_empty());
    }

    #[test]
    fn test_weak_password_rejected() {
        let (service, _, _) = service();
        let mut request = donor_request("donor1", "donor1@example.org");
        request.password = "short".to_string();
        let err = service.register(request).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.code(), codes::WEAK_PASSWORD);
    }

    #[test]
    fn test_staff_requires_orphanage_link() {
        let (service, _, _) = service();
        let mut request = donor_request("staff1", "staff1@example.org");
        request.role = Role::OrphanageStaff;
        let err = service.register(request.clone()).unwrap_err();
        assert_eq!(err.code(), codes::MISSING_ORPHANAGE);

        request.orphanage_id = Some(Uuid::new_v4());
        let identity = service.register(request).unwrap();
        assert!(identity.orphanage_id.is_some());
    }

    #[test]
    fn test_duplicate_username_and_email_conflict() {
        let (service, _, _) = service();
        service
            .register(donor_request("donor1", "donor1@example.org"))
            .unwrap();

        let err = service
            .register(donor_request("donor1", "other@example.org"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(err.code(), codes::DUPLICATE_USERNAME);

        let err = service
            .register(donor_request("donor2", "donor1@example.org"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(err.code(), codes::DUPLICATE_EMAIL);
    }

    #[test]
    fn test_non_staff_orphanage_link_is_dropped() {
        let (service, _, _) = service();
        let mut request = donor_request("donor1", "donor1@example.org");
        request.orphanage_id = Some(Uuid::new_v4());
        let identity = service.register(request).unwrap();
        assert!(identity.orphanage_id.is_none());
    }
}
