//! # OrphanHub Control Plane
//!
//! Session, authentication, and navigation services for the OrphanHub
//! case-management desktop application. The GUI shell owns one
//! [`auth::AuthController`]; everything observable about "who is logged
//! in and what can they see" flows through it:
//!
//! - [`error`] — the application-wide error taxonomy and
//!   [`error::ServiceResult`] alias used by every fallible operation.
//! - [`session`] — the typed, atomically-populated session store.
//! - [`auth`] — identities, credential storage, password hashing,
//!   registration, and the login/logout controller.
//! - [`router`] — the explicit view state machine with role-gated,
//!   lazily materialized dashboards.
//! - [`audit`] — best-effort append-only audit trail.
//! - [`store`] — the uniform CRUD contract the record services share.
//! - [`config`] / [`observability`] — runtime settings and structured
//!   logging.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod observability;
pub mod router;
pub mod session;
pub mod store;

pub use audit::{AuditAction, AuditEntry, AuditSink, FileAuditSink, MemoryAuditSink};
pub use auth::{
    AccountStatus, AuthController, CredentialStore, Identity, InMemoryCredentialStore,
    PasswordPolicy, RegisterRequest, RegistrationService, Role,
};
pub use config::AppConfig;
pub use error::{ErrorCategory, ServiceError, ServiceResult};
pub use router::{View, ViewFactory, ViewRouter, ViewState};
pub use session::{SessionKey, SessionStore, SessionValue};
pub use store::{Entity, InMemoryRecordStore, RecordStore};
