//! # Authentication
//!
//! Identities, credential storage, password hashing, registration, and
//! the login/logout controller that ties them to the session store and
//! the view router.

pub mod controller;
pub mod crypto;
pub mod identity;
pub mod registration;

pub use controller::AuthController;
pub use crypto::PasswordPolicy;
pub use identity::{AccountStatus, CredentialStore, Identity, InMemoryCredentialStore, Role};
pub use registration::{RegisterRequest, RegistrationService};
