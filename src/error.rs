//! # Service Error Taxonomy
//!
//! Every fallible operation in the crate returns a [`ServiceError`] with a
//! stable numeric code and a category. Callers pattern-match on the
//! category to decide whether to retry, surface a message, or abort;
//! nothing in the crate reports a category-less failure or panics on an
//! expected failure path.
//!
//! Codes are grouped in contiguous per-category ranges (1000s validation,
//! 2000s authentication, and so on) so a code alone identifies its
//! category.

use serde::Serialize;
use thiserror::Error;

/// Result type for all service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure categories shared by every service in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    /// Input rejected before any store access
    Validation,
    /// Credential verification failed
    Authentication,
    /// Authenticated but not permitted
    Authorization,
    /// Requested record or view does not exist
    NotFound,
    /// Uniqueness or state conflict
    Conflict,
    /// Domain rule violated
    BusinessLogic,
    /// External collaborator (audit sink, mail, ...) unavailable
    ExternalService,
    /// Backing record store failed; driver detail never crosses here
    DataStore,
    /// Internal invariant or runtime failure
    System,
}

impl ErrorCategory {
    /// First code of this category's range.
    pub fn base_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 1000,
            ErrorCategory::Authentication => 2000,
            ErrorCategory::Authorization => 3000,
            ErrorCategory::NotFound => 4000,
            ErrorCategory::Conflict => 5000,
            ErrorCategory::BusinessLogic => 6000,
            ErrorCategory::ExternalService => 7000,
            ErrorCategory::DataStore => 8000,
            ErrorCategory::System => 9000,
        }
    }

    /// Returns the category name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::Authentication => "AUTHENTICATION",
            ErrorCategory::Authorization => "AUTHORIZATION",
            ErrorCategory::NotFound => "NOT_FOUND",
            ErrorCategory::Conflict => "CONFLICT",
            ErrorCategory::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCategory::ExternalService => "EXTERNAL_SERVICE",
            ErrorCategory::DataStore => "DATA_STORE",
            ErrorCategory::System => "SYSTEM",
        }
    }

    /// Stable, pre-approved text shown to the end user for this category.
    ///
    /// Raw driver or internal text is logged, never displayed.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Please correct the highlighted fields and try again.",
            ErrorCategory::Authentication => "Invalid username or password.",
            ErrorCategory::Authorization => "You do not have permission to perform this action.",
            ErrorCategory::NotFound => "The requested item could not be found.",
            ErrorCategory::Conflict => "This conflicts with an existing record.",
            ErrorCategory::BusinessLogic => "This action is not allowed right now.",
            ErrorCategory::ExternalService => "A supporting service is temporarily unavailable.",
            ErrorCategory::DataStore => "A database error occurred. Please try again later.",
            ErrorCategory::System => "An unexpected error occurred. Please contact support.",
        }
    }
}

/// Well-known error codes, grouped by category range.
pub mod codes {
    pub const EMPTY_CREDENTIALS: u16 = 1001;
    pub const INVALID_EMAIL: u16 = 1002;
    pub const WEAK_PASSWORD: u16 = 1003;
    pub const MISSING_ORPHANAGE: u16 = 1004;

    pub const INVALID_CREDENTIALS: u16 = 2001;
    pub const ACCOUNT_SUSPENDED: u16 = 2002;
    pub const ACCOUNT_NOT_VERIFIED: u16 = 2003;

    pub const ROLE_REQUIRED: u16 = 3001;

    pub const VIEW_NOT_FOUND: u16 = 4001;
    pub const RECORD_NOT_FOUND: u16 = 4002;

    pub const DUPLICATE_USERNAME: u16 = 5001;
    pub const DUPLICATE_EMAIL: u16 = 5002;

    pub const ILLEGAL_TRANSITION: u16 = 6001;

    pub const AUDIT_UNAVAILABLE: u16 = 7001;

    pub const STORE_FAILURE: u16 = 8001;

    pub const HASHING_FAILED: u16 = 9001;
}

/// A categorized, coded failure value.
///
/// Constructed at the failure site and never mutated. `message` is the
/// internal detail (safe to log); the display text comes from
/// [`ErrorCategory::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{category:?}({code}): {message}")]
pub struct ServiceError {
    code: u16,
    category: ErrorCategory,
    message: String,
    params: Vec<String>,
}

impl ServiceError {
    /// Build an error with an explicit code. The code must fall inside
    /// the category's range.
    pub fn with_code(category: ErrorCategory, code: u16, message: impl Into<String>) -> Self {
        debug_assert!(
            code >= category.base_code() && code < category.base_code() + 1000,
            "code outside category range"
        );
        Self {
            code,
            category,
            message: message.into(),
            params: Vec::new(),
        }
    }

    /// Attach a display parameter (field name, record id, ...).
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Text safe to show to the end user.
    pub fn user_message(&self) -> &'static str {
        self.category.user_message()
    }

    /// True when the failure is the caller's fault rather than the
    /// system's; drives the warn-vs-error logging split.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self.category,
            ErrorCategory::ExternalService | ErrorCategory::DataStore | ErrorCategory::System
        )
    }

    // --- constructors for the common cases ---

    pub fn validation(code: u16, message: impl Into<String>) -> Self {
        Self::with_code(ErrorCategory::Validation, code, message)
    }

    /// The shared credential-failure error. Deliberately identical for
    /// "no such user" and "bad password" so usernames cannot be
    /// enumerated.
    pub fn invalid_credentials() -> Self {
        Self::with_code(
            ErrorCategory::Authentication,
            codes::INVALID_CREDENTIALS,
            "invalid username or password",
        )
    }

    pub fn account_suspended() -> Self {
        Self::with_code(
            ErrorCategory::Authentication,
            codes::ACCOUNT_SUSPENDED,
            "account is suspended",
        )
    }

    pub fn account_not_verified() -> Self {
        Self::with_code(
            ErrorCategory::Authentication,
            codes::ACCOUNT_NOT_VERIFIED,
            "account is pending verification",
        )
    }

    pub fn role_required(required: &str) -> Self {
        Self::with_code(
            ErrorCategory::Authorization,
            codes::ROLE_REQUIRED,
            format!("requires role {required}"),
        )
        .with_param(required)
    }

    pub fn view_not_found(name: &str) -> Self {
        Self::with_code(
            ErrorCategory::NotFound,
            codes::VIEW_NOT_FOUND,
            format!("unknown view '{name}'"),
        )
        .with_param(name)
    }

    pub fn record_not_found(entity: &str) -> Self {
        Self::with_code(
            ErrorCategory::NotFound,
            codes::RECORD_NOT_FOUND,
            format!("{entity} not found"),
        )
        .with_param(entity)
    }

    pub fn conflict(code: u16, message: impl Into<String>) -> Self {
        Self::with_code(ErrorCategory::Conflict, code, message)
    }

    pub fn illegal_transition(from: &str, to: &str) -> Self {
        Self::with_code(
            ErrorCategory::BusinessLogic,
            codes::ILLEGAL_TRANSITION,
            format!("no transition from {from} to {to}"),
        )
        .with_param(from)
        .with_param(to)
    }

    pub fn audit_unavailable(detail: impl std::fmt::Display) -> Self {
        Self::with_code(
            ErrorCategory::ExternalService,
            codes::AUDIT_UNAVAILABLE,
            format!("audit sink unavailable: {detail}"),
        )
    }

    /// Wrap a backing-store failure. The driver's own error type stops
    /// here; only its display text survives, and only into logs.
    pub fn from_store(detail: impl std::fmt::Display) -> Self {
        Self::with_code(
            ErrorCategory::DataStore,
            codes::STORE_FAILURE,
            format!("store failure: {detail}"),
        )
    }

    pub fn hashing_failed() -> Self {
        Self::with_code(
            ErrorCategory::System,
            codes::HASHING_FAILED,
            "password hashing failed",
        )
    }
}
