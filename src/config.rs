//! Application configuration.
//!
//! Everything here has a sensible default so the control plane can be
//! constructed with `AppConfig::default()` in tests and tools;
//! `from_env` applies deployment overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::auth::crypto::PasswordPolicy;

/// Control-plane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Idle minutes before an authenticated session is dropped (default: 30)
    #[serde(default = "default_session_timeout")]
    pub session_timeout_minutes: i64,

    /// Where the file audit sink appends its records
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    /// Password requirements applied at registration
    #[serde(default)]
    pub password_policy: PasswordPolicy,
}

fn default_session_timeout() -> i64 {
    30
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("orphanhub_audit.log")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: default_session_timeout(),
            audit_log_path: default_audit_log_path(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `ORPHANHUB_*` environment variables.
    ///
    /// Unparseable values fall back to the default rather than failing
    /// startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(minutes) = std::env::var("ORPHANHUB_SESSION_TIMEOUT_MINUTES") {
            if let Ok(minutes) = minutes.parse::<i64>() {
                if minutes > 0 {
                    config.session_timeout_minutes = minutes;
                }
            }
        }
        if let Ok(path) = std::env::var("ORPHANHUB_AUDIT_LOG") {
            if !path.is_empty() {
                config.audit_log_path = PathBuf::from(path);
            }
        }
        config
    }
}
