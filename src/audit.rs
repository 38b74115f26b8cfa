//! # Audit Trail
//!
//! Append-only records of security-relevant actions. The control plane
//! only ever writes entries; reading them back is a reporting concern
//! that lives elsewhere. Sink failures are logged and swallowed by
//! callers on the login path — auditing is best-effort and never blocks
//! the operation it describes.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Audited action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    Register,
    Create,
    Update,
    Delete,
    Verify,
    Apply,
    Donate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Register => "REGISTER",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Verify => "VERIFY",
            AuditAction::Apply => "APPLY",
            AuditAction::Donate => "DONATE",
        }
    }
}

/// A single append-only audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Acting user, when one is known (anonymous for failed logins).
    pub actor_id: Option<Uuid>,
    pub actor_name: Option<String>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, entity_type: impl Into<String>, success: bool) -> Self {
        Self {
            actor_id: None,
            actor_name: None,
            action,
            entity_type: entity_type.into(),
            entity_id: None,
            success,
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    pub fn with_actor(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.actor_id = Some(id);
        self.actor_name = Some(name.into());
        self
    }

    pub fn with_actor_name(mut self, name: impl Into<String>) -> Self {
        self.actor_name = Some(name.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Audit sink contract. Record must be durable (for durable sinks)
/// before the call returns.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry) -> ServiceResult<()>;
}

/// File-backed sink: one JSON record per line, flushed per record.
pub struct FileAuditSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditSink {
    /// Open or create the append-only audit file.
    pub fn open(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(ServiceError::audit_unavailable)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: &AuditEntry) -> ServiceResult<()> {
        let json = serde_json::to_string(entry).map_err(ServiceError::audit_unavailable)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ServiceError::audit_unavailable("writer lock poisoned"))?;
        writeln!(writer, "{json}").map_err(ServiceError::audit_unavailable)?;
        writer.flush().map_err(ServiceError::audit_unavailable)
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) -> ServiceResult<()> {
        self.entries
            .lock()
            .map_err(|_| ServiceError::audit_unavailable("entries lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}
