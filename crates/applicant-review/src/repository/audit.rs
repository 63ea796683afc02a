use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::UserId;

/// Mutations recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AllocateApplications,
    ReassignApplication,
    UploadApplications,
    ArchiveApplication,
    DeleteApplication,
    ClearApplications,
    SubmitReview,
    UpdateReview,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ResetPassword,
    ExportResults,
}

impl AuditAction {
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::AllocateApplications => "ALLOCATE_APPLICATIONS",
            AuditAction::ReassignApplication => "REASSIGN_APPLICATION",
            AuditAction::UploadApplications => "UPLOAD_APPLICATIONS",
            AuditAction::ArchiveApplication => "ARCHIVE_APPLICATION",
            AuditAction::DeleteApplication => "DELETE_APPLICATION",
            AuditAction::ClearApplications => "CLEAR_APPLICATIONS",
            AuditAction::SubmitReview => "SUBMIT_REVIEW",
            AuditAction::UpdateReview => "UPDATE_REVIEW",
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::UpdateUser => "UPDATE_USER",
            AuditAction::DeleteUser => "DELETE_USER",
            AuditAction::ResetPassword => "RESET_PASSWORD",
            AuditAction::ExportResults => "EXPORT_RESULTS",
        }
    }
}

/// Event handed to the audit log by a workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub actor: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<u64>,
    pub metadata: Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction, entity_type: &'static str) -> Self {
        Self {
            actor: None,
            action,
            entity_type: Some(entity_type),
            entity_id: None,
            metadata: Value::Null,
        }
    }

    pub fn by(mut self, actor: Option<UserId>) -> Self {
        self.actor = actor;
        self
    }

    pub fn entity(mut self, id: u64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Persisted audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: u64,
    #[serde(flatten)]
    pub event: AuditEvent,
    pub created_at: DateTime<Utc>,
}

/// Append-only trail of administrative and review actions.
pub trait AuditLog: Send + Sync {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError>;
    /// Newest entries first.
    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}
