use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::parser::ApplicationRow;
use super::{ApplicationImporter, IntakeError};
use crate::domain::{ApplicationId, NewApplication, UserId};
use crate::repository::{AuditAction, AuditEvent, AuditLog, RepositoryError, ReviewRepository};
use crate::workflows::record_audit;

/// Service loading applicant batches and managing their lifecycle.
pub struct IntakeService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

/// Result of one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub batch_id: String,
    pub success: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub reviewed: usize,
    pub pending: usize,
}

impl<R, A> IntakeService<R, A>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    /// Parse an export and upload every row in it.
    pub fn import_csv<Rd: Read>(
        &self,
        actor: Option<UserId>,
        reader: Rd,
    ) -> Result<UploadReport, IntakeError> {
        let rows = ApplicationImporter::from_reader(reader)?;
        self.upload(actor, rows)
    }

    /// Store valid rows; duplicates by email are skipped, invalid rows reported.
    pub fn upload(
        &self,
        actor: Option<UserId>,
        rows: Vec<ApplicationRow>,
    ) -> Result<UploadReport, IntakeError> {
        let mut report = UploadReport {
            batch_id: format!("batch_{}", Utc::now().timestamp_millis()),
            ..UploadReport::default()
        };
        let mut seen_in_batch: HashSet<String> = HashSet::new();

        for row in rows {
            let details = match row.validate() {
                Ok(details) => details,
                Err(err) => {
                    report.errors.push(err.to_string());
                    continue;
                }
            };

            let email_key = details.email.to_ascii_lowercase();
            if seen_in_batch.contains(&email_key)
                || self
                    .repository
                    .find_application_by_email(&details.email)?
                    .is_some()
            {
                report.duplicates += 1;
                continue;
            }

            self.repository.insert_application(NewApplication {
                details,
                batch_id: Some(report.batch_id.clone()),
            })?;
            seen_in_batch.insert(email_key);
            report.success += 1;
        }

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::UploadApplications, "application")
                .by(actor)
                .metadata(json!({
                    "batch_id": report.batch_id,
                    "success": report.success,
                    "duplicates": report.duplicates,
                    "errors": report.errors.len(),
                })),
        );

        info!(
            batch_id = %report.batch_id,
            success = report.success,
            duplicates = report.duplicates,
            errors = report.errors.len(),
            "uploaded application batch"
        );

        Ok(report)
    }

    /// Archived applications drop out of allocation, analytics and results.
    pub fn archive(&self, actor: Option<UserId>, id: ApplicationId) -> Result<(), IntakeError> {
        let mut application = self
            .repository
            .fetch_application(id)?
            .ok_or(IntakeError::ApplicationNotFound(id))?;
        application.is_archived = true;
        self.repository.update_application(application)?;

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::ArchiveApplication, "application")
                .by(actor)
                .entity(id.0),
        );
        Ok(())
    }

    pub fn delete(&self, actor: Option<UserId>, id: ApplicationId) -> Result<(), IntakeError> {
        match self.repository.delete_application(id) {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(IntakeError::ApplicationNotFound(id)),
            Err(other) => return Err(other.into()),
        }

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::DeleteApplication, "application")
                .by(actor)
                .entity(id.0),
        );
        Ok(())
    }

    /// Remove every application along with its reviews and assignments.
    pub fn clear_all(&self, actor: Option<UserId>) -> Result<usize, IntakeError> {
        let applications = self.repository.applications()?;
        for application in &applications {
            self.repository.delete_application(application.id)?;
        }

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::ClearApplications, "application")
                .by(actor)
                .metadata(json!({ "deleted": applications.len() })),
        );
        info!(deleted = applications.len(), "cleared all applications");
        Ok(applications.len())
    }

    pub fn application_stats(&self) -> Result<ApplicationStats, IntakeError> {
        let open: HashSet<ApplicationId> = self
            .repository
            .open_applications()?
            .into_iter()
            .map(|application| application.id)
            .collect();
        let reviewed: HashSet<ApplicationId> = self
            .repository
            .reviews()?
            .into_iter()
            .map(|review| review.application_id)
            .filter(|id| open.contains(id))
            .collect();

        Ok(ApplicationStats {
            total: open.len(),
            reviewed: reviewed.len(),
            pending: open.len() - reviewed.len(),
        })
    }
}
