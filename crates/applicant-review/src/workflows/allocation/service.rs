use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::balancer::plan_assignments;
use super::AllocationError;
use crate::domain::{ApplicationId, Assignment, AssignmentId, UserId};
use crate::repository::{AuditAction, AuditEvent, AuditLog, RepositoryError, ReviewRepository};
use crate::workflows::record_audit;

/// Service running allocation rounds and single-assignment changes.
pub struct AllocationService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

/// Counts reported back after an allocation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    pub application_count: usize,
    pub assignment_count: usize,
    pub reviewer_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedReviewer {
    pub assignment_id: AssignmentId,
    pub reviewer_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationAllocation {
    pub application_id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub reviewers: Vec<AssignedReviewer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerOption {
    pub id: UserId,
    pub username: String,
}

/// Current assignments grouped per application, plus the reassignment roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationOverview {
    pub allocations: Vec<ApplicationAllocation>,
    pub reviewers: Vec<ReviewerOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignmentProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

impl<R, A> AllocationService<R, A>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    /// Replace every assignment with a freshly balanced set.
    ///
    /// Nothing is written unless both preconditions hold.
    pub fn allocate(&self, actor: Option<UserId>) -> Result<AllocationSummary, AllocationError> {
        let reviewers: Vec<UserId> = self
            .repository
            .active_reviewers()?
            .into_iter()
            .map(|user| user.id)
            .collect();
        if reviewers.len() < 2 {
            return Err(AllocationError::InsufficientReviewers {
                found: reviewers.len(),
            });
        }

        let applications: Vec<ApplicationId> = self
            .repository
            .open_applications()?
            .into_iter()
            .map(|application| application.id)
            .collect();

        let plan = plan_assignments(&reviewers, &applications)?;
        if !plan.fallback_applications.is_empty() {
            warn!(
                applications = ?plan.fallback_applications,
                "round-robin could not fill every application within quota"
            );
        }
        if !plan.short_applications.is_empty() {
            warn!(
                applications = ?plan.short_applications,
                "applications left with fewer than two reviewers"
            );
        }

        let stored = self.repository.replace_assignments(plan.assignments)?;
        let summary = AllocationSummary {
            application_count: applications.len(),
            assignment_count: stored.len(),
            reviewer_count: reviewers.len(),
        };

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::AllocateApplications, "assignment")
                .by(actor)
                .metadata(json!({
                    "total_applications": summary.application_count,
                    "total_assignments": summary.assignment_count,
                    "reviewer_count": summary.reviewer_count,
                })),
        );

        info!(
            applications = summary.application_count,
            assignments = summary.assignment_count,
            reviewers = summary.reviewer_count,
            "allocated applications to reviewers"
        );

        Ok(summary)
    }

    /// Hand a single assignment to another reviewer.
    pub fn reassign(
        &self,
        actor: Option<UserId>,
        assignment_id: AssignmentId,
        new_reviewer_id: UserId,
    ) -> Result<Assignment, AllocationError> {
        let current = self
            .repository
            .fetch_assignment(assignment_id)?
            .ok_or(AllocationError::AssignmentNotFound(assignment_id))?;

        let duplicate = AllocationError::DuplicateReviewerForApplication {
            application_id: current.application_id,
            reviewer_id: new_reviewer_id,
        };

        let already_assigned = self.repository.assignments()?.iter().any(|assignment| {
            assignment.application_id == current.application_id
                && assignment.reviewer_id == new_reviewer_id
        });
        if already_assigned {
            return Err(duplicate);
        }

        match self.repository.fetch_user(new_reviewer_id)? {
            Some(user) if user.is_active_reviewer() => {}
            _ => return Err(AllocationError::ReviewerNotFound(new_reviewer_id)),
        }

        let updated = match self
            .repository
            .update_assignment_reviewer(assignment_id, new_reviewer_id)
        {
            Ok(updated) => updated,
            Err(RepositoryError::Conflict) => return Err(duplicate),
            Err(RepositoryError::NotFound) => {
                return Err(AllocationError::AssignmentNotFound(assignment_id))
            }
            Err(other) => return Err(other.into()),
        };

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::ReassignApplication, "assignment")
                .by(actor)
                .entity(assignment_id.0)
                .metadata(json!({
                    "application_id": current.application_id,
                    "old_reviewer_id": current.reviewer_id,
                    "new_reviewer_id": new_reviewer_id,
                })),
        );

        info!(
            %assignment_id,
            application_id = %current.application_id,
            from = %current.reviewer_id,
            to = %new_reviewer_id,
            "reassigned application"
        );

        Ok(updated)
    }

    pub fn allocations(&self) -> Result<AllocationOverview, AllocationError> {
        let users: HashMap<UserId, String> = self
            .repository
            .users()?
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();
        let applications: HashMap<ApplicationId, (String, String)> = self
            .repository
            .applications()?
            .into_iter()
            .map(|application| {
                (
                    application.id,
                    (application.details.full_name, application.details.email),
                )
            })
            .collect();

        let mut grouped: BTreeMap<ApplicationId, ApplicationAllocation> = BTreeMap::new();
        for assignment in self.repository.assignments()? {
            let Some((full_name, email)) = applications.get(&assignment.application_id) else {
                continue;
            };
            grouped
                .entry(assignment.application_id)
                .or_insert_with(|| ApplicationAllocation {
                    application_id: assignment.application_id,
                    full_name: full_name.clone(),
                    email: email.clone(),
                    reviewers: Vec::new(),
                })
                .reviewers
                .push(AssignedReviewer {
                    assignment_id: assignment.id,
                    reviewer_id: assignment.reviewer_id,
                    username: users
                        .get(&assignment.reviewer_id)
                        .cloned()
                        .unwrap_or_default(),
                });
        }

        let reviewers = self
            .repository
            .active_reviewers()?
            .into_iter()
            .map(|user| ReviewerOption {
                id: user.id,
                username: user.username,
            })
            .collect();

        Ok(AllocationOverview {
            allocations: grouped.into_values().collect(),
            reviewers,
        })
    }

    /// How much of the reviewer's assigned queue is already scored.
    pub fn assignment_progress(
        &self,
        reviewer_id: UserId,
    ) -> Result<AssignmentProgress, AllocationError> {
        let assigned = self.repository.assignments_for_reviewer(reviewer_id)?;
        let reviewed: HashSet<ApplicationId> = self
            .repository
            .reviews_by_reviewer(reviewer_id)?
            .into_iter()
            .map(|review| review.application_id)
            .collect();

        let remaining = assigned
            .iter()
            .filter(|assignment| !reviewed.contains(&assignment.application_id))
            .count();

        Ok(AssignmentProgress {
            total: assigned.len(),
            completed: assigned.len() - remaining,
            remaining,
        })
    }
}
