//! Reviewer allocation: spreads applications across active reviewers, two per application.

mod balancer;
mod service;

pub use balancer::{
    plan_assignments, reviewer_quotas, AllocationPlan, ReviewerQuota, REVIEWERS_PER_APPLICATION,
};
pub use service::{
    AllocationOverview, AllocationService, AllocationSummary, ApplicationAllocation,
    AssignedReviewer, AssignmentProgress, ReviewerOption,
};

use crate::domain::{ApplicationId, AssignmentId, UserId};
use crate::repository::RepositoryError;

/// Error raised by the allocation workflow.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("need at least 2 active reviewers to allocate applications (found {found})")]
    InsufficientReviewers { found: usize },
    #[error("no applications to allocate")]
    NoApplications,
    #[error("assignment {0} not found")]
    AssignmentNotFound(AssignmentId),
    #[error("reviewer {reviewer_id} is already assigned to application {application_id}")]
    DuplicateReviewerForApplication {
        application_id: ApplicationId,
        reviewer_id: UserId,
    },
    #[error("reviewer {0} is not an active reviewer")]
    ReviewerNotFound(UserId),
    #[error("failed to fetch allocation data: {0}")]
    DataFetchFailed(#[from] RepositoryError),
}
