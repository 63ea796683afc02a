//! Reviewer-facing scoring: drafts, submissions and the per-reviewer queue.

mod service;

pub use service::{NextReview, ReviewProgress, ReviewService, ReviewSubmission};

use crate::domain::{ApplicationId, ReviewId};
use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("{dimension} must be between 1 and 4")]
    InvalidScore { dimension: &'static str },
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("application {0} is archived")]
    ApplicationArchived(ApplicationId),
    #[error("application {0} has already been reviewed by this reviewer")]
    AlreadyReviewed(ApplicationId),
    #[error("application {0} is not assigned to this reviewer")]
    NotAssigned(ApplicationId),
    #[error("review start time is later than its submission")]
    StartedInFuture,
    #[error("review {0} not found")]
    ReviewNotFound(ReviewId),
    #[error("failed to access review data: {0}")]
    Repository(#[from] RepositoryError),
}
