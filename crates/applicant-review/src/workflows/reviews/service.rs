use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::ReviewError;
use crate::domain::{
    Application, ApplicationId, DraftReview, NewReview, Review, ReviewId, Role, RubricScores,
    UserId, RUBRIC_MAX, RUBRIC_MIN,
};
use crate::repository::{
    AuditAction, AuditEvent, AuditLog, RepositoryError, ReviewRepository, ReviewWithReviewer,
};
use crate::workflows::record_audit;

/// Completed rubric sent by a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewSubmission {
    pub application_id: ApplicationId,
    pub scores: RubricScores,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// The application a reviewer should work on next, with any saved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextReview {
    pub application: Application,
    pub draft: Option<DraftReview>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewProgress {
    pub completed: usize,
    pub assigned: usize,
}

pub struct ReviewService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

impl<R, A> ReviewService<R, A>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    /// Store a finished review and discard the reviewer's draft for it.
    pub fn submit(
        &self,
        reviewer_id: UserId,
        submission: ReviewSubmission,
    ) -> Result<Review, ReviewError> {
        if let Some(dimension) = submission.scores.out_of_range() {
            return Err(ReviewError::InvalidScore { dimension });
        }
        let submitted_at = Utc::now();
        if submission
            .started_at
            .is_some_and(|started_at| started_at > submitted_at)
        {
            return Err(ReviewError::StartedInFuture);
        }
        let application_id = submission.application_id;
        self.open_application(application_id)?;
        self.ensure_assigned(reviewer_id, application_id)?;

        let review = match self.repository.insert_review(NewReview {
            application_id,
            reviewer_id,
            scores: submission.scores,
            comments: clean_comments(submission.comments),
            started_at: submission.started_at,
            submitted_at: Some(submitted_at),
        }) {
            Ok(review) => review,
            Err(RepositoryError::Conflict) => {
                return Err(ReviewError::AlreadyReviewed(application_id))
            }
            Err(other) => return Err(other.into()),
        };

        self.repository.delete_draft(application_id, reviewer_id)?;

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::SubmitReview, "review")
                .by(Some(reviewer_id))
                .entity(review.id.0)
                .metadata(json!({
                    "application_id": application_id,
                    "reviewer_id": reviewer_id,
                    "total_score": review.total_score,
                })),
        );

        info!(
            review_id = %review.id,
            %application_id,
            %reviewer_id,
            total_score = review.total_score,
            "review submitted"
        );

        Ok(review)
    }

    /// Upsert the reviewer's partial rubric; present scores must be in range.
    pub fn save_draft(
        &self,
        reviewer_id: UserId,
        mut draft: DraftReview,
    ) -> Result<DraftReview, ReviewError> {
        draft.reviewer_id = reviewer_id;
        let partial = [
            ("initiative", draft.initiative),
            ("collaboration", draft.collaboration),
            ("curiosity", draft.curiosity),
            ("commitment", draft.commitment),
        ];
        if let Some((dimension, _)) = partial.iter().find(|(_, score)| {
            score.is_some_and(|score| !(RUBRIC_MIN..=RUBRIC_MAX).contains(&score))
        }) {
            return Err(ReviewError::InvalidScore {
                dimension: *dimension,
            });
        }
        self.open_application(draft.application_id)?;
        self.ensure_assigned(reviewer_id, draft.application_id)?;

        Ok(self.repository.upsert_draft(draft)?)
    }

    /// The open draft first, otherwise the earliest assigned application
    /// this reviewer has not scored. `None` once the queue is empty.
    pub fn next_for_reviewer(&self, reviewer_id: UserId) -> Result<Option<NextReview>, ReviewError> {
        let reviewed: HashSet<ApplicationId> = self
            .repository
            .reviews_by_reviewer(reviewer_id)?
            .into_iter()
            .map(|review| review.application_id)
            .collect();

        if let Some(draft) = self.repository.draft_for_reviewer(reviewer_id)? {
            if !reviewed.contains(&draft.application_id) {
                if let Some(application) = self.repository.fetch_application(draft.application_id)? {
                    if !application.is_archived {
                        return Ok(Some(NextReview {
                            application,
                            draft: Some(draft),
                        }));
                    }
                }
            }
        }

        let assigned: HashSet<ApplicationId> = self
            .repository
            .assignments_for_reviewer(reviewer_id)?
            .into_iter()
            .map(|assignment| assignment.application_id)
            .collect();

        Ok(self
            .repository
            .open_applications()?
            .into_iter()
            .find(|application| {
                assigned.contains(&application.id) && !reviewed.contains(&application.id)
            })
            .map(|application| NextReview {
                application,
                draft: None,
            }))
    }

    /// Admin correction of a submitted review.
    pub fn update(
        &self,
        actor: Option<UserId>,
        review_id: ReviewId,
        scores: RubricScores,
        comments: Option<String>,
    ) -> Result<Review, ReviewError> {
        if let Some(dimension) = scores.out_of_range() {
            return Err(ReviewError::InvalidScore { dimension });
        }
        let mut review = self
            .repository
            .fetch_review(review_id)?
            .ok_or(ReviewError::ReviewNotFound(review_id))?;

        let previous_total = review.total_score;
        review.scores = scores;
        review.total_score = scores.total();
        review.comments = clean_comments(comments);
        self.repository.update_review(review.clone())?;

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::UpdateReview, "review")
                .by(actor)
                .entity(review_id.0)
                .metadata(json!({
                    "previous_total": previous_total,
                    "total_score": review.total_score,
                })),
        );

        Ok(review)
    }

    pub fn reviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<ReviewWithReviewer>, ReviewError> {
        if self.repository.fetch_application(application_id)?.is_none() {
            return Err(ReviewError::ApplicationNotFound(application_id));
        }
        Ok(self
            .repository
            .reviews_with_reviewers()?
            .into_iter()
            .filter(|joined| joined.review.application_id == application_id)
            .collect())
    }

    pub fn progress(&self, reviewer_id: UserId) -> Result<ReviewProgress, ReviewError> {
        Ok(ReviewProgress {
            completed: self.repository.reviews_by_reviewer(reviewer_id)?.len(),
            assigned: self.repository.assignments_for_reviewer(reviewer_id)?.len(),
        })
    }

    fn open_application(&self, id: ApplicationId) -> Result<Application, ReviewError> {
        let application = self
            .repository
            .fetch_application(id)?
            .ok_or(ReviewError::ApplicationNotFound(id))?;
        if application.is_archived {
            return Err(ReviewError::ApplicationArchived(id));
        }
        Ok(application)
    }

    /// Reviewers may only score what they were assigned; admins are unrestricted.
    fn ensure_assigned(
        &self,
        reviewer_id: UserId,
        application_id: ApplicationId,
    ) -> Result<(), ReviewError> {
        let is_admin = self
            .repository
            .fetch_user(reviewer_id)?
            .is_some_and(|user| user.role == Role::Admin);
        if is_admin {
            return Ok(());
        }

        let assigned = self
            .repository
            .assignments_for_reviewer(reviewer_id)?
            .iter()
            .any(|assignment| assignment.application_id == application_id);
        if assigned {
            Ok(())
        } else {
            Err(ReviewError::NotAssigned(application_id))
        }
    }
}

fn clean_comments(comments: Option<String>) -> Option<String> {
    comments
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
