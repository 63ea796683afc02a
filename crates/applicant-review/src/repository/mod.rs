//! Storage seam shared by every review workflow.
//!
//! Services only see [`ReviewRepository`] and [`AuditLog`]; the service binary wires in
//! [`InMemoryReviewStore`], and tests substitute failing doubles where needed.

mod audit;
mod memory;

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{
    Application, ApplicationId, Assignment, AssignmentId, DraftReview, NewApplication,
    NewAssignment, NewReview, NewUser, Review, ReviewId, User, UserId,
};

pub use audit::{AuditAction, AuditEntry, AuditError, AuditEvent, AuditLog};
pub use memory::InMemoryReviewStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Relational collections consumed by the review workflows.
///
/// Deleting an application or a user cascades to the reviews, drafts and
/// assignments that reference it.
pub trait ReviewRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    /// All users in creation order.
    fn users(&self) -> Result<Vec<User>, RepositoryError>;

    fn insert_application(&self, application: NewApplication)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn find_application_by_email(&self, email: &str)
        -> Result<Option<Application>, RepositoryError>;
    /// All applications, archived included, in upload order.
    fn applications(&self) -> Result<Vec<Application>, RepositoryError>;

    /// Swap the whole assignment collection in one step.
    fn replace_assignments(
        &self,
        assignments: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, RepositoryError>;
    fn fetch_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, RepositoryError>;
    /// Fails with `Conflict` when the reviewer already holds the application.
    fn update_assignment_reviewer(
        &self,
        id: AssignmentId,
        reviewer_id: UserId,
    ) -> Result<Assignment, RepositoryError>;
    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError>;

    /// Fails with `Conflict` when the reviewer already reviewed the application.
    fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError>;
    fn update_review(&self, review: Review) -> Result<(), RepositoryError>;
    fn fetch_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn reviews(&self) -> Result<Vec<Review>, RepositoryError>;

    fn upsert_draft(&self, draft: DraftReview) -> Result<DraftReview, RepositoryError>;
    fn draft_for_reviewer(&self, reviewer_id: UserId)
        -> Result<Option<DraftReview>, RepositoryError>;
    fn delete_draft(
        &self,
        application_id: ApplicationId,
        reviewer_id: UserId,
    ) -> Result<(), RepositoryError>;

    /// Active reviewers in stable (creation) order.
    fn active_reviewers(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .users()?
            .into_iter()
            .filter(User::is_active_reviewer)
            .collect())
    }

    /// Non-archived applications in upload order.
    fn open_applications(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .applications()?
            .into_iter()
            .filter(|application| !application.is_archived)
            .collect())
    }

    fn assignments_for_reviewer(
        &self,
        reviewer_id: UserId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self
            .assignments()?
            .into_iter()
            .filter(|assignment| assignment.reviewer_id == reviewer_id)
            .collect())
    }

    fn reviews_by_reviewer(&self, reviewer_id: UserId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .reviews()?
            .into_iter()
            .filter(|review| review.reviewer_id == reviewer_id)
            .collect())
    }

    /// Every review with the reviewer's username attached.
    fn reviews_with_reviewers(&self) -> Result<Vec<ReviewWithReviewer>, RepositoryError> {
        let names = username_index(&self.users()?);
        Ok(self
            .reviews()?
            .into_iter()
            .map(|review| ReviewWithReviewer::join(review, &names))
            .collect())
    }

    /// Applications (in upload order) with their reviews attached.
    fn applications_with_reviews(
        &self,
        include_archived: bool,
    ) -> Result<Vec<ApplicationWithReviews>, RepositoryError> {
        let mut by_application: HashMap<ApplicationId, Vec<ReviewWithReviewer>> = HashMap::new();
        for joined in self.reviews_with_reviewers()? {
            by_application
                .entry(joined.review.application_id)
                .or_default()
                .push(joined);
        }

        Ok(self
            .applications()?
            .into_iter()
            .filter(|application| include_archived || !application.is_archived)
            .map(|application| {
                let reviews = by_application.remove(&application.id).unwrap_or_default();
                ApplicationWithReviews {
                    application,
                    reviews,
                }
            })
            .collect())
    }
}

fn username_index(users: &[User]) -> HashMap<UserId, String> {
    users
        .iter()
        .map(|user| (user.id, user.username.clone()))
        .collect()
}

/// Review joined with the reviewer's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewWithReviewer {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: String,
}

impl ReviewWithReviewer {
    fn join(review: Review, names: &HashMap<UserId, String>) -> Self {
        let reviewer_name = names
            .get(&review.reviewer_id)
            .cloned()
            .unwrap_or_else(|| format!("reviewer-{}", review.reviewer_id));
        Self {
            review,
            reviewer_name,
        }
    }
}

/// Application joined with every review it has received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationWithReviews {
    pub application: Application,
    pub reviews: Vec<ReviewWithReviewer>,
}
