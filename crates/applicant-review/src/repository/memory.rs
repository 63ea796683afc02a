use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::audit::{AuditEntry, AuditError, AuditEvent, AuditLog};
use super::{RepositoryError, ReviewRepository};
use crate::domain::{
    Application, ApplicationId, Assignment, AssignmentId, DraftReview, NewApplication,
    NewAssignment, NewReview, NewUser, Review, ReviewId, User, UserId,
};

/// Process-local store backing the service binary and the test suites.
///
/// Every collection lives behind one mutex, so the assignment swap and the
/// cascading deletes are atomic with respect to other callers.
#[derive(Default, Clone)]
pub struct InMemoryReviewStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    users: Vec<User>,
    applications: Vec<Application>,
    reviews: Vec<Review>,
    assignments: Vec<Assignment>,
    drafts: Vec<DraftReview>,
    audit: Vec<AuditEntry>,
    sequence: u64,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl ReviewRepository for InMemoryReviewStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state()?;
        if state
            .users
            .iter()
            .any(|existing| existing.username == user.username)
        {
            return Err(RepositoryError::Conflict);
        }

        let record = User {
            id: UserId(state.next_id()),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: user.is_active,
            created_at: Utc::now(),
            last_login: None,
        };
        state.users.push(record.clone());
        Ok(record)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state
            .users
            .iter()
            .any(|existing| existing.id != user.id && existing.username == user.username)
        {
            return Err(RepositoryError::Conflict);
        }

        let slot = state
            .users
            .iter_mut()
            .find(|existing| existing.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = user;
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.users.len();
        state.users.retain(|user| user.id != id);
        if state.users.len() == before {
            return Err(RepositoryError::NotFound);
        }

        state.reviews.retain(|review| review.reviewer_id != id);
        state.drafts.retain(|draft| draft.reviewer_id != id);
        state
            .assignments
            .retain(|assignment| assignment.reviewer_id != id);
        for entry in state.audit.iter_mut() {
            if entry.event.actor == Some(id) {
                entry.event.actor = None;
            }
        }
        Ok(())
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state()?;
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.state()?.users.clone())
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.state()?;
        let record = Application {
            id: ApplicationId(state.next_id()),
            details: application.details,
            uploaded_at: Utc::now(),
            batch_id: application.batch_id,
            is_archived: false,
        };
        state.applications.push(record.clone());
        Ok(record)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let slot = state
            .applications
            .iter_mut()
            .find(|existing| existing.id == application.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = application;
        Ok(())
    }

    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.applications.len();
        state.applications.retain(|application| application.id != id);
        if state.applications.len() == before {
            return Err(RepositoryError::NotFound);
        }

        state.reviews.retain(|review| review.application_id != id);
        state.drafts.retain(|draft| draft.application_id != id);
        state
            .assignments
            .retain(|assignment| assignment.application_id != id);
        Ok(())
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .applications
            .iter()
            .find(|application| application.id == id)
            .cloned())
    }

    fn find_application_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .applications
            .iter()
            .find(|application| application.details.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        let mut applications = self.state()?.applications.clone();
        applications.sort_by_key(|application| (application.uploaded_at, application.id));
        Ok(applications)
    }

    fn replace_assignments(
        &self,
        assignments: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let mut state = self.state()?;
        let assigned_at = Utc::now();
        let mut replacement: Vec<Assignment> = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            if replacement.iter().any(|existing| {
                existing.application_id == assignment.application_id
                    && existing.reviewer_id == assignment.reviewer_id
            }) {
                return Err(RepositoryError::Conflict);
            }
            replacement.push(Assignment {
                id: AssignmentId(0),
                application_id: assignment.application_id,
                reviewer_id: assignment.reviewer_id,
                assigned_at,
            });
        }

        for assignment in replacement.iter_mut() {
            assignment.id = AssignmentId(state.next_id());
        }
        state.assignments = replacement.clone();
        Ok(replacement)
    }

    fn fetch_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .assignments
            .iter()
            .find(|assignment| assignment.id == id)
            .cloned())
    }

    fn update_assignment_reviewer(
        &self,
        id: AssignmentId,
        reviewer_id: UserId,
    ) -> Result<Assignment, RepositoryError> {
        let mut state = self.state()?;
        let application_id = state
            .assignments
            .iter()
            .find(|assignment| assignment.id == id)
            .map(|assignment| assignment.application_id)
            .ok_or(RepositoryError::NotFound)?;

        if state.assignments.iter().any(|assignment| {
            assignment.id != id
                && assignment.application_id == application_id
                && assignment.reviewer_id == reviewer_id
        }) {
            return Err(RepositoryError::Conflict);
        }

        let slot = state
            .assignments
            .iter_mut()
            .find(|assignment| assignment.id == id)
            .ok_or(RepositoryError::NotFound)?;
        slot.reviewer_id = reviewer_id;
        slot.assigned_at = Utc::now();
        Ok(slot.clone())
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self.state()?.assignments.clone())
    }

    fn insert_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let mut state = self.state()?;
        if state.reviews.iter().any(|existing| {
            existing.application_id == review.application_id
                && existing.reviewer_id == review.reviewer_id
        }) {
            return Err(RepositoryError::Conflict);
        }

        let record = Review {
            id: ReviewId(state.next_id()),
            application_id: review.application_id,
            reviewer_id: review.reviewer_id,
            total_score: review.scores.total(),
            scores: review.scores,
            comments: review.comments,
            started_at: review.started_at,
            submitted_at: review.submitted_at,
        };
        state.reviews.push(record.clone());
        Ok(record)
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let slot = state
            .reviews
            .iter_mut()
            .find(|existing| existing.id == review.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = review;
        Ok(())
    }

    fn fetch_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let state = self.state()?;
        Ok(state.reviews.iter().find(|review| review.id == id).cloned())
    }

    fn reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.state()?.reviews.clone())
    }

    fn upsert_draft(&self, mut draft: DraftReview) -> Result<DraftReview, RepositoryError> {
        let mut state = self.state()?;
        draft.updated_at = Some(Utc::now());
        match state.drafts.iter_mut().find(|existing| {
            existing.application_id == draft.application_id
                && existing.reviewer_id == draft.reviewer_id
        }) {
            Some(slot) => *slot = draft.clone(),
            None => state.drafts.push(draft.clone()),
        }
        Ok(draft)
    }

    fn draft_for_reviewer(
        &self,
        reviewer_id: UserId,
    ) -> Result<Option<DraftReview>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .drafts
            .iter()
            .find(|draft| draft.reviewer_id == reviewer_id)
            .cloned())
    }

    fn delete_draft(
        &self,
        application_id: ApplicationId,
        reviewer_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.drafts.retain(|draft| {
            !(draft.application_id == application_id && draft.reviewer_id == reviewer_id)
        });
        Ok(())
    }
}

impl AuditLog for InMemoryReviewStore {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuditError::Unavailable("store mutex poisoned".to_string()))?;
        let id = state.next_id();
        state.audit.push(AuditEntry {
            id,
            event,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let state = self
            .state
            .lock()
            .map_err(|_| AuditError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(state.audit.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicantDetails, Role, RubricScores};
    use crate::repository::{AuditAction, ReviewRepository};

    fn reviewer(store: &InMemoryReviewStore, username: &str) -> User {
        store
            .insert_user(NewUser {
                username: username.to_string(),
                email: None,
                password_hash: "hash".to_string(),
                role: Role::Reviewer,
                is_active: true,
            })
            .expect("insert reviewer")
    }

    fn application(store: &InMemoryReviewStore, email: &str) -> Application {
        store
            .insert_application(NewApplication {
                details: ApplicantDetails {
                    full_name: "Casey Applicant".to_string(),
                    email: email.to_string(),
                    ..ApplicantDetails::default()
                },
                batch_id: None,
            })
            .expect("insert application")
    }

    fn review(application_id: ApplicationId, reviewer_id: UserId) -> NewReview {
        NewReview {
            application_id,
            reviewer_id,
            scores: RubricScores {
                initiative: 3,
                collaboration: 3,
                curiosity: 2,
                commitment: 4,
            },
            comments: None,
            started_at: None,
            submitted_at: Some(Utc::now()),
        }
    }

    #[test]
    fn duplicate_usernames_conflict() {
        let store = InMemoryReviewStore::new();
        reviewer(&store, "ana");
        let result = store.insert_user(NewUser {
            username: "ana".to_string(),
            email: None,
            password_hash: "hash".to_string(),
            role: Role::Admin,
            is_active: true,
        });
        assert_eq!(result, Err(RepositoryError::Conflict));
    }

    #[test]
    fn reviews_are_unique_per_reviewer_and_application() {
        let store = InMemoryReviewStore::new();
        let ana = reviewer(&store, "ana");
        let app = application(&store, "casey@example.edu");

        let stored = store.insert_review(review(app.id, ana.id)).expect("first");
        assert_eq!(stored.total_score, 12);
        assert_eq!(
            store.insert_review(review(app.id, ana.id)),
            Err(RepositoryError::Conflict)
        );
    }

    #[test]
    fn deleting_application_cascades() {
        let store = InMemoryReviewStore::new();
        let ana = reviewer(&store, "ana");
        let ben = reviewer(&store, "ben");
        let app = application(&store, "casey@example.edu");
        store.insert_review(review(app.id, ana.id)).expect("review");
        store
            .replace_assignments(vec![
                NewAssignment {
                    application_id: app.id,
                    reviewer_id: ana.id,
                },
                NewAssignment {
                    application_id: app.id,
                    reviewer_id: ben.id,
                },
            ])
            .expect("assign");

        store.delete_application(app.id).expect("delete");

        assert!(store.reviews().expect("reviews").is_empty());
        assert!(store.assignments().expect("assignments").is_empty());
        assert_eq!(
            store.delete_application(app.id),
            Err(RepositoryError::NotFound)
        );
    }

    #[test]
    fn replace_assignments_swaps_the_whole_collection() {
        let store = InMemoryReviewStore::new();
        let ana = reviewer(&store, "ana");
        let ben = reviewer(&store, "ben");
        let first = application(&store, "one@example.edu");
        let second = application(&store, "two@example.edu");

        store
            .replace_assignments(vec![NewAssignment {
                application_id: first.id,
                reviewer_id: ana.id,
            }])
            .expect("initial");
        let replaced = store
            .replace_assignments(vec![NewAssignment {
                application_id: second.id,
                reviewer_id: ben.id,
            }])
            .expect("replacement");

        let stored = store.assignments().expect("assignments");
        assert_eq!(stored, replaced);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].application_id, second.id);
    }

    #[test]
    fn rejected_replacement_keeps_previous_assignments() {
        let store = InMemoryReviewStore::new();
        let ana = reviewer(&store, "ana");
        let app = application(&store, "one@example.edu");
        let pair = NewAssignment {
            application_id: app.id,
            reviewer_id: ana.id,
        };
        store.replace_assignments(vec![pair]).expect("initial");

        assert_eq!(
            store.replace_assignments(vec![pair, pair]),
            Err(RepositoryError::Conflict)
        );
        assert_eq!(store.assignments().expect("assignments").len(), 1);
    }

    #[test]
    fn audit_entries_are_returned_newest_first() {
        let store = InMemoryReviewStore::new();
        store
            .append(AuditEvent::new(AuditAction::CreateUser, "user").entity(1))
            .expect("append");
        store
            .append(AuditEvent::new(AuditAction::DeleteUser, "user").entity(1))
            .expect("append");

        let recent = store.recent(1).expect("recent");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].event.action, AuditAction::DeleteUser);
    }
}
