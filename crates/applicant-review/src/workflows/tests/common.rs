use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::domain::{
    ApplicantDetails, Application, ApplicationId, Assignment, AssignmentId, DraftReview,
    NewApplication, NewAssignment, NewReview, NewUser, Review, ReviewId, Role, RubricScores, User,
    UserId,
};
use crate::http::{review_router, USER_HEADER};
use crate::repository::{
    AuditEntry, AuditError, AuditEvent, AuditLog, InMemoryReviewStore, RepositoryError,
    ReviewRepository,
};
use crate::workflows::ReviewServices;

pub(super) type MemoryServices = ReviewServices<InMemoryReviewStore, InMemoryReviewStore>;

pub(super) struct Fixture {
    pub store: Arc<InMemoryReviewStore>,
    pub services: Arc<MemoryServices>,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryReviewStore::new());
        let services = Arc::new(ReviewServices::new(store.clone(), store.clone()));
        Self { store, services }
    }

    /// Fixture with `reviewers` active reviewers and `applications` open applications.
    pub fn seeded(reviewers: usize, applications: usize) -> Self {
        let fixture = Self::new();
        for index in 0..reviewers {
            fixture.reviewer(&format!("reviewer{index}"));
        }
        for index in 0..applications {
            fixture.application(&format!("Applicant {index}"));
        }
        fixture
    }

    pub fn router(&self) -> axum::Router {
        review_router(self.services.clone())
    }

    pub fn admin(&self, username: &str) -> User {
        self.user(username, Role::Admin, true)
    }

    pub fn reviewer(&self, username: &str) -> User {
        self.user(username, Role::Reviewer, true)
    }

    /// Accounts inserted straight into the store skip password hashing.
    pub fn user(&self, username: &str, role: Role, is_active: bool) -> User {
        self.store
            .insert_user(NewUser {
                username: username.to_string(),
                email: None,
                password_hash: "not-a-real-hash".to_string(),
                role,
                is_active,
            })
            .expect("insert user")
    }

    pub fn application(&self, full_name: &str) -> Application {
        let email = format!("{}@example.edu", full_name.to_lowercase().replace(' ', "."));
        self.store
            .insert_application(NewApplication {
                details: ApplicantDetails {
                    full_name: full_name.to_string(),
                    email,
                    major: Some("Computer Science".to_string()),
                    class_standing: Some("Junior".to_string()),
                    ..ApplicantDetails::default()
                },
                batch_id: Some("batch_fixture".to_string()),
            })
            .expect("insert application")
    }

    pub fn assign(&self, pairs: &[(ApplicationId, UserId)]) -> Vec<Assignment> {
        self.store
            .replace_assignments(
                pairs
                    .iter()
                    .map(|(application_id, reviewer_id)| NewAssignment {
                        application_id: *application_id,
                        reviewer_id: *reviewer_id,
                    })
                    .collect(),
            )
            .expect("replace assignments")
    }

    /// Store a review whose four dimensions add up to `total` (4..=16).
    pub fn review(&self, application_id: ApplicationId, reviewer_id: UserId, total: i32) -> Review {
        self.store
            .insert_review(NewReview {
                application_id,
                reviewer_id,
                scores: scores_for_total(total),
                comments: None,
                started_at: Some(Utc::now() - Duration::minutes(10)),
                submitted_at: Some(Utc::now()),
            })
            .expect("insert review")
    }

    pub fn audit_actions(&self) -> Vec<&'static str> {
        self.store
            .recent(usize::MAX)
            .expect("audit entries")
            .into_iter()
            .map(|entry| entry.event.action.label())
            .collect()
    }
}

pub(super) fn scores(
    initiative: u8,
    collaboration: u8,
    curiosity: u8,
    commitment: u8,
) -> RubricScores {
    RubricScores {
        initiative,
        collaboration,
        curiosity,
        commitment,
    }
}

/// Spread `total` over the four dimensions, filling from the first.
pub(super) fn scores_for_total(total: i32) -> RubricScores {
    assert!((4..=16).contains(&total), "rubric totals run from 4 to 16");
    let mut remaining = total - 4;
    let mut dims = [1u8; 4];
    for dim in dims.iter_mut() {
        let extra = remaining.min(3);
        *dim += extra as u8;
        remaining -= extra;
    }
    scores(dims[0], dims[1], dims[2], dims[3])
}

pub(super) fn request(method: Method, uri: &str, user: Option<UserId>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user.to_string());
    }
    builder.body(body).expect("request")
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    user: Option<UserId>,
    payload: &Value,
) -> Request<Body> {
    request(
        method,
        uri,
        user,
        Body::from(serde_json::to_vec(payload).expect("json payload")),
    )
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}

/// Repository whose every call reports the backing store as down.
pub(super) struct UnavailableRepository;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("store offline".to_string()))
}

impl ReviewRepository for UnavailableRepository {
    fn insert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
        unavailable()
    }

    fn update_user(&self, _user: User) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn delete_user(&self, _id: UserId) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn fetch_user(&self, _id: UserId) -> Result<Option<User>, RepositoryError> {
        unavailable()
    }

    fn find_user_by_username(&self, _username: &str) -> Result<Option<User>, RepositoryError> {
        unavailable()
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        unavailable()
    }

    fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        unavailable()
    }

    fn update_application(&self, _application: Application) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn delete_application(&self, _id: ApplicationId) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn fetch_application(
        &self,
        _id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        unavailable()
    }

    fn find_application_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<Application>, RepositoryError> {
        unavailable()
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        unavailable()
    }

    fn replace_assignments(
        &self,
        _assignments: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        unavailable()
    }

    fn fetch_assignment(&self, _id: AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        unavailable()
    }

    fn update_assignment_reviewer(
        &self,
        _id: AssignmentId,
        _reviewer_id: UserId,
    ) -> Result<Assignment, RepositoryError> {
        unavailable()
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        unavailable()
    }

    fn insert_review(&self, _review: NewReview) -> Result<Review, RepositoryError> {
        unavailable()
    }

    fn update_review(&self, _review: Review) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn fetch_review(&self, _id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        unavailable()
    }

    fn reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        unavailable()
    }

    fn upsert_draft(&self, _draft: DraftReview) -> Result<DraftReview, RepositoryError> {
        unavailable()
    }

    fn draft_for_reviewer(
        &self,
        _reviewer_id: UserId,
    ) -> Result<Option<DraftReview>, RepositoryError> {
        unavailable()
    }

    fn delete_draft(
        &self,
        _application_id: ApplicationId,
        _reviewer_id: UserId,
    ) -> Result<(), RepositoryError> {
        unavailable()
    }
}

/// Audit log that rejects every append.
#[derive(Default)]
pub(super) struct RejectingAudit;

impl AuditLog for RejectingAudit {
    fn append(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("audit offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        Err(AuditError::Unavailable("audit offline".to_string()))
    }
}
