//! JSON API over the review workflows.
//!
//! Callers identify themselves with the [`USER_HEADER`] header; admin-only routes answer
//! `403` to reviewers.

mod access;
mod accounts;
mod allocation;
mod analytics;
mod scoring;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub use access::USER_HEADER;

use crate::repository::{AuditLog, ReviewRepository};
use crate::workflows::ReviewServices;

/// Router builder exposing every review endpoint under `/api/v1`.
pub fn review_router<R, A>(services: Arc<ReviewServices<R, A>>) -> Router
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/allocations",
            post(allocation::allocate_handler::<R, A>)
                .get(allocation::allocations_handler::<R, A>),
        )
        .route(
            "/api/v1/assignments/mine",
            get(allocation::my_assignments_handler::<R, A>),
        )
        .route(
            "/api/v1/assignments/:assignment_id",
            put(allocation::reassign_handler::<R, A>),
        )
        .route(
            "/api/v1/analytics/reviewers",
            get(analytics::reviewer_analytics_handler::<R, A>),
        )
        .route(
            "/api/v1/analytics/distribution",
            get(analytics::distribution_handler::<R, A>),
        )
        .route(
            "/api/v1/analytics/outliers",
            get(analytics::outliers_handler::<R, A>),
        )
        .route(
            "/api/v1/analytics/overview",
            get(analytics::overview_handler::<R, A>),
        )
        .route(
            "/api/v1/applications/import",
            post(scoring::import_handler::<R, A>),
        )
        .route(
            "/api/v1/applications/stats",
            get(scoring::application_stats_handler::<R, A>),
        )
        .route(
            "/api/v1/applications/:application_id",
            delete(scoring::delete_application_handler::<R, A>),
        )
        .route(
            "/api/v1/applications/:application_id/archive",
            post(scoring::archive_handler::<R, A>),
        )
        .route(
            "/api/v1/applications/:application_id/reviews",
            get(scoring::application_reviews_handler::<R, A>),
        )
        .route("/api/v1/reviews", post(scoring::submit_review_handler::<R, A>))
        .route(
            "/api/v1/reviews/next",
            get(scoring::next_review_handler::<R, A>),
        )
        .route(
            "/api/v1/reviews/drafts",
            put(scoring::save_draft_handler::<R, A>),
        )
        .route(
            "/api/v1/reviews/:review_id",
            put(scoring::correct_review_handler::<R, A>),
        )
        .route("/api/v1/results", get(scoring::results_handler::<R, A>))
        .route(
            "/api/v1/results/export",
            get(scoring::export_handler::<R, A>),
        )
        .route(
            "/api/v1/users",
            get(accounts::list_users_handler::<R, A>).post(accounts::create_user_handler::<R, A>),
        )
        .route(
            "/api/v1/users/:user_id",
            put(accounts::update_user_handler::<R, A>)
                .delete(accounts::delete_user_handler::<R, A>),
        )
        .route(
            "/api/v1/users/:user_id/reset-password",
            post(accounts::reset_password_handler::<R, A>),
        )
        .route(
            "/api/v1/session/verify",
            post(accounts::verify_session_handler::<R, A>),
        )
        .route("/api/v1/audit", get(accounts::audit_handler::<R, A>))
        .with_state(services)
}
