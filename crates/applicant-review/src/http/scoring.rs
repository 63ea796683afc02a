use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::access::{current_user, require_admin};
use crate::domain::{ApplicationId, DraftReview, ReviewId, RubricScores};
use crate::error::AppError;
use crate::repository::{AuditLog, ReviewRepository};
use crate::workflows::reviews::ReviewSubmission;
use crate::workflows::ReviewServices;

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewCorrection {
    pub scores: RubricScores,
    #[serde(default)]
    pub comments: Option<String>,
}

/// The request body is the raw CSV export.
pub(crate) async fn import_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let report = services
        .intake
        .import_csv(Some(admin.id), body.as_bytes())?;
    Ok(Json(report).into_response())
}

pub(crate) async fn application_stats_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.intake.application_stats()?).into_response())
}

pub(crate) async fn archive_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    services
        .intake
        .archive(Some(admin.id), ApplicationId(application_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn delete_application_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    services
        .intake
        .delete(Some(admin.id), ApplicationId(application_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn application_reviews_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    let reviews = services
        .reviews
        .reviews_for_application(ApplicationId(application_id))?;
    Ok(Json(reviews).into_response())
}

/// `null` once the reviewer's queue is done.
pub(crate) async fn next_review_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(&services, &headers)?;
    Ok(Json(services.reviews.next_for_reviewer(user.id)?).into_response())
}

pub(crate) async fn submit_review_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Json(submission): Json<ReviewSubmission>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(&services, &headers)?;
    let review = services.reviews.submit(user.id, submission)?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

pub(crate) async fn save_draft_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Json(draft): Json<DraftReview>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(&services, &headers)?;
    Ok(Json(services.reviews.save_draft(user.id, draft)?).into_response())
}

pub(crate) async fn correct_review_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(review_id): Path<u64>,
    Json(correction): Json<ReviewCorrection>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let review = services.reviews.update(
        Some(admin.id),
        ReviewId(review_id),
        correction.scores,
        correction.comments,
    )?;
    Ok(Json(review).into_response())
}

pub(crate) async fn results_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(&services, &headers)?;
    Ok(Json(services.results.ranked(user.role)?).into_response())
}

pub(crate) async fn export_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(&services, &headers)?;
    let body = services.results.export_csv(Some(user.id), user.role)?;
    Ok((
        [(header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string())],
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"results.csv\"",
        )],
        body,
    )
        .into_response())
}
