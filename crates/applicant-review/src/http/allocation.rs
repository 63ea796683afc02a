use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::access::{current_user, require_admin};
use crate::domain::{AssignmentId, UserId};
use crate::error::AppError;
use crate::repository::{AuditLog, ReviewRepository};
use crate::workflows::ReviewServices;

#[derive(Debug, Deserialize)]
pub(crate) struct ReassignRequest {
    pub reviewer_id: UserId,
}

pub(crate) async fn allocate_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let summary = services.allocation.allocate(Some(admin.id))?;
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

pub(crate) async fn allocations_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.allocation.allocations()?).into_response())
}

pub(crate) async fn reassign_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(assignment_id): Path<u64>,
    Json(request): Json<ReassignRequest>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let assignment = services.allocation.reassign(
        Some(admin.id),
        AssignmentId(assignment_id),
        request.reviewer_id,
    )?;
    Ok(Json(assignment).into_response())
}

pub(crate) async fn my_assignments_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(&services, &headers)?;
    Ok(Json(services.allocation.assignment_progress(user.id)?).into_response())
}
