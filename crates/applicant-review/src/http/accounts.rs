use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::access::require_admin;
use crate::domain::UserId;
use crate::error::AppError;
use crate::repository::{AuditLog, ReviewRepository};
use crate::workflows::users::{NewUserInput, UserPatch};
use crate::workflows::ReviewServices;

/// Entries returned by the audit endpoint.
pub(crate) const AUDIT_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub(crate) struct Credentials {
    pub username: String,
    pub password: String,
}

pub(crate) async fn list_users_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.users.list()?).into_response())
}

pub(crate) async fn create_user_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Json(input): Json<NewUserInput>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let created = services.users.create(Some(admin.id), input)?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub(crate) async fn update_user_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
    Json(patch): Json<UserPatch>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let user = services
        .users
        .update(Some(admin.id), UserId(user_id), patch)?;
    Ok(Json(user).into_response())
}

pub(crate) async fn delete_user_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    services.users.delete(admin.id, UserId(user_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn reset_password_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let admin = require_admin(&services, &headers)?;
    let password = services
        .users
        .reset_password(Some(admin.id), UserId(user_id))?;
    Ok(Json(json!({ "generated_password": password })).into_response())
}

/// Mismatches share one response so usernames cannot be probed.
pub(crate) async fn verify_session_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    match services
        .users
        .verify_credentials(&credentials.username, &credentials.password)?
    {
        Some(user) => Ok(Json(user).into_response()),
        None => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid username or password" })),
        )
            .into_response()),
    }
}

pub(crate) async fn audit_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.audit.recent(AUDIT_PAGE_SIZE)?).into_response())
}
