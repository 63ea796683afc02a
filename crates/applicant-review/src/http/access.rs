use axum::http::HeaderMap;

use crate::domain::{Role, User, UserId};
use crate::error::AppError;
use crate::repository::{AuditLog, ReviewRepository};
use crate::workflows::users::UserError;
use crate::workflows::ReviewServices;

/// Header carrying the authenticated user's id, set by the session layer in front of us.
pub const USER_HEADER: &str = "x-user-id";

/// Resolve the calling user; unknown and deactivated accounts are unauthenticated.
pub(crate) fn current_user<R, A>(
    services: &ReviewServices<R, A>,
    headers: &HeaderMap,
) -> Result<User, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let id = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or(AppError::Unauthenticated)?;

    match services.users.fetch(UserId(id)) {
        Ok(user) if user.is_active => Ok(user),
        Ok(_) | Err(UserError::UserNotFound(_)) => Err(AppError::Unauthenticated),
        Err(other) => Err(other.into()),
    }
}

pub(crate) fn require_admin<R, A>(
    services: &ReviewServices<R, A>,
    headers: &HeaderMap,
) -> Result<User, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    let user = current_user(services, headers)?;
    if user.role != Role::Admin {
        return Err(AppError::Forbidden {
            required: Role::Admin,
        });
    }
    Ok(user)
}
