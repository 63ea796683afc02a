use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};

use super::access::require_admin;
use crate::error::AppError;
use crate::repository::{AuditLog, ReviewRepository};
use crate::workflows::ReviewServices;

pub(crate) async fn reviewer_analytics_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.analytics.reviewer_analytics()?).into_response())
}

pub(crate) async fn distribution_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.analytics.score_distribution()?).into_response())
}

pub(crate) async fn outliers_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.analytics.outlier_reviews()?).into_response())
}

pub(crate) async fn overview_handler<R, A>(
    State(services): State<Arc<ReviewServices<R, A>>>,
    headers: HeaderMap,
) -> Result<Response, AppError>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    require_admin(&services, &headers)?;
    Ok(Json(services.analytics.overall_stats()?).into_response())
}
