use crate::config::ConfigError;
use crate::domain::Role;
use crate::repository::AuditError;
use crate::telemetry::TelemetryError;
use crate::workflows::allocation::AllocationError;
use crate::workflows::analytics::AnalyticsError;
use crate::workflows::intake::IntakeError;
use crate::workflows::results::ResultsError;
use crate::workflows::reviews::ReviewError;
use crate::workflows::users::UserError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Allocation(AllocationError),
    Analytics(AnalyticsError),
    Intake(IntakeError),
    Review(ReviewError),
    Results(ResultsError),
    User(UserError),
    Audit(AuditError),
    Unauthenticated,
    Forbidden { required: Role },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Allocation(err) => match err {
                AllocationError::InsufficientReviewers { .. }
                | AllocationError::NoApplications
                | AllocationError::DuplicateReviewerForApplication { .. } => StatusCode::CONFLICT,
                AllocationError::AssignmentNotFound(_) | AllocationError::ReviewerNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AllocationError::DataFetchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Intake(err) => match err {
                IntakeError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,
                IntakeError::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
                IntakeError::Io(_) | IntakeError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Review(err) => match err {
                ReviewError::InvalidScore { .. } | ReviewError::StartedInFuture => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ReviewError::NotAssigned(_) => StatusCode::FORBIDDEN,
                ReviewError::ApplicationNotFound(_) | ReviewError::ReviewNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                ReviewError::ApplicationArchived(_) | ReviewError::AlreadyReviewed(_) => {
                    StatusCode::CONFLICT
                }
                ReviewError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::User(err) => match err {
                UserError::InvalidUsername
                | UserError::InvalidEmail(_)
                | UserError::WeakPassword { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                UserError::UsernameTaken(_) | UserError::CannotDeleteSelf => StatusCode::CONFLICT,
                UserError::UserNotFound(_) => StatusCode::NOT_FOUND,
                UserError::Hash(_) | UserError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Analytics(_)
            | AppError::Results(_)
            | AppError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Allocation(err) => write!(f, "{}", err),
            AppError::Analytics(err) => write!(f, "{}", err),
            AppError::Intake(err) => write!(f, "{}", err),
            AppError::Review(err) => write!(f, "{}", err),
            AppError::Results(err) => write!(f, "{}", err),
            AppError::User(err) => write!(f, "{}", err),
            AppError::Audit(err) => write!(f, "{}", err),
            AppError::Unauthenticated => write!(f, "a valid x-user-id header is required"),
            AppError::Forbidden { required } => {
                write!(f, "this action requires the {} role", required.label())
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Allocation(err) => Some(err),
            AppError::Analytics(err) => Some(err),
            AppError::Intake(err) => Some(err),
            AppError::Review(err) => Some(err),
            AppError::Results(err) => Some(err),
            AppError::User(err) => Some(err),
            AppError::Audit(err) => Some(err),
            AppError::Unauthenticated | AppError::Forbidden { .. } => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

macro_rules! app_error_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

app_error_from! {
    ConfigError => Config,
    TelemetryError => Telemetry,
    std::io::Error => Io,
    axum::Error => Server,
    AllocationError => Allocation,
    AnalyticsError => Analytics,
    IntakeError => Intake,
    ReviewError => Review,
    ResultsError => Results,
    UserError => User,
    AuditError => Audit,
}
