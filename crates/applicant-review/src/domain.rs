use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier wrapper for user accounts.
    UserId
);
record_id!(
    /// Identifier wrapper for uploaded applications.
    ApplicationId
);
record_id!(
    /// Identifier wrapper for submitted reviews.
    ReviewId
);
record_id!(
    /// Identifier wrapper for reviewer assignments.
    AssignmentId
);

/// Reviewers score; admins run rounds and see everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Reviewer,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reviewer => "reviewer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Only active reviewers take part in allocation.
    pub fn is_active_reviewer(&self) -> bool {
        self.role == Role::Reviewer && self.is_active
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

/// Applicant row as imported from the form export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    #[serde(flatten)]
    pub details: ApplicantDetails,
    pub uploaded_at: DateTime<Utc>,
    pub batch_id: Option<String>,
    pub is_archived: bool,
}

/// Applicant-provided fields; everything but the name and email is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub full_name: String,
    pub email: String,
    pub submitted_timestamp: Option<String>,
    pub major: Option<String>,
    pub class_standing: Option<String>,
    pub friday_availability: Option<String>,
    pub resume_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub responses: [Option<String>; 5],
    pub anything_else: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub details: ApplicantDetails,
    pub batch_id: Option<String>,
}

pub const RUBRIC_MIN: u8 = 1;
pub const RUBRIC_MAX: u8 = 4;

/// Four rubric dimensions, each scored `RUBRIC_MIN..=RUBRIC_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScores {
    pub initiative: u8,
    pub collaboration: u8,
    pub curiosity: u8,
    pub commitment: u8,
}

impl RubricScores {
    pub fn total(&self) -> i32 {
        [
            self.initiative,
            self.collaboration,
            self.curiosity,
            self.commitment,
        ]
        .iter()
        .map(|score| i32::from(*score))
        .sum()
    }

    /// Returns the name of the first dimension outside the rubric range.
    pub fn out_of_range(&self) -> Option<&'static str> {
        self.dimensions()
            .into_iter()
            .find(|(_, score)| !(RUBRIC_MIN..=RUBRIC_MAX).contains(score))
            .map(|(name, _)| name)
    }

    fn dimensions(&self) -> [(&'static str, u8); 4] {
        [
            ("initiative", self.initiative),
            ("collaboration", self.collaboration),
            ("curiosity", self.curiosity),
            ("commitment", self.commitment),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub application_id: ApplicationId,
    pub reviewer_id: UserId,
    pub scores: RubricScores,
    pub total_score: i32,
    pub comments: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Minutes between opening and submitting, when both ends were recorded.
    pub fn duration_minutes(&self) -> Option<f64> {
        match (self.started_at, self.submitted_at) {
            (Some(started), Some(submitted)) => {
                Some((submitted - started).num_milliseconds() as f64 / 60_000.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub application_id: ApplicationId,
    pub reviewer_id: UserId,
    pub scores: RubricScores,
    pub comments: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Partially completed rubric kept between visits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReview {
    pub application_id: ApplicationId,
    /// Taken from the session, never from the request body.
    #[serde(default)]
    pub reviewer_id: UserId,
    pub initiative: Option<u8>,
    pub collaboration: Option<u8>,
    pub curiosity: Option<u8>,
    pub commitment: Option<u8>,
    pub comments: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub application_id: ApplicationId,
    pub reviewer_id: UserId,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewAssignment {
    pub application_id: ApplicationId,
    pub reviewer_id: UserId,
}
