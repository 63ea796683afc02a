use serde::Serialize;

use crate::domain::{ApplicationId, UserId};

/// Per-reviewer scoring behaviour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewerPerformance {
    pub reviewer_id: UserId,
    pub username: String,
    pub total_reviews: usize,
    pub average_score: f64,
    pub average_time_minutes: f64,
    /// 0..=100, higher means the reviewer's own totals cluster tightly.
    pub consistency: u8,
    pub is_active: bool,
}

/// One histogram row; scores nobody gave are absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBucket {
    pub total_score: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReview {
    pub application_id: ApplicationId,
    pub applicant_name: String,
    pub reviewer_name: String,
    pub score: i32,
    pub other_scores: Vec<i32>,
    pub deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub total_applications: usize,
    pub total_reviews: usize,
    pub fully_reviewed: usize,
    pub active_reviewers: usize,
}
