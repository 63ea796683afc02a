//! Read-only scoring analytics: reviewer behaviour, score histogram, outlier reviews.

mod service;
pub mod stats;
mod views;

pub use service::AnalyticsService;
pub use views::{OutlierReview, OverallStats, ReviewerPerformance, ScoreBucket};

use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("failed to fetch review data: {0}")]
    DataFetchFailed(#[from] RepositoryError),
}
