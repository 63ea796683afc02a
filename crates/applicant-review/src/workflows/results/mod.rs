//! Ranked results over submitted reviews and their CSV export.

mod service;

pub use service::{ApplicationResult, ResultsService, ReviewerScore, EXPORT_HEADERS};

use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("failed to write export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish export: {0}")]
    Export(String),
    #[error("failed to fetch review data: {0}")]
    Repository(#[from] RepositoryError),
}
