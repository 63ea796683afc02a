use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::ResultsError;
use crate::domain::{ApplicationId, Review, Role, UserId};
use crate::repository::{
    ApplicationWithReviews, AuditAction, AuditEvent, AuditLog, ReviewRepository,
};
use crate::workflows::analytics::stats;
use crate::workflows::record_audit;

/// Reviewers only see applications that have been scored this many times.
const REVIEWER_VISIBLE_REVIEWS: usize = 2;

pub const EXPORT_HEADERS: [&str; 12] = [
    "Rank",
    "Full Name",
    "Email",
    "Major",
    "Class Standing",
    "Review Count",
    "Avg Initiative",
    "Avg Collaboration",
    "Avg Curiosity",
    "Avg Commitment",
    "Avg Total",
    "Reviewer Scores",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewerScore {
    pub reviewer_name: String,
    pub total_score: i32,
}

/// One ranked application with its averaged rubric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationResult {
    pub rank: usize,
    pub application_id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub major: Option<String>,
    pub class_standing: Option<String>,
    pub review_count: usize,
    pub avg_initiative: f64,
    pub avg_collaboration: f64,
    pub avg_curiosity: f64,
    pub avg_commitment: f64,
    pub avg_total: f64,
    pub percentile: u8,
    pub reviewer_scores: Vec<ReviewerScore>,
}

pub struct ResultsService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

impl<R, A> ResultsService<R, A>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    /// Open applications ranked by average total, unreviewed ones last.
    pub fn ranked(&self, viewer: Role) -> Result<Vec<ApplicationResult>, ResultsError> {
        let mut results: Vec<ApplicationResult> = self
            .repository
            .applications_with_reviews(false)?
            .into_iter()
            .filter(|entry| {
                viewer == Role::Admin || entry.reviews.len() >= REVIEWER_VISIBLE_REVIEWS
            })
            .map(summarize)
            .collect();

        results.sort_by(|a, b| match (a.review_count, b.review_count) {
            (0, 0) => Ordering::Equal,
            (0, _) => Ordering::Greater,
            (_, 0) => Ordering::Less,
            _ => b.avg_total.total_cmp(&a.avg_total),
        });

        let scored: Vec<f64> = results
            .iter()
            .filter(|result| result.review_count > 0)
            .map(|result| result.avg_total)
            .collect();
        for (index, result) in results.iter_mut().enumerate() {
            result.rank = index + 1;
            if result.review_count > 0 {
                result.percentile = stats::percentile(result.avg_total, &scored);
            }
        }

        Ok(results)
    }

    /// Render the ranking as CSV text.
    pub fn export_csv(&self, actor: Option<UserId>, viewer: Role) -> Result<String, ResultsError> {
        let results = self.ranked(viewer)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADERS)?;
        for result in &results {
            let reviewer_scores = result
                .reviewer_scores
                .iter()
                .map(|score| format!("{}:{}", score.reviewer_name, score.total_score))
                .collect::<Vec<_>>()
                .join("; ");
            writer.write_record([
                result.rank.to_string(),
                result.full_name.clone(),
                result.email.clone(),
                result.major.clone().unwrap_or_default(),
                result.class_standing.clone().unwrap_or_default(),
                result.review_count.to_string(),
                format!("{:.2}", result.avg_initiative),
                format!("{:.2}", result.avg_collaboration),
                format!("{:.2}", result.avg_curiosity),
                format!("{:.2}", result.avg_commitment),
                format!("{:.2}", result.avg_total),
                reviewer_scores,
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| ResultsError::Export(err.to_string()))?;
        let body = String::from_utf8(bytes).map_err(|err| ResultsError::Export(err.to_string()))?;

        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::ExportResults, "application")
                .by(actor)
                .metadata(json!({ "count": results.len() })),
        );
        info!(rows = results.len(), "exported results");

        Ok(body)
    }
}

fn summarize(entry: ApplicationWithReviews) -> ApplicationResult {
    let reviews = &entry.reviews;
    let average = |pick: fn(&Review) -> i32| -> f64 {
        let values: Vec<i32> = reviews.iter().map(|joined| pick(&joined.review)).collect();
        stats::round_to(stats::mean(&values), 2)
    };

    let details = &entry.application.details;
    ApplicationResult {
        rank: 0,
        application_id: entry.application.id,
        full_name: details.full_name.clone(),
        email: details.email.clone(),
        major: details.major.clone(),
        class_standing: details.class_standing.clone(),
        review_count: reviews.len(),
        avg_initiative: average(|review| i32::from(review.scores.initiative)),
        avg_collaboration: average(|review| i32::from(review.scores.collaboration)),
        avg_curiosity: average(|review| i32::from(review.scores.curiosity)),
        avg_commitment: average(|review| i32::from(review.scores.commitment)),
        avg_total: average(|review| review.total_score),
        percentile: 0,
        reviewer_scores: reviews
            .iter()
            .map(|joined| ReviewerScore {
                reviewer_name: joined.reviewer_name.clone(),
                total_score: joined.review.total_score,
            })
            .collect(),
    }
}
