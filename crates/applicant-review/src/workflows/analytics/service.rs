use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::stats::{self, MIN_OUTLIER_SPREAD};
use super::views::{OutlierReview, OverallStats, ReviewerPerformance, ScoreBucket};
use super::AnalyticsError;
use crate::domain::{Review, Role, User, UserId};
use crate::repository::{ApplicationWithReviews, ReviewRepository};

/// Stateless aggregation over the review collection.
pub struct AnalyticsService<R> {
    repository: Arc<R>,
}

impl<R> AnalyticsService<R>
where
    R: ReviewRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// One row per reviewer account, including those with no reviews yet.
    pub fn reviewer_analytics(&self) -> Result<Vec<ReviewerPerformance>, AnalyticsError> {
        let mut by_reviewer: HashMap<UserId, Vec<Review>> = HashMap::new();
        for review in self.repository.reviews()? {
            by_reviewer.entry(review.reviewer_id).or_default().push(review);
        }

        Ok(self
            .repository
            .users()?
            .into_iter()
            .filter(|user| user.role == Role::Reviewer)
            .map(|user| {
                let reviews = by_reviewer.remove(&user.id).unwrap_or_default();
                reviewer_performance(user, &reviews)
            })
            .collect())
    }

    /// Frequency of each exact total score, ascending by score.
    pub fn score_distribution(&self) -> Result<Vec<ScoreBucket>, AnalyticsError> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for review in self.repository.reviews()? {
            *counts.entry(review.total_score).or_insert(0) += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(total_score, count)| ScoreBucket { total_score, count })
            .collect())
    }

    /// Reviews sitting more than two standard deviations from their application's mean,
    /// largest deviation first.
    pub fn outlier_reviews(&self) -> Result<Vec<OutlierReview>, AnalyticsError> {
        let mut outliers: Vec<OutlierReview> = self
            .repository
            .applications_with_reviews(false)?
            .iter()
            .flat_map(application_outliers)
            .collect();

        outliers.sort_by(|a, b| b.deviation.total_cmp(&a.deviation));
        Ok(outliers)
    }

    pub fn overall_stats(&self) -> Result<OverallStats, AnalyticsError> {
        let open = self.repository.open_applications()?;
        let reviews = self.repository.reviews()?;

        let mut per_application: HashMap<_, usize> = HashMap::new();
        for review in &reviews {
            *per_application.entry(review.application_id).or_insert(0) += 1;
        }

        Ok(OverallStats {
            total_applications: open.len(),
            total_reviews: reviews.len(),
            fully_reviewed: per_application.values().filter(|count| **count >= 2).count(),
            active_reviewers: self.repository.active_reviewers()?.len(),
        })
    }
}

fn reviewer_performance(user: User, reviews: &[Review]) -> ReviewerPerformance {
    if reviews.is_empty() {
        return ReviewerPerformance {
            reviewer_id: user.id,
            username: user.username,
            total_reviews: 0,
            average_score: 0.0,
            average_time_minutes: 0.0,
            consistency: 0,
            is_active: user.is_active,
        };
    }

    let scores: Vec<i32> = reviews.iter().map(|review| review.total_score).collect();
    let timed: Vec<f64> = reviews.iter().filter_map(Review::duration_minutes).collect();
    let average_time = if timed.is_empty() {
        0.0
    } else {
        timed.iter().sum::<f64>() / timed.len() as f64
    };

    ReviewerPerformance {
        reviewer_id: user.id,
        username: user.username,
        total_reviews: reviews.len(),
        average_score: stats::round_to(stats::mean(&scores), 2),
        average_time_minutes: stats::round_to(average_time, 1),
        consistency: stats::consistency_score(&scores),
        is_active: user.is_active,
    }
}

fn application_outliers(entry: &ApplicationWithReviews) -> Vec<OutlierReview> {
    if entry.reviews.len() < 2 {
        return Vec::new();
    }

    let scores: Vec<i32> = entry
        .reviews
        .iter()
        .map(|joined| joined.review.total_score)
        .collect();
    let mean = stats::mean(&scores);
    let std_dev = stats::population_std_dev(&scores);
    if std_dev < MIN_OUTLIER_SPREAD {
        return Vec::new();
    }

    entry
        .reviews
        .iter()
        .filter(|joined| stats::is_outlier(joined.review.total_score, mean, std_dev))
        .map(|flagged| OutlierReview {
            application_id: entry.application.id,
            applicant_name: entry.application.details.full_name.clone(),
            reviewer_name: flagged.reviewer_name.clone(),
            score: flagged.review.total_score,
            other_scores: entry
                .reviews
                .iter()
                .filter(|other| other.review.id != flagged.review.id)
                .map(|other| other.review.total_score)
                .collect(),
            deviation: (f64::from(flagged.review.total_score) - mean).abs(),
        })
        .collect()
}
