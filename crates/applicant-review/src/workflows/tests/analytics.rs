use std::sync::Arc;

use super::common::*;
use crate::domain::{ApplicationId, Role};
use crate::workflows::analytics::{AnalyticsError, AnalyticsService, ScoreBucket};

/// One application scored by `totals.len()` distinct reviewers.
fn scored_application(fixture: &Fixture, name: &str, totals: &[i32]) -> ApplicationId {
    let application = fixture.application(name);
    for (index, total) in totals.iter().enumerate() {
        let username = format!("{}-r{index}", name.to_lowercase().replace(' ', "-"));
        let reviewer = fixture.reviewer(&username);
        fixture.review(application.id, reviewer.id, *total);
    }
    application.id
}

#[test]
fn lone_low_score_among_agreeing_reviewers_is_flagged() {
    let fixture = Fixture::new();
    let application_id = scored_application(&fixture, "Grace Hopper", &[10, 10, 10, 10, 10, 4]);

    let outliers = fixture
        .services
        .analytics
        .outlier_reviews()
        .expect("outliers");

    // mean 9, sigma ~2.236, bar ~4.47; the 4 sits 5 away.
    assert_eq!(outliers.len(), 1);
    let outlier = &outliers[0];
    assert_eq!(outlier.application_id, application_id);
    assert_eq!(outlier.score, 4);
    assert_eq!(outlier.other_scores, vec![10, 10, 10, 10, 10]);
    assert!((outlier.deviation - 5.0).abs() < 1e-9);
    assert_eq!(outlier.reviewer_name, "grace-hopper-r5");
}

#[test]
fn four_reviews_with_one_dissent_stay_under_the_bar() {
    let fixture = Fixture::new();
    scored_application(&fixture, "Alan Turing", &[16, 16, 16, 4]);

    // mean 13, sigma ~5.196, bar ~10.39; the 4 sits 9 away.
    let outliers = fixture
        .services
        .analytics
        .outlier_reviews()
        .expect("outliers");
    assert!(outliers.is_empty());
}

#[test]
fn tight_scores_are_never_scanned() {
    let fixture = Fixture::new();
    scored_application(&fixture, "Katherine Johnson", &[12, 12, 12, 12, 12, 12, 12, 9]);

    // sigma ~0.99 is under the minimum spread.
    let outliers = fixture
        .services
        .analytics
        .outlier_reviews()
        .expect("outliers");
    assert!(outliers.is_empty());
}

#[test]
fn two_reviews_can_never_be_outliers() {
    let fixture = Fixture::new();
    scored_application(&fixture, "Edsger Dijkstra", &[4, 16]);

    let outliers = fixture
        .services
        .analytics
        .outlier_reviews()
        .expect("outliers");
    assert!(outliers.is_empty());
}

#[test]
fn outliers_on_archived_applications_are_ignored() {
    let fixture = Fixture::new();
    let application_id = scored_application(&fixture, "Grace Hopper", &[10, 10, 10, 10, 10, 4]);
    fixture
        .services
        .intake
        .archive(None, application_id)
        .expect("archive");

    assert!(fixture
        .services
        .analytics
        .outlier_reviews()
        .expect("outliers")
        .is_empty());
}

#[test]
fn outliers_are_sorted_by_deviation_descending() {
    let fixture = Fixture::new();
    scored_application(&fixture, "Grace Hopper", &[10, 10, 10, 10, 10, 4]);
    scored_application(&fixture, "Barbara Liskov", &[14, 14, 14, 14, 14, 14, 14, 6]);

    let outliers = fixture
        .services
        .analytics
        .outlier_reviews()
        .expect("outliers");
    assert_eq!(outliers.len(), 2);
    assert_eq!(outliers[0].applicant_name, "Barbara Liskov");
    assert!(outliers[0].deviation > outliers[1].deviation);
}

#[test]
fn score_distribution_counts_each_total_in_ascending_order() {
    let fixture = Fixture::new();
    scored_application(&fixture, "First Applicant", &[12, 8]);
    scored_application(&fixture, "Second Applicant", &[12, 16, 8, 12]);

    let buckets = fixture
        .services
        .analytics
        .score_distribution()
        .expect("distribution");
    assert_eq!(
        buckets,
        vec![
            ScoreBucket {
                total_score: 8,
                count: 2
            },
            ScoreBucket {
                total_score: 12,
                count: 3
            },
            ScoreBucket {
                total_score: 16,
                count: 1
            },
        ]
    );
}

#[test]
fn reviewer_analytics_cover_every_reviewer_account() {
    let fixture = Fixture::new();
    let busy = fixture.reviewer("busy");
    let idle = fixture.reviewer("idle");
    let dormant = fixture.user("dormant", Role::Reviewer, false);
    fixture.admin("chair");
    let first = fixture.application("First Applicant");
    let second = fixture.application("Second Applicant");
    let third = fixture.application("Third Applicant");
    fixture.review(first.id, busy.id, 10);
    fixture.review(second.id, busy.id, 12);
    fixture.review(third.id, busy.id, 15);

    let analytics = fixture
        .services
        .analytics
        .reviewer_analytics()
        .expect("analytics");
    assert_eq!(analytics.len(), 3);

    let busy_row = analytics
        .iter()
        .find(|row| row.reviewer_id == busy.id)
        .expect("busy row");
    assert_eq!(busy_row.total_reviews, 3);
    assert_eq!(busy_row.average_score, 12.33);
    assert_eq!(busy_row.average_time_minutes, 10.0);
    // sigma of [10, 12, 15] is ~2.055.
    assert_eq!(busy_row.consistency, 79);

    let idle_row = analytics
        .iter()
        .find(|row| row.reviewer_id == idle.id)
        .expect("idle row");
    assert_eq!(idle_row.total_reviews, 0);
    assert_eq!(idle_row.average_score, 0.0);
    assert_eq!(idle_row.consistency, 0);

    let dormant_row = analytics
        .iter()
        .find(|row| row.reviewer_id == dormant.id)
        .expect("dormant row");
    assert!(!dormant_row.is_active);
}

#[test]
fn overall_stats_count_open_applications_and_full_coverage() {
    let fixture = Fixture::new();
    let first = fixture.reviewer("first");
    let second = fixture.reviewer("second");
    let covered = fixture.application("Covered Applicant");
    let partial = fixture.application("Partial Applicant");
    let archived = fixture.application("Archived Applicant");
    fixture.review(covered.id, first.id, 10);
    fixture.review(covered.id, second.id, 11);
    fixture.review(partial.id, first.id, 9);
    fixture
        .services
        .intake
        .archive(None, archived.id)
        .expect("archive");

    let stats = fixture
        .services
        .analytics
        .overall_stats()
        .expect("overall stats");
    assert_eq!(stats.total_applications, 2);
    assert_eq!(stats.total_reviews, 3);
    assert_eq!(stats.fully_reviewed, 1);
    assert_eq!(stats.active_reviewers, 2);
}

#[test]
fn empty_store_yields_empty_analytics() {
    let fixture = Fixture::new();
    let analytics = &fixture.services.analytics;
    assert!(analytics.reviewer_analytics().expect("analytics").is_empty());
    assert!(analytics.score_distribution().expect("distribution").is_empty());
    assert!(analytics.outlier_reviews().expect("outliers").is_empty());
}

#[test]
fn repository_failures_surface_as_data_fetch_errors() {
    let service = AnalyticsService::new(Arc::new(UnavailableRepository));
    assert!(matches!(
        service.outlier_reviews(),
        Err(AnalyticsError::DataFetchFailed(_))
    ));
    assert!(matches!(
        service.reviewer_analytics(),
        Err(AnalyticsError::DataFetchFailed(_))
    ));
}
