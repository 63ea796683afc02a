use std::collections::HashMap;
use std::sync::Arc;

use super::common::*;
use crate::domain::{AssignmentId, Role, UserId};
use crate::repository::{InMemoryReviewStore, ReviewRepository};
use crate::workflows::allocation::{AllocationError, AllocationService};

#[test]
fn allocate_spreads_five_applications_over_three_reviewers() {
    let fixture = Fixture::seeded(3, 5);
    let admin = fixture.admin("chair");

    let summary = fixture
        .services
        .allocation
        .allocate(Some(admin.id))
        .expect("allocation succeeds");

    assert_eq!(summary.application_count, 5);
    assert_eq!(summary.assignment_count, 10);
    assert_eq!(summary.reviewer_count, 3);

    let mut loads: HashMap<UserId, usize> = HashMap::new();
    for assignment in fixture.store.assignments().expect("assignments") {
        *loads.entry(assignment.reviewer_id).or_insert(0) += 1;
    }
    let mut counts: Vec<usize> = loads.values().copied().collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![3, 3, 4]);
    assert_eq!(fixture.audit_actions(), vec!["ALLOCATE_APPLICATIONS"]);
}

#[test]
fn allocate_ignores_inactive_reviewers_and_admins() {
    let fixture = Fixture::seeded(2, 3);
    fixture.user("dormant", Role::Reviewer, false);
    fixture.admin("chair");

    let summary = fixture.services.allocation.allocate(None).expect("allocate");
    assert_eq!(summary.reviewer_count, 2);
    assert_eq!(summary.assignment_count, 6);
}

#[test]
fn allocate_skips_archived_applications() {
    let fixture = Fixture::seeded(2, 3);
    let archived = fixture.application("Archived Applicant");
    fixture
        .services
        .intake
        .archive(None, archived.id)
        .expect("archive");

    let summary = fixture.services.allocation.allocate(None).expect("allocate");
    assert_eq!(summary.application_count, 3);
    assert!(fixture
        .store
        .assignments()
        .expect("assignments")
        .iter()
        .all(|assignment| assignment.application_id != archived.id));
}

#[test]
fn allocate_requires_two_active_reviewers_and_writes_nothing() {
    let fixture = Fixture::seeded(1, 4);
    let existing = fixture.application("Already Assigned");
    let reviewer = fixture.store.active_reviewers().expect("reviewers")[0].clone();
    fixture.assign(&[(existing.id, reviewer.id)]);

    let err = fixture
        .services
        .allocation
        .allocate(None)
        .expect_err("one reviewer is not enough");
    assert!(matches!(
        err,
        AllocationError::InsufficientReviewers { found: 1 }
    ));
    assert_eq!(fixture.store.assignments().expect("assignments").len(), 1);
    assert!(fixture.audit_actions().is_empty());
}

#[test]
fn allocate_without_applications_reports_no_applications() {
    let fixture = Fixture::seeded(3, 0);
    let err = fixture
        .services
        .allocation
        .allocate(None)
        .expect_err("nothing to allocate");
    assert!(matches!(err, AllocationError::NoApplications));
}

#[test]
fn reviewer_check_runs_before_application_check() {
    let fixture = Fixture::seeded(0, 0);
    let err = fixture.services.allocation.allocate(None).expect_err("empty");
    assert!(matches!(
        err,
        AllocationError::InsufficientReviewers { found: 0 }
    ));
}

#[test]
fn allocate_replaces_the_previous_round() {
    let fixture = Fixture::seeded(3, 5);
    fixture.services.allocation.allocate(None).expect("first");
    fixture.application("Late Applicant");
    let summary = fixture.services.allocation.allocate(None).expect("second");

    assert_eq!(summary.assignment_count, 12);
    assert_eq!(fixture.store.assignments().expect("assignments").len(), 12);
}

#[test]
fn reassign_moves_assignment_to_another_reviewer() {
    let fixture = Fixture::new();
    let first = fixture.reviewer("first");
    let second = fixture.reviewer("second");
    let third = fixture.reviewer("third");
    let application = fixture.application("Ada Lovelace");
    let stored = fixture.assign(&[(application.id, first.id), (application.id, second.id)]);

    let updated = fixture
        .services
        .allocation
        .reassign(None, stored[0].id, third.id)
        .expect("reassign");

    assert_eq!(updated.reviewer_id, third.id);
    assert_eq!(updated.application_id, application.id);
    assert_eq!(fixture.audit_actions(), vec!["REASSIGN_APPLICATION"]);
}

#[test]
fn reassign_rejects_reviewer_already_on_application() {
    let fixture = Fixture::new();
    let first = fixture.reviewer("first");
    let second = fixture.reviewer("second");
    let application = fixture.application("Ada Lovelace");
    let stored = fixture.assign(&[(application.id, first.id), (application.id, second.id)]);

    let err = fixture
        .services
        .allocation
        .reassign(None, stored[0].id, second.id)
        .expect_err("second already holds this application");
    assert!(matches!(
        err,
        AllocationError::DuplicateReviewerForApplication { reviewer_id, .. } if reviewer_id == second.id
    ));

    let err = fixture
        .services
        .allocation
        .reassign(None, stored[0].id, first.id)
        .expect_err("same reviewer counts as a duplicate");
    assert!(matches!(
        err,
        AllocationError::DuplicateReviewerForApplication { .. }
    ));
    assert_eq!(
        fixture.store.fetch_assignment(stored[0].id).expect("fetch"),
        Some(stored[0].clone())
    );
}

#[test]
fn reassign_reports_unknown_assignment_and_reviewer() {
    let fixture = Fixture::new();
    let first = fixture.reviewer("first");
    let chair = fixture.admin("chair");
    let application = fixture.application("Ada Lovelace");
    let stored = fixture.assign(&[(application.id, first.id)]);

    let err = fixture
        .services
        .allocation
        .reassign(None, AssignmentId(9_999), first.id)
        .expect_err("unknown assignment");
    assert!(matches!(err, AllocationError::AssignmentNotFound(AssignmentId(9_999))));

    let err = fixture
        .services
        .allocation
        .reassign(None, stored[0].id, chair.id)
        .expect_err("admins cannot hold assignments");
    assert!(matches!(err, AllocationError::ReviewerNotFound(id) if id == chair.id));
}

#[test]
fn allocations_groups_reviewers_per_application() {
    let fixture = Fixture::seeded(3, 2);
    fixture.services.allocation.allocate(None).expect("allocate");

    let overview = fixture.services.allocation.allocations().expect("overview");
    assert_eq!(overview.allocations.len(), 2);
    assert!(overview
        .allocations
        .iter()
        .all(|allocation| allocation.reviewers.len() == 2));
    assert_eq!(overview.reviewers.len(), 3);
    assert!(overview.allocations[0]
        .reviewers
        .iter()
        .all(|reviewer| reviewer.username.starts_with("reviewer")));
}

#[test]
fn assignment_progress_counts_reviewed_assignments() {
    let fixture = Fixture::new();
    let reviewer = fixture.reviewer("first");
    let first = fixture.application("First Applicant");
    let second = fixture.application("Second Applicant");
    fixture.assign(&[(first.id, reviewer.id), (second.id, reviewer.id)]);
    fixture.review(first.id, reviewer.id, 12);

    let progress = fixture
        .services
        .allocation
        .assignment_progress(reviewer.id)
        .expect("progress");
    assert_eq!(progress.total, 2);
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.remaining, 1);
}

#[test]
fn repository_failures_surface_as_data_fetch_errors() {
    let service = AllocationService::new(
        Arc::new(UnavailableRepository),
        Arc::new(InMemoryReviewStore::new()),
    );
    let err = service.allocate(None).expect_err("store offline");
    assert!(matches!(err, AllocationError::DataFetchFailed(_)));
}

#[test]
fn audit_failures_do_not_fail_allocation() {
    let fixture = Fixture::seeded(2, 1);

    let service = AllocationService::new(fixture.store.clone(), Arc::new(RejectingAudit));
    let summary = service.allocate(None).expect("allocation still lands");
    assert_eq!(summary.assignment_count, 2);
    assert_eq!(fixture.store.assignments().expect("assignments").len(), 2);
}
