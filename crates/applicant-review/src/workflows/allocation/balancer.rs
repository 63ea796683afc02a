use crate::domain::{ApplicationId, NewAssignment, UserId};

use super::AllocationError;

/// Every application is read by this many distinct reviewers.
pub const REVIEWERS_PER_APPLICATION: usize = 2;

/// Slot budget for one reviewer during a planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewerQuota {
    pub reviewer_id: UserId,
    pub quota: usize,
    pub assigned: usize,
}

impl ReviewerQuota {
    fn has_capacity(&self) -> bool {
        self.assigned < self.quota
    }
}

/// Outcome of a planning pass, before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    pub assignments: Vec<NewAssignment>,
    pub quotas: Vec<ReviewerQuota>,
    /// Applications that needed the quota-ignoring fallback scan.
    pub fallback_applications: Vec<ApplicationId>,
    /// Applications left with fewer than two reviewers.
    pub short_applications: Vec<ApplicationId>,
}

/// Split `applications.len() * 2` slots across reviewers; the first
/// `total % reviewers` reviewers in order take one extra slot.
pub fn reviewer_quotas(reviewers: &[UserId], application_count: usize) -> Vec<ReviewerQuota> {
    if reviewers.is_empty() {
        return Vec::new();
    }

    let total_slots = application_count * REVIEWERS_PER_APPLICATION;
    let base = total_slots / reviewers.len();
    let remainder = total_slots % reviewers.len();

    reviewers
        .iter()
        .enumerate()
        .map(|(index, reviewer_id)| ReviewerQuota {
            reviewer_id: *reviewer_id,
            quota: base + usize::from(index < remainder),
            assigned: 0,
        })
        .collect()
}

/// Plan two distinct reviewers per application, balancing load.
///
/// Applications are visited in the given (upload) order. A round-robin cursor
/// moves one reviewer per attempt, successful or not, and carries over between
/// applications. After `2 * reviewers` attempts a linear scan fills any gap
/// while ignoring quotas.
pub fn plan_assignments(
    reviewers: &[UserId],
    applications: &[ApplicationId],
) -> Result<AllocationPlan, AllocationError> {
    if reviewers.len() < REVIEWERS_PER_APPLICATION {
        return Err(AllocationError::InsufficientReviewers {
            found: reviewers.len(),
        });
    }
    if applications.is_empty() {
        return Err(AllocationError::NoApplications);
    }

    let reviewer_count = reviewers.len();
    let mut quotas = reviewer_quotas(reviewers, applications.len());
    let mut assignments = Vec::with_capacity(applications.len() * REVIEWERS_PER_APPLICATION);
    let mut fallback_applications = Vec::new();
    let mut short_applications = Vec::new();
    let mut cursor = 0usize;

    for application_id in applications {
        let mut picked: Vec<usize> = Vec::with_capacity(REVIEWERS_PER_APPLICATION);
        cursor = round_robin_pick(&mut quotas, &mut picked, cursor, reviewer_count);

        if picked.len() < REVIEWERS_PER_APPLICATION {
            fallback_applications.push(*application_id);
            fallback_pick(&mut quotas, &mut picked);
        }

        if picked.len() < REVIEWERS_PER_APPLICATION {
            short_applications.push(*application_id);
        }

        assignments.extend(picked.into_iter().map(|index| NewAssignment {
            application_id: *application_id,
            reviewer_id: quotas[index].reviewer_id,
        }));
    }

    Ok(AllocationPlan {
        assignments,
        quotas,
        fallback_applications,
        short_applications,
    })
}

/// Returns the cursor position for the next application.
fn round_robin_pick(
    quotas: &mut [ReviewerQuota],
    picked: &mut Vec<usize>,
    mut cursor: usize,
    reviewer_count: usize,
) -> usize {
    let max_attempts = reviewer_count * 2;
    let mut attempts = 0;

    while picked.len() < REVIEWERS_PER_APPLICATION && attempts < max_attempts {
        let index = cursor % reviewer_count;
        if !picked.contains(&index) && quotas[index].has_capacity() {
            picked.push(index);
            quotas[index].assigned += 1;
        }
        cursor = (cursor + 1) % reviewer_count;
        attempts += 1;
    }

    cursor
}

fn fallback_pick(quotas: &mut [ReviewerQuota], picked: &mut Vec<usize>) {
    for index in 0..quotas.len() {
        if picked.len() >= REVIEWERS_PER_APPLICATION {
            break;
        }
        if !picked.contains(&index) {
            picked.push(index);
            quotas[index].assigned += 1;
        }
    }
}
