pub mod allocation;
pub mod analytics;
pub mod intake;
pub mod results;
pub mod reviews;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::warn;

use crate::repository::{AuditEvent, AuditLog, ReviewRepository};

use allocation::AllocationService;
use analytics::AnalyticsService;
use intake::IntakeService;
use results::ResultsService;
use reviews::ReviewService;
use users::UserService;

/// Every workflow service wired to one repository and audit log.
pub struct ReviewServices<R, A> {
    pub allocation: AllocationService<R, A>,
    pub analytics: AnalyticsService<R>,
    pub intake: IntakeService<R, A>,
    pub reviews: ReviewService<R, A>,
    pub results: ResultsService<R, A>,
    pub users: UserService<R, A>,
    pub audit: Arc<A>,
}

impl<R, A> ReviewServices<R, A>
where
    R: ReviewRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self {
            allocation: AllocationService::new(repository.clone(), audit.clone()),
            analytics: AnalyticsService::new(repository.clone()),
            intake: IntakeService::new(repository.clone(), audit.clone()),
            reviews: ReviewService::new(repository.clone(), audit.clone()),
            results: ResultsService::new(repository.clone(), audit.clone()),
            users: UserService::new(repository, audit.clone()),
            audit,
        }
    }
}

/// The audit trail never fails an operation whose write already landed.
pub(crate) fn record_audit<A: AuditLog + ?Sized>(audit: &A, event: AuditEvent) {
    let action = event.action.label();
    if let Err(err) = audit.append(event) {
        warn!(action, error = %err, "failed to record audit entry");
    }
}
