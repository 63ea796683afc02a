use applicant_review::repository::InMemoryReviewStore;
use applicant_review::workflows::ReviewServices;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type StoreServices = ReviewServices<InMemoryReviewStore, InMemoryReviewStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// One in-process store backing both the data seam and the audit trail.
pub(crate) fn in_memory_services() -> Arc<StoreServices> {
    let store = Arc::new(InMemoryReviewStore::new());
    Arc::new(ReviewServices::new(store.clone(), store))
}
