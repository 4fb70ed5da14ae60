use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Prometheus-style counters for engine observability.
/// Every swallowed error path increments one of these, so batch-sweep
/// failures and dropped notifications stay visible.
#[derive(Clone, Default)]
pub struct Metrics {
    /// Completed recitation sessions recorded
    pub sessions_recorded: Arc<AtomicU64>,
    /// Per-student evaluations executed
    pub evaluations_total: Arc<AtomicU64>,
    /// Alerts created (post de-duplication)
    pub alerts_created: Arc<AtomicU64>,
    /// Alerts suppressed by the cooldown window
    pub alerts_suppressed: Arc<AtomicU64>,
    /// Curriculum transitions applied
    pub transitions_applied: Arc<AtomicU64>,
    /// Notification dispatch failures (logged, never thrown)
    pub notification_failures: Arc<AtomicU64>,
    /// Per-student failures collected during a batch sweep
    pub sweep_errors: Arc<AtomicU64>,
    /// Daily content cache hits
    pub content_cache_hits: Arc<AtomicU64>,
    /// Daily content cache misses
    pub content_cache_misses: Arc<AtomicU64>,
    /// Template plan rows skipped for invalid verse ranges
    pub template_rows_skipped: Arc<AtomicU64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session(&self) {
        self.sessions_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evaluation(&self) {
        self.evaluations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_created(&self) {
        self.alerts_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_suppressed(&self) {
        self.alerts_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_failure(&self) {
        self.notification_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sweep_error(&self) {
        self.sweep_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_content_cache_hit(&self) {
        self.content_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_content_cache_miss(&self) {
        self.content_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_template_row_skipped(&self) {
        self.template_rows_skipped.fetch_add(1, Ordering::Relaxed);
    }
}
