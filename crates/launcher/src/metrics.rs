//! Prometheus metrics for migration and startup.

use prometheus::{self, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Migration metrics
pub static MIGRATION_RUNS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "hearth_migration_runs_total",
        "Total number of legacy migrations actually executed",
    )
    .expect("metric creation failed")
});

pub static MIGRATION_DOMAIN_OUTCOMES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hearth_migration_domain_outcomes_total",
            "Migration domain outcomes by domain and outcome",
        ),
        &["domain", "outcome"],
    )
    .expect("metric creation failed")
});

pub static MIGRATION_RECORDS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hearth_migration_records_total",
            "Documents written by the legacy migration per domain",
        ),
        &["domain"],
    )
    .expect("metric creation failed")
});

// Startup metrics
pub static PROVIDER_AUTHORIZATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hearth_provider_authorizations_total",
            "Debrid provider authorizations by provider and result",
        ),
        &["provider", "result"],
    )
    .expect("metric creation failed")
});

pub static STARTUP_STEP_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hearth_startup_step_failures_total",
            "Isolated startup step failures by step",
        ),
        &["step"],
    )
    .expect("metric creation failed")
});

pub static DETACHED_TASK_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hearth_detached_task_failures_total",
            "Detached background task failures by task and kind",
        ),
        &["task", "kind"],
    )
    .expect("metric creation failed")
});

pub static GAMES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "hearth_sync_games_uploaded_total",
        "Library entries uploaded to the remote library",
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent; later calls are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(MIGRATION_RUNS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(MIGRATION_DOMAIN_OUTCOMES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(MIGRATION_RECORDS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PROVIDER_AUTHORIZATIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(STARTUP_STEP_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DETACHED_TASK_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(GAMES_UPLOADED.clone()))
            .expect("metric registration failed");
    });
}

/// Render every registered metric in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Record an isolated startup step failure.
pub fn record_step_failure(step: &str) {
    STARTUP_STEP_FAILURES.with_label_values(&[step]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();

        MIGRATION_RUNS.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("hearth_migration_runs_total"));
    }
}
