use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use triage_core::Branch;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    completed_total: AtomicU64,
    rejected_inputs_total: AtomicU64,
    generation_calls_total: AtomicU64,
    generation_failures_total: AtomicU64,
    general_total: AtomicU64,
    emergency_total: AtomicU64,
    mental_health_total: AtomicU64,
    unrecognized_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub completed_total: u64,
    pub rejected_inputs_total: u64,
    pub generation_calls_total: u64,
    pub generation_failures_total: u64,
    pub branches: BranchCounts,
    pub unrecognized_total: u64,
    pub avg_latency_millis: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchCounts {
    pub general: u64,
    pub emergency: u64,
    pub mental_health: u64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_input(&self) {
        self.rejected_inputs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generation_call(&self) {
        self.generation_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generation_failure(&self) {
        self.generation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unrecognized(&self) {
        self.unrecognized_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_branch(&self, branch: Branch) {
        let counter = match branch {
            Branch::General => &self.general_total,
            Branch::Emergency => &self.emergency_total,
            Branch::MentalHealth => &self.mental_health_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Only completed runs contribute to the latency average.
    pub fn observe_completion(&self, duration: Duration) {
        self.completed_total.fetch_add(1, Ordering::Relaxed);
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.completed_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            completed_total: completed,
            rejected_inputs_total: self.rejected_inputs_total.load(Ordering::Relaxed),
            generation_calls_total: self.generation_calls_total.load(Ordering::Relaxed),
            generation_failures_total: self.generation_failures_total.load(Ordering::Relaxed),
            branches: BranchCounts {
                general: self.general_total.load(Ordering::Relaxed),
                emergency: self.emergency_total.load(Ordering::Relaxed),
                mental_health: self.mental_health_total.load(Ordering::Relaxed),
            },
            unrecognized_total: self.unrecognized_total.load(Ordering::Relaxed),
            avg_latency_millis: if completed == 0 {
                0.0
            } else {
                latency as f64 / completed as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,triage_api=info,triage_agents=info,triage_llm=warn",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
