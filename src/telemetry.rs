use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::crypto::AlgorithmId;
use crate::logger::METRICS_TARGET;

/// Process-wide counters for the service loop.
#[derive(Default, Debug)]
pub struct ServiceMetrics {
    pub sessions_total: AtomicU64,
    pub responses_total: AtomicU64,
    pub level_a_total: AtomicU64,
    pub level_b_total: AtomicU64,
    pub read_failures_total: AtomicU64,
    pub sign_failures_total: AtomicU64,
    pub write_failures_total: AtomicU64,
    pub inference_fallbacks_total: AtomicU64,
    pub accept_failures_total: AtomicU64,
    pub last_latency_us: AtomicU64,
}

impl ServiceMetrics {
    pub fn record_selection(&self, algorithm: AlgorithmId) {
        match algorithm {
            AlgorithmId::LevelA => self.level_a_total.fetch_add(1, Ordering::Relaxed),
            AlgorithmId::LevelB => self.level_b_total.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_latency(&self, latency_ms: f32) {
        let us = (f64::from(latency_ms) * 1000.0).round().max(0.0) as u64;
        self.last_latency_us.store(us, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ServiceMetricsSnapshot {
        ServiceMetricsSnapshot {
            sessions_total: self.sessions_total.load(Ordering::Relaxed),
            responses_total: self.responses_total.load(Ordering::Relaxed),
            level_a_total: self.level_a_total.load(Ordering::Relaxed),
            level_b_total: self.level_b_total.load(Ordering::Relaxed),
            read_failures_total: self.read_failures_total.load(Ordering::Relaxed),
            sign_failures_total: self.sign_failures_total.load(Ordering::Relaxed),
            write_failures_total: self.write_failures_total.load(Ordering::Relaxed),
            inference_fallbacks_total: self.inference_fallbacks_total.load(Ordering::Relaxed),
            accept_failures_total: self.accept_failures_total.load(Ordering::Relaxed),
            last_latency_us: self.last_latency_us.load(Ordering::Relaxed),
        }
    }

    /// Emit the current counters as one JSON line on the metrics target.
    pub fn log_snapshot(&self) {
        log::info!(target: METRICS_TARGET, "{}", self.snapshot().to_json_line());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceMetricsSnapshot {
    pub sessions_total: u64,
    pub responses_total: u64,
    pub level_a_total: u64,
    pub level_b_total: u64,
    pub read_failures_total: u64,
    pub sign_failures_total: u64,
    pub write_failures_total: u64,
    pub inference_fallbacks_total: u64,
    pub accept_failures_total: u64,
    pub last_latency_us: u64,
}

impl ServiceMetricsSnapshot {
    pub fn to_json_line(&self) -> String {
        serde_json::json!({
            "ts": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "metrics": self,
        })
        .to_string()
    }
}
