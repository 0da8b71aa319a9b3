//! Prediction statistics for the running service.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;
use tracing::info;

/// Metrics collector for served predictions
pub struct PredictionMetrics {
    /// Total successful predictions
    pub predictions_served: AtomicU64,
    /// Total failed inference calls
    pub predictions_failed: AtomicU64,
    /// Predictions by label
    labels: RwLock<HashMap<String, u64>>,
    /// Inference latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for uptime
    start_time: Instant,
}

impl PredictionMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            labels: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, label: &str, latency_us: u64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut labels) = self.labels.write() {
            *labels.entry(label.to_string()).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency_us);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a failed inference call
    pub fn record_failure(&self) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get latency statistics over the recent window
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            labels: self
                .labels
                .read()
                .map(|labels| labels.clone())
                .unwrap_or_default(),
            latency: self.latency_stats(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            served = snapshot.predictions_served,
            failed = snapshot.predictions_failed,
            uptime_secs = snapshot.uptime_secs,
            mean_us = snapshot.latency.mean_us,
            p50_us = snapshot.latency.p50_us,
            p99_us = snapshot.latency.p99_us,
            "Prediction summary"
        );
        for (label, count) in &snapshot.labels {
            info!(label = %label, count = count, "Predictions by label");
        }
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub predictions_failed: u64,
    pub labels: HashMap<String, u64>,
    pub latency: LatencyStats,
    pub uptime_secs: u64,
}
