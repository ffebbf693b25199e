//! Bounded metric history with threshold alerting and windowed summaries.
//!
//! Metrics land in a fixed-capacity ring buffer (oldest entries drop
//! silently — this is history, not a cache) and are summarized over a time
//! window on demand. An empty window yields `None` rather than zeros, so
//! "no traffic" is never mistaken for "zero latency".

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

/// Ring-buffer capacity; beyond this the oldest metric is discarded.
const HISTORY_CAPACITY: usize = 10_000;

/// Alert when a single operation takes longer than this.
const ALERT_RESPONSE_TIME: Duration = Duration::from_secs(5);
/// Alert when a single operation reports more memory than this (bytes).
const ALERT_MEMORY_BYTES: u64 = 1_000_000_000;

/// One recorded operation. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct PerfMetric {
    /// Operation tag used for the per-operation breakdown.
    pub operation: String,
    /// Wall time the operation took.
    pub duration: Duration,
    /// Best-effort memory usage in bytes; zero when not measured.
    pub memory_usage: u64,
    /// Best-effort CPU usage fraction; zero when not measured.
    pub cpu_usage: f64,
    /// Whether the operation was served from cache.
    pub cache_hit: bool,
    /// When the operation finished (monotonic).
    pub timestamp: Instant,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error_message: Option<String>,
}

impl PerfMetric {
    /// A successful operation measured just now.
    pub fn success(operation: &str, duration: Duration, cache_hit: bool) -> Self {
        Self {
            operation: operation.to_string(),
            duration,
            memory_usage: 0,
            cpu_usage: 0.0,
            cache_hit,
            timestamp: Instant::now(),
            success: true,
            error_message: None,
        }
    }

    /// A failed operation measured just now.
    pub fn failure(operation: &str, duration: Duration, error: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration,
            memory_usage: 0,
            cpu_usage: 0.0,
            cache_hit: false,
            timestamp: Instant::now(),
            success: false,
            error_message: Some(error.to_string()),
        }
    }
}

/// Per-operation-tag aggregate within a summary window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub count: usize,
    pub avg_duration_secs: f64,
    pub success_rate: f64,
}

/// Aggregate statistics over a time window. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub window_secs: f64,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub avg_response_time_secs: f64,
    pub min_response_time_secs: f64,
    pub max_response_time_secs: f64,
    pub p95_response_time_secs: f64,
    pub p99_response_time_secs: f64,
    /// Breakdown keyed by each metric's operation tag.
    pub operations: HashMap<String, OperationStats>,
}

/// Records metrics and serves windowed summaries. One mutex guards both.
pub struct PerformanceMonitor {
    history: Mutex<VecDeque<PerfMetric>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
        }
    }

    /// Append a metric, evaluating alert thresholds on the way in.
    ///
    /// Alerting is a log side effect only (`warn!` per breached threshold);
    /// recording never blocks beyond the lock hold and never fails.
    pub fn record(&self, metric: PerfMetric) {
        check_alerts(&metric);
        let mut history = self.lock();
        if history.len() >= HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(metric);
    }

    /// Summarize metrics recorded within the last `window`.
    ///
    /// Returns `None` when no metric falls inside the window, so callers can
    /// tell "no traffic" apart from "zero latency".
    pub fn summary(&self, window: Duration) -> Option<WindowSummary> {
        let now = Instant::now();
        let history = self.lock();
        let recent: Vec<&PerfMetric> = history
            .iter()
            .filter(|m| now.duration_since(m.timestamp) <= window)
            .collect();
        if recent.is_empty() {
            return None;
        }

        let total = recent.len();
        let successful = recent.iter().filter(|m| m.success).count();
        let cache_hits = recent.iter().filter(|m| m.cache_hit).count();

        let mut durations: Vec<Duration> = recent.iter().map(|m| m.duration).collect();
        durations.sort_unstable();
        let sum: Duration = durations.iter().sum();

        let mut by_operation: HashMap<String, Vec<&PerfMetric>> = HashMap::new();
        for &m in &recent {
            by_operation.entry(m.operation.clone()).or_default().push(m);
        }
        let operations = by_operation
            .into_iter()
            .map(|(op, ms)| {
                let op_sum: Duration = ms.iter().map(|m| m.duration).sum();
                let ok = ms.iter().filter(|m| m.success).count();
                (
                    op,
                    OperationStats {
                        count: ms.len(),
                        avg_duration_secs: op_sum.as_secs_f64() / ms.len() as f64,
                        success_rate: ok as f64 / ms.len() as f64,
                    },
                )
            })
            .collect();

        Some(WindowSummary {
            window_secs: window.as_secs_f64(),
            total_requests: total,
            successful_requests: successful,
            success_rate: successful as f64 / total as f64,
            cache_hit_rate: cache_hits as f64 / total as f64,
            avg_response_time_secs: sum.as_secs_f64() / total as f64,
            min_response_time_secs: durations[0].as_secs_f64(),
            max_response_time_secs: durations[total - 1].as_secs_f64(),
            p95_response_time_secs: percentile(&durations, 95).as_secs_f64(),
            p99_response_time_secs: percentile(&durations, 99).as_secs_f64(),
            operations,
        })
    }

    /// Number of metrics currently held in the ring buffer.
    pub fn recorded(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<PerfMetric>> {
        self.history.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Test hook: shift every recorded timestamp `age` into the past.
    #[cfg(test)]
    pub(crate) fn backdate_all(&self, age: Duration) {
        let mut history = self.lock();
        for m in history.iter_mut() {
            m.timestamp = m
                .timestamp
                .checked_sub(age)
                .expect("monotonic clock too young to backdate");
        }
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-rank percentile: value at index `floor(p/100 * n)` of the
/// ascending-sorted sample, clamped to the last index. No interpolation.
fn percentile(sorted: &[Duration], p: u32) -> Duration {
    debug_assert!(!sorted.is_empty());
    let index = (p as f64 / 100.0 * sorted.len() as f64) as usize;
    sorted[index.min(sorted.len() - 1)]
}

fn check_alerts(metric: &PerfMetric) {
    if metric.duration > ALERT_RESPONSE_TIME {
        warn!(
            operation = %metric.operation,
            duration_secs = metric.duration.as_secs_f64(),
            "performance alert: high response time"
        );
    }
    if metric.memory_usage > ALERT_MEMORY_BYTES {
        warn!(
            operation = %metric.operation,
            memory_bytes = metric.memory_usage,
            "performance alert: high memory usage"
        );
    }
    if !metric.success {
        warn!(
            operation = %metric.operation,
            error = metric.error_message.as_deref().unwrap_or("unknown"),
            "performance alert: operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_empty_window_is_no_data() {
        let mon = PerformanceMonitor::new();
        assert!(mon.summary(HOUR).is_none());
    }

    #[test]
    fn test_percentile_nearest_rank() {
        // Durations 1..=100: index floor(0.95 * 100) = 95 => value 96.
        let mon = PerformanceMonitor::new();
        for i in 1..=100u64 {
            mon.record(PerfMetric::success("op", secs(i), false));
        }
        let summary = mon.summary(HOUR).unwrap();
        assert_eq!(summary.p95_response_time_secs, 96.0);
        assert_eq!(summary.p99_response_time_secs, 100.0);
        assert_eq!(summary.min_response_time_secs, 1.0);
        assert_eq!(summary.max_response_time_secs, 100.0);
        assert_eq!(summary.avg_response_time_secs, 50.5);
    }

    #[test]
    fn test_percentile_clamps_to_last_index() {
        let data = vec![secs(1), secs(2)];
        // floor(0.99 * 2) = 1, already last; floor(1.00 * 2) = 2 would be out
        // of bounds without the clamp.
        assert_eq!(percentile(&data, 99), secs(2));
        assert_eq!(percentile(&data, 100), secs(2));
        assert_eq!(percentile(&data, 0), secs(1));
    }

    #[test]
    fn test_success_and_cache_hit_rates() {
        let mon = PerformanceMonitor::new();
        mon.record(PerfMetric::success("a", secs(1), true));
        mon.record(PerfMetric::success("a", secs(1), false));
        mon.record(PerfMetric::failure("b", secs(1), "boom"));
        mon.record(PerfMetric::success("b", secs(3), false));
        let summary = mon.summary(HOUR).unwrap();
        assert_eq!(summary.total_requests, 4);
        assert_eq!(summary.successful_requests, 3);
        assert_eq!(summary.success_rate, 0.75);
        assert_eq!(summary.cache_hit_rate, 0.25);
    }

    #[test]
    fn test_operation_breakdown() {
        let mon = PerformanceMonitor::new();
        mon.record(PerfMetric::success("optimize", secs(2), false));
        mon.record(PerfMetric::success("optimize", secs(4), false));
        mon.record(PerfMetric::failure("compress", secs(1), "boom"));
        let summary = mon.summary(HOUR).unwrap();
        let opt = &summary.operations["optimize"];
        assert_eq!(opt.count, 2);
        assert_eq!(opt.avg_duration_secs, 3.0);
        assert_eq!(opt.success_rate, 1.0);
        let comp = &summary.operations["compress"];
        assert_eq!(comp.count, 1);
        assert_eq!(comp.success_rate, 0.0);
    }

    #[test]
    fn test_window_excludes_old_metrics() {
        let mon = PerformanceMonitor::new();
        mon.record(PerfMetric::success("old", secs(1), false));
        mon.backdate_all(secs(7200));
        mon.record(PerfMetric::success("new", secs(2), false));
        let summary = mon.summary(HOUR).unwrap();
        assert_eq!(summary.total_requests, 1);
        assert!(summary.operations.contains_key("new"));
        assert!(!summary.operations.contains_key("old"));
    }

    #[test]
    fn test_all_metrics_outside_window_is_no_data() {
        let mon = PerformanceMonitor::new();
        mon.record(PerfMetric::success("op", secs(1), false));
        mon.backdate_all(secs(7200));
        assert!(mon.summary(HOUR).is_none());
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mon = PerformanceMonitor::new();
        for i in 0..(HISTORY_CAPACITY + 5) {
            mon.record(PerfMetric::success(&format!("op{i}"), secs(1), false));
        }
        assert_eq!(mon.recorded(), HISTORY_CAPACITY);
        let summary = mon.summary(HOUR).unwrap();
        assert!(!summary.operations.contains_key("op0"));
        assert!(summary
            .operations
            .contains_key(&format!("op{}", HISTORY_CAPACITY + 4)));
    }

    #[test]
    fn test_failure_metric_carries_error() {
        let m = PerfMetric::failure("op", secs(1), "unknown domain tag");
        assert!(!m.success);
        assert_eq!(m.error_message.as_deref(), Some("unknown domain tag"));
        assert!(!m.cache_hit);
    }

    #[test]
    fn test_threshold_breaches_emit_warnings() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        #[derive(Clone, Default)]
        struct WarnCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == tracing::Level::WARN {
                    self.0.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let counter = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        tracing::subscriber::with_default(subscriber, || {
            let mon = PerformanceMonitor::new();
            // Under every threshold: no warning.
            mon.record(PerfMetric::success("fast", secs(1), false));
            // One warning each: slow, failed, memory-heavy.
            mon.record(PerfMetric::success("slow", secs(6), false));
            mon.record(PerfMetric::failure("broken", secs(1), "boom"));
            let mut heavy = PerfMetric::success("heavy", secs(1), false);
            heavy.memory_usage = ALERT_MEMORY_BYTES + 1;
            mon.record(heavy);
        });
        assert_eq!(counter.0.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_summary_serializes() {
        let mon = PerformanceMonitor::new();
        mon.record(PerfMetric::success("op", secs(1), true));
        let summary = mon.summary(HOUR).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_requests"], 1);
        assert_eq!(json["cache_hit_rate"], 1.0);
    }
}
