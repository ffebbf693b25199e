//! The optimization pipeline: composes optimizer, compressor, response
//! cache, and monitor into one per-request operation.
//!
//! Each request moves linearly: prompt optimization, conditional context
//! compression, cache-key derivation, response-cache lookup. Optimization
//! failure is never allowed to break the caller's request — any internal
//! error degrades to returning the original prompt/context unmodified.
//!
//! The pipeline is a plain struct owned by the caller; there is no global
//! singleton. A shared reference is enough for concurrent use, since every
//! sub-component serializes through its own lock.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheStats, TtlLruCache};
use crate::compressor::{CompressionMetrics, ContextCompressor};
use crate::config::{PipelineConfig, RequestOptions};
use crate::error::OptimizeError;
use crate::monitor::{PerfMetric, PerformanceMonitor, WindowSummary};
use crate::optimizer::{Domain, PromptMetrics, PromptOptimizer};

/// Operation tag under which pipeline requests appear in metric summaries.
const OP_OPTIMIZE_REQUEST: &str = "optimize_request";

/// The payload a caller sends to the downstream generation backend on a
/// cache miss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedRequest {
    /// Optimized (or, after a fallback, original) prompt text.
    pub prompt: String,
    /// Final (possibly compressed) context text.
    pub context: String,
    /// Domain tag as received from the caller.
    pub domain: String,
    /// Key to pass back via [`OptimizationPipeline::cache_response`] once the
    /// backend succeeds. Empty after a fallback — caching is skipped then.
    pub cache_key: String,
    /// The caller's `enable_streaming` flag, forwarded untouched.
    pub streaming: bool,
}

/// Per-request record of what optimization did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub original_prompt_length: usize,
    pub final_prompt_length: usize,
    pub original_context_length: usize,
    pub final_context_length: usize,
    /// Ordered stage tags: `prompt_optimization`, then `context_compression`
    /// when it ran, then `cache_hit` on a hit.
    pub optimizations_applied: Vec<String>,
    /// Stage metrics from the prompt optimizer. Absent after a fallback.
    pub prompt_optimization: Option<PromptMetrics>,
    /// Stage metrics from the compressor. Present only when it ran.
    pub context_compression: Option<CompressionMetrics>,
    pub cache_hit: bool,
    /// Populated only when optimization failed and the request passed
    /// through unmodified.
    pub error: Option<String>,
}

/// Outcome of one pipeline pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub cache_hit: bool,
    /// The cached downstream response, on a hit.
    pub response: Option<String>,
    /// The request to execute against the backend, on a miss or fallback.
    pub optimized_request: Option<OptimizedRequest>,
    pub report: OptimizationReport,
    /// Total wall time spent inside the pipeline, in seconds.
    pub processing_time_secs: f64,
}

/// Counts of what the pipeline currently holds in memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub response_cache_entries: usize,
    pub metrics_recorded: usize,
}

/// Aggregate observability snapshot across all pipeline components.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub prompt_optimizer_cache: CacheStats,
    pub context_compressor_cache: CacheStats,
    pub response_cache: CacheStats,
    /// `None` when nothing was recorded inside the stats window.
    pub performance: Option<WindowSummary>,
    pub resources: ResourceUsage,
}

/// Request-optimization pipeline in front of a slow generation backend.
pub struct OptimizationPipeline {
    optimizer: PromptOptimizer,
    compressor: ContextCompressor,
    response_cache: TtlLruCache<String>,
    monitor: PerformanceMonitor,
    config: PipelineConfig,
}

impl OptimizationPipeline {
    /// Pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Pipeline with explicit cache sizes, TTLs, and thresholds.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            optimizer: PromptOptimizer::with_cache(
                config.prompt_cache_size,
                config.prompt_cache_ttl,
            ),
            compressor: ContextCompressor::with_cache(
                config.compression_cache_size,
                config.compression_cache_ttl,
            ),
            response_cache: TtlLruCache::new(config.response_cache_size, config.response_cache_ttl),
            monitor: PerformanceMonitor::new(),
            config,
        }
    }

    /// Optimize one request.
    ///
    /// On a response-cache hit the result carries the cached response; on a
    /// miss it carries an [`OptimizedRequest`] for the caller to execute.
    /// Never fails: any internal error is recorded and the original
    /// prompt/context pass through unmodified with the error noted in the
    /// report.
    pub fn optimize(
        &self,
        prompt: &str,
        context: &str,
        domain: &str,
        opts: &RequestOptions,
    ) -> PipelineResult {
        let start = Instant::now();
        match self.run_stages(prompt, context, domain, opts, start) {
            Ok(result) => {
                self.monitor.record(PerfMetric::success(
                    OP_OPTIMIZE_REQUEST,
                    start.elapsed(),
                    result.cache_hit,
                ));
                result
            }
            Err(err) => {
                warn!(error = %err, "request optimization failed, passing request through unmodified");
                let elapsed = start.elapsed();
                self.monitor.record(PerfMetric::failure(
                    OP_OPTIMIZE_REQUEST,
                    elapsed,
                    &err.to_string(),
                ));
                PipelineResult {
                    cache_hit: false,
                    response: None,
                    optimized_request: Some(OptimizedRequest {
                        prompt: prompt.to_string(),
                        context: context.to_string(),
                        domain: domain.to_string(),
                        cache_key: String::new(),
                        streaming: opts.enable_streaming,
                    }),
                    report: OptimizationReport {
                        original_prompt_length: prompt.len(),
                        final_prompt_length: prompt.len(),
                        original_context_length: context.len(),
                        final_context_length: context.len(),
                        optimizations_applied: Vec::new(),
                        prompt_optimization: None,
                        context_compression: None,
                        cache_hit: false,
                        error: Some(err.to_string()),
                    },
                    processing_time_secs: elapsed.as_secs_f64(),
                }
            }
        }
    }

    /// The fallible stage sequence, caught by [`optimize`].
    fn run_stages(
        &self,
        prompt: &str,
        context: &str,
        domain_tag: &str,
        opts: &RequestOptions,
        start: Instant,
    ) -> Result<PipelineResult, OptimizeError> {
        let domain: Domain = domain_tag.parse()?;
        let mut applied = Vec::new();

        let (optimized_prompt, prompt_metrics) = self.optimizer.optimize(prompt, domain);
        applied.push("prompt_optimization".to_string());

        let mut final_context = context.to_string();
        let mut compression_metrics = None;
        if opts.enable_compression && context.len() > self.config.compression_threshold_bytes {
            let (compressed, metrics) = self
                .compressor
                .compress(context, self.config.target_reduction);
            applied.push("context_compression".to_string());
            final_context = compressed;
            compression_metrics = Some(metrics);
        }

        let cache_key = cache::request_key(&optimized_prompt, &final_context, domain.as_str());

        let mut report = OptimizationReport {
            original_prompt_length: prompt.len(),
            final_prompt_length: optimized_prompt.len(),
            original_context_length: context.len(),
            final_context_length: final_context.len(),
            optimizations_applied: applied,
            prompt_optimization: Some(prompt_metrics),
            context_compression: compression_metrics,
            cache_hit: false,
            error: None,
        };

        if let Some(response) = self.response_cache.get(&cache_key) {
            debug!(key = %cache::log_prefix(&cache_key), "response cache hit");
            report.cache_hit = true;
            report.optimizations_applied.push("cache_hit".to_string());
            return Ok(PipelineResult {
                cache_hit: true,
                response: Some(response),
                optimized_request: None,
                report,
                processing_time_secs: start.elapsed().as_secs_f64(),
            });
        }

        Ok(PipelineResult {
            cache_hit: false,
            response: None,
            optimized_request: Some(OptimizedRequest {
                prompt: optimized_prompt,
                context: final_context,
                domain: domain_tag.to_string(),
                cache_key,
                streaming: opts.enable_streaming,
            }),
            report,
            processing_time_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Store a completed downstream response under `key` so identical future
    /// requests become cache hits. No-op on an empty key (the fallback path
    /// produces those).
    pub fn cache_response(&self, key: &str, response: &str) {
        if key.is_empty() {
            return;
        }
        debug!(key = %cache::log_prefix(key), "caching downstream response");
        self.response_cache.put(key, response.to_string());
    }

    /// Aggregate statistics across all caches plus the performance summary
    /// over the configured stats window. Read-only.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            prompt_optimizer_cache: self.optimizer.cache_stats(),
            context_compressor_cache: self.compressor.cache_stats(),
            response_cache: self.response_cache.stats(),
            performance: self.monitor.summary(self.config.stats_window),
            resources: ResourceUsage {
                response_cache_entries: self.response_cache.len(),
                metrics_recorded: self.monitor.recorded(),
            },
        }
    }

    /// Clear every cache. Metric history is kept — it is an audit trail,
    /// not a cache.
    pub fn cleanup(&self) {
        info!("clearing pipeline caches");
        self.response_cache.clear();
        self.optimizer.clear_cache();
        self.compressor.clear_cache();
        info!("pipeline cache cleanup completed");
    }

    /// The monitor, for callers that record their own downstream metrics.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }
}

impl Default for OptimizationPipeline {
    fn default() -> Self {
        Self::new()
    }
}
