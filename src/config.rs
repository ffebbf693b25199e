//! Option structs for the pipeline.
//!
//! Configuration *loading* (files, env) is the embedding application's job;
//! this module only defines the in-code knobs and their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Construction-time tuning for an
/// [`OptimizationPipeline`](crate::pipeline::OptimizationPipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of the prompt optimizer's memoization cache.
    pub prompt_cache_size: usize,
    /// TTL for memoized prompt optimizations.
    pub prompt_cache_ttl: Duration,
    /// Capacity of the context compressor's memoization cache.
    pub compression_cache_size: usize,
    /// TTL for memoized compressions.
    pub compression_cache_ttl: Duration,
    /// Capacity of the global response cache. Larger than the sub-caches
    /// because it deduplicates whole downstream calls.
    pub response_cache_size: usize,
    /// TTL for cached downstream responses.
    pub response_cache_ttl: Duration,
    /// Contexts at or under this many bytes are never compressed.
    pub compression_threshold_bytes: usize,
    /// Reduction the compressor aims for (best-effort).
    pub target_reduction: f64,
    /// Window used by [`stats`](crate::pipeline::OptimizationPipeline::stats)
    /// for the performance summary.
    pub stats_window: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prompt_cache_size: 500,
            prompt_cache_ttl: Duration::from_secs(7200),
            compression_cache_size: 200,
            compression_cache_ttl: Duration::from_secs(1800),
            response_cache_size: 2000,
            response_cache_ttl: Duration::from_secs(7200),
            compression_threshold_bytes: 5000,
            target_reduction: 0.3,
            stats_window: Duration::from_secs(3600),
        }
    }
}

/// Per-request flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Compress the context when it exceeds the configured threshold.
    pub enable_compression: bool,
    /// Forwarded untouched on the optimized request; the core never acts on
    /// it. Callers use it to decide whether to chunk the eventual response.
    pub enable_streaming: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            enable_compression: true,
            enable_streaming: true,
        }
    }
}
