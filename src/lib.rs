//! PromptPress — request optimization in front of a slow LLM backend.
//!
//! The pipeline rewrites prompts, compresses oversized contexts,
//! deduplicates identical work through TTL+LRU caches, and tracks
//! latency/success metrics. It never executes the downstream generation
//! call itself: on a cache miss the caller receives an optimized request
//! payload, runs it against whatever backend it owns, and feeds the
//! response back via [`OptimizationPipeline::cache_response`].
//!
//! # Example
//!
//! ```rust
//! use promptpress::{OptimizationPipeline, RequestOptions};
//!
//! let pipeline = OptimizationPipeline::new();
//! let result = pipeline.optimize(
//!     "Could you please analyze my pipeline",
//!     "deployment context",
//!     "devops",
//!     &RequestOptions::default(),
//! );
//!
//! assert!(!result.cache_hit);
//! let request = result.optimized_request.unwrap();
//! // ... send `request` to the generation backend, then:
//! pipeline.cache_response(&request.cache_key, "the backend's answer");
//! ```
//!
//! Optimization failure never breaks a request: internal errors degrade to
//! passing the original prompt/context through unmodified, with the error
//! noted in the result's report.

pub mod cache;
pub mod compressor;
pub mod config;
pub mod error;
pub mod monitor;
pub mod optimizer;
pub mod pipeline;
pub mod streamer;

pub use cache::{CacheStats, TtlLruCache};
pub use compressor::{CompressionMetrics, ContextCompressor};
pub use config::{PipelineConfig, RequestOptions};
pub use error::OptimizeError;
pub use monitor::{PerfMetric, PerformanceMonitor, WindowSummary};
pub use optimizer::{Domain, PromptMetrics, PromptOptimizer};
pub use pipeline::{
    OptimizationPipeline, OptimizationReport, OptimizedRequest, PipelineResult, PipelineStats,
};
pub use streamer::ResponseChunker;
