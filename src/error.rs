//! Error types for the optimization pipeline.
//!
//! Cache misses are never errors (they are `None` returns); this type only
//! covers failures inside optimization itself. The pipeline boundary catches
//! every variant and degrades to pass-through behavior, so callers of
//! [`OptimizationPipeline::optimize`](crate::pipeline::OptimizationPipeline::optimize)
//! never see these propagate.

use thiserror::Error;

/// A failure inside prompt optimization, context compression, or cache-key
/// derivation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptimizeError {
    /// The request carried a domain tag outside the supported set
    /// (devops, sre, cloud, platform).
    #[error("unknown domain tag: {0:?}")]
    UnknownDomain(String),
}
