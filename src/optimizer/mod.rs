//! Rule-based prompt rewriting with a memoizing cache.
//!
//! The optimizer is deterministic given `(prompt, domain)`: identical inputs
//! produce byte-identical output, which is what makes the wrapping cache
//! sound. Passes run in a fixed order — politeness removal, filler removal,
//! verbose substitution, domain augmentation, whitespace collapse.

pub mod domain;
mod patterns;

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cache::{self, CacheStats, TtlLruCache};

pub use domain::Domain;

const DEFAULT_CACHE_SIZE: usize = 500;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7200);

/// Metrics describing one prompt-optimization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMetrics {
    /// Byte length of the prompt as received.
    pub original_length: usize,
    /// Byte length after all passes.
    pub optimized_length: usize,
    /// `1 - optimized/original`; `0.0` for an empty input, and negative when
    /// domain augmentation grew the prompt.
    pub compression_ratio: f64,
    /// Wall time spent rewriting (zero on a cache hit).
    pub optimization_time: Duration,
    /// Ordered tags for every transformation that fired.
    pub optimizations_applied: Vec<String>,
    /// Domain whose augmentation rules ran.
    pub domain: Domain,
}

#[derive(Clone)]
struct CachedOptimization {
    prompt: String,
    metrics: PromptMetrics,
}

/// Rewrites prompts through the fixed pass sequence, memoizing results.
pub struct PromptOptimizer {
    cache: TtlLruCache<CachedOptimization>,
}

impl PromptOptimizer {
    /// Optimizer with the default cache (500 entries, 2 h TTL).
    pub fn new() -> Self {
        Self::with_cache(DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL)
    }

    /// Optimizer with an explicitly sized memoization cache.
    pub fn with_cache(max_size: usize, ttl: Duration) -> Self {
        Self {
            cache: TtlLruCache::new(max_size, ttl),
        }
    }

    /// Rewrite `prompt` for `domain`, returning the optimized text and the
    /// run's metrics. Repeat calls with identical arguments are served from
    /// the cache without re-running the passes.
    pub fn optimize(&self, prompt: &str, domain: Domain) -> (String, PromptMetrics) {
        let key = cache::prompt_key(prompt, domain.as_str());
        if let Some(cached) = self.cache.get(&key) {
            return (cached.prompt, cached.metrics);
        }

        let start = Instant::now();
        let original_length = prompt.len();
        let mut applied = Vec::new();

        let (text, matched) = patterns::strip_redundant(prompt);
        for i in matched {
            applied.push(format!("removed_redundant: {}", patterns::REDUNDANT_PHRASES[i]));
        }

        let (text, matched) = patterns::strip_fillers(&text);
        for i in matched {
            applied.push(format!("removed_filler: {}", patterns::FILLER_WORDS[i]));
        }

        let (text, matched) = patterns::simplify_verbose(&text);
        for i in matched {
            let (verbose, concise) = patterns::VERBOSE_PATTERNS[i];
            applied.push(format!("simplified: {verbose} -> {concise}"));
        }

        let text = domain.augment(&text);
        applied.push(domain.applied_tag());

        // Whitespace collapse runs last, so augmentation suffixes are folded
        // into the single-line form as well.
        let optimized = text.split_whitespace().collect::<Vec<_>>().join(" ");

        let optimized_length = optimized.len();
        let compression_ratio = if original_length == 0 {
            0.0
        } else {
            1.0 - optimized_length as f64 / original_length as f64
        };

        let metrics = PromptMetrics {
            original_length,
            optimized_length,
            compression_ratio,
            optimization_time: start.elapsed(),
            optimizations_applied: applied,
            domain,
        };

        self.cache.put(
            &key,
            CachedOptimization {
                prompt: optimized.clone(),
                metrics: metrics.clone(),
            },
        );
        (optimized, metrics)
    }

    /// Statistics for the optimizer's memoization cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all memoized results.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for PromptOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
