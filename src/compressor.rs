//! Extractive context compression.
//!
//! Reduces large request contexts to the sentences and lines that carry
//! operational signal (errors, metrics, recommendations), assembled into a
//! "Key Information" / "Important Details" digest. Reduction is best-effort:
//! the requested target is not guaranteed, and missing it is not an error.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cache::{self, CacheStats, TtlLruCache};

const DEFAULT_CACHE_SIZE: usize = 200;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1800);

/// Sentences longer than this are never kept as key phrases.
const MAX_PHRASE_LEN: usize = 200;
/// At most this many key phrases are extracted.
const MAX_PHRASES: usize = 15;
/// At most this many key phrases appear in the digest.
const SHOWN_PHRASES: usize = 10;
/// At most this many items are kept per structured category.
const MAX_CATEGORY_ITEMS: usize = 5;
/// At most this many items per category appear in the digest.
const SHOWN_CATEGORY_ITEMS: usize = 3;
/// Lines at or under this trimmed length are dropped by the aggressive pass.
const MIN_LINE_LEN: usize = 10;

/// A sentence mentioning any of these is considered important.
const IMPORTANCE_KEYWORDS: &[&str] = &[
    "error",
    "critical",
    "high",
    "urgent",
    "failed",
    "down",
    "performance",
    "latency",
    "throughput",
    "availability",
    "security",
    "vulnerability",
    "breach",
    "compliance",
    "cost",
    "optimization",
    "scaling",
    "capacity",
];

const RESOURCE_KEYWORDS: &[&str] = &["cpu", "memory", "disk", "network", "latency"];
const ERROR_KEYWORDS: &[&str] = &["error", "failed", "exception", "timeout"];

/// Metrics describing one compression run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionMetrics {
    /// Byte length of the context as received.
    pub original_length: usize,
    /// Byte length of the digest.
    pub compressed_length: usize,
    /// Reduction achieved: `1 - compressed/original` (`0.0` for empty input).
    pub reduction_ratio: f64,
    /// Reduction that was requested. May exceed `reduction_ratio`.
    pub target_reduction: f64,
    /// Wall time spent compressing (zero on a cache hit).
    pub compression_time: Duration,
    /// Key phrases extracted (extraction cap, not display cap).
    pub key_phrase_count: usize,
    /// Structured categories that came back non-empty (0–4).
    pub structured_categories: usize,
}

/// Per-line classification buckets.
#[derive(Debug, Default)]
struct StructuredInfo {
    services: Vec<String>,
    metrics: Vec<String>,
    errors: Vec<String>,
    recommendations: Vec<String>,
}

impl StructuredInfo {
    fn categories(&self) -> [(&'static str, &Vec<String>); 4] {
        [
            ("services", &self.services),
            ("metrics", &self.metrics),
            ("errors", &self.errors),
            ("recommendations", &self.recommendations),
        ]
    }

    fn non_empty_count(&self) -> usize {
        self.categories().iter().filter(|(_, v)| !v.is_empty()).count()
    }
}

#[derive(Clone)]
struct CachedCompression {
    text: String,
    metrics: CompressionMetrics,
}

/// Extractive summarizer with a memoizing cache.
pub struct ContextCompressor {
    cache: TtlLruCache<CachedCompression>,
}

impl ContextCompressor {
    /// Compressor with the default cache (200 entries, 30 min TTL).
    pub fn new() -> Self {
        Self::with_cache(DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL)
    }

    /// Compressor with an explicitly sized memoization cache.
    pub fn with_cache(max_size: usize, ttl: Duration) -> Self {
        Self {
            cache: TtlLruCache::new(max_size, ttl),
        }
    }

    /// Compress `context`, aiming for (not guaranteeing) `target_reduction`.
    pub fn compress(&self, context: &str, target_reduction: f64) -> (String, CompressionMetrics) {
        let key = cache::compression_key(context, target_reduction);
        if let Some(cached) = self.cache.get(&key) {
            return (cached.text, cached.metrics);
        }

        let start = Instant::now();
        let original_length = context.len();

        let key_phrases = extract_key_phrases(context);
        let structured = extract_structured_info(context);

        let mut compressed = assemble_digest(&structured, &key_phrases);

        let reduction = |len: usize| {
            if original_length == 0 {
                0.0
            } else {
                1.0 - len as f64 / original_length as f64
            }
        };
        if reduction(compressed.len()) < target_reduction {
            compressed = aggressive_compress(&compressed);
        }

        let metrics = CompressionMetrics {
            original_length,
            compressed_length: compressed.len(),
            reduction_ratio: reduction(compressed.len()),
            target_reduction,
            compression_time: start.elapsed(),
            key_phrase_count: key_phrases.len(),
            structured_categories: structured.non_empty_count(),
        };

        self.cache.put(
            &key,
            CachedCompression {
                text: compressed.clone(),
                metrics: metrics.clone(),
            },
        );
        (compressed, metrics)
    }

    /// Statistics for the compressor's memoization cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all memoized results.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for ContextCompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep sentences under [`MAX_PHRASE_LEN`] that mention an importance
/// keyword, capped at [`MAX_PHRASES`].
fn extract_key_phrases(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            sentence.len() < MAX_PHRASE_LEN
                && IMPORTANCE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .take(MAX_PHRASES)
        .map(str::to_string)
        .collect()
}

/// Classify each non-empty line into the structured categories, then
/// deduplicate (first occurrence wins) and cap each category.
fn extract_structured_info(text: &str) -> StructuredInfo {
    let mut info = StructuredInfo::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        if lower.contains("service") {
            for word in line.split_whitespace() {
                if word.to_lowercase().contains("service") && word.len() > 7 {
                    info.services.push(word.to_string());
                }
            }
        }
        if RESOURCE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            info.metrics.push(line.to_string());
        }
        if ERROR_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            info.errors.push(line.to_string());
        }
        if line.starts_with('-') || line.starts_with('*') || lower.contains("recommend") {
            info.recommendations.push(line.to_string());
        }
    }

    for bucket in [
        &mut info.services,
        &mut info.metrics,
        &mut info.errors,
        &mut info.recommendations,
    ] {
        dedup_preserving_order(bucket);
        bucket.truncate(MAX_CATEGORY_ITEMS);
    }
    info
}

fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// Build the "Key Information" + "Important Details" digest.
fn assemble_digest(structured: &StructuredInfo, key_phrases: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if structured.non_empty_count() > 0 {
        parts.push("Key Information:".to_string());
        for (category, items) in structured.categories() {
            if !items.is_empty() {
                let shown: Vec<&str> = items
                    .iter()
                    .take(SHOWN_CATEGORY_ITEMS)
                    .map(String::as_str)
                    .collect();
                parts.push(format!("- {category}: {}", shown.join(", ")));
            }
        }
    }

    if !key_phrases.is_empty() {
        parts.push("\nImportant Details:".to_string());
        for phrase in key_phrases.iter().take(SHOWN_PHRASES) {
            parts.push(format!("- {phrase}"));
        }
    }

    parts.join("\n")
}

/// Secondary pass when the target reduction was missed: substitute verbose
/// phrases and drop short lines.
fn aggressive_compress(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.replace("in order to", "to")
                .replace("due to the fact that", "because")
                .replace("at this point in time", "now")
        })
        .filter(|line| line.trim().len() > MIN_LINE_LEN)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident_context() -> String {
        let mut ctx = String::new();
        ctx.push_str("The checkout-service reported elevated latency this morning.\n");
        ctx.push_str("CPU usage on the primary node reached 94 percent.\n");
        ctx.push_str("Several requests failed with a timeout error after 30 seconds.\n");
        ctx.push_str("- recommend scaling the worker pool to eight replicas\n");
        ctx.push_str("Unrelated narrative line about the weather being pleasant today.\n");
        // Padding so the digest is genuinely smaller than the input.
        for _ in 0..30 {
            ctx.push_str("Routine log line with no operational signal whatsoever present.\n");
        }
        ctx
    }

    #[test]
    fn test_digest_structure() {
        let c = ContextCompressor::new();
        let (out, metrics) = c.compress(&incident_context(), 0.3);
        assert!(out.starts_with("Key Information:"));
        assert!(out.contains("- services: checkout-service"));
        assert!(out.contains("- metrics:"));
        assert!(out.contains("- errors:"));
        assert!(out.contains("- recommendations:"));
        assert!(out.contains("Important Details:"));
        assert_eq!(metrics.structured_categories, 4);
        assert!(metrics.key_phrase_count > 0);
    }

    #[test]
    fn test_never_longer_on_realistic_input() {
        let c = ContextCompressor::new();
        let ctx = incident_context();
        let (out, metrics) = c.compress(&ctx, 0.3);
        assert!(out.len() <= ctx.len());
        assert!(metrics.reduction_ratio > 0.0);
        assert_eq!(metrics.compressed_length, out.len());
    }

    #[test]
    fn test_best_effort_target_not_guaranteed() {
        // Dense input: nearly everything is an important phrase, so a 0.99
        // target is unreachable. The call still succeeds.
        let c = ContextCompressor::new();
        let ctx = "critical error in checkout. security breach detected. latency high.";
        let (out, metrics) = c.compress(ctx, 0.99);
        assert!(!out.is_empty());
        assert!(metrics.reduction_ratio < metrics.target_reduction);
    }

    #[test]
    fn test_cache_short_circuit() {
        let c = ContextCompressor::new();
        let ctx = incident_context();
        let (first, m1) = c.compress(&ctx, 0.3);
        let (second, m2) = c.compress(&ctx, 0.3);
        assert_eq!(first, second);
        assert_eq!(m1, m2);
        assert_eq!(c.cache_stats().hits, 1);
    }

    #[test]
    fn test_target_is_part_of_cache_key() {
        let c = ContextCompressor::new();
        let ctx = incident_context();
        let _ = c.compress(&ctx, 0.3);
        let _ = c.compress(&ctx, 0.5);
        assert_eq!(c.cache_stats().hits, 0);
        assert_eq!(c.cache_stats().misses, 2);
    }

    #[test]
    fn test_empty_input() {
        let c = ContextCompressor::new();
        let (out, metrics) = c.compress("", 0.3);
        assert_eq!(out, "");
        assert_eq!(metrics.reduction_ratio, 0.0);
        assert_eq!(metrics.structured_categories, 0);
    }

    #[test]
    fn test_long_sentences_not_key_phrases() {
        let c = ContextCompressor::new();
        let long = format!("error {}", "x".repeat(300));
        let (_, metrics) = c.compress(&long, 0.3);
        assert_eq!(metrics.key_phrase_count, 0);
    }

    #[test]
    fn test_category_items_deduplicated_and_capped() {
        let mut ctx = String::new();
        for _ in 0..10 {
            ctx.push_str("request failed with timeout error\n");
        }
        for i in 0..10 {
            ctx.push_str(&format!("- recommend fix number {i} for the rollout\n"));
        }
        let info = extract_structured_info(&ctx);
        assert_eq!(info.errors.len(), 1, "duplicates collapse to one");
        assert_eq!(info.recommendations.len(), MAX_CATEGORY_ITEMS);
    }

    #[test]
    fn test_service_name_heuristic() {
        let info = extract_structured_info("the payment-service and api talk over grpc");
        assert_eq!(info.services, vec!["payment-service"]);
        // Short words containing "service" are skipped.
        let info = extract_structured_info("service is up");
        assert!(info.services.is_empty());
    }

    #[test]
    fn test_aggressive_pass_drops_short_lines() {
        let out = aggressive_compress("tiny\na much longer line that survives the pass");
        assert_eq!(out, "a much longer line that survives the pass");
    }
}
