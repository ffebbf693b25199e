//! Deterministic cache-key derivation.
//!
//! Keys are hex-encoded SHA-256 digests over the request fields that make
//! two pieces of work interchangeable. Fields are length-prefixed before
//! hashing so adjacent fields can never collide by shifting bytes across
//! the boundary (e.g. `prompt="a:b"` vs `prompt="a", context="b"`).

use sha2::{Digest, Sha256};

/// Hash an ordered list of fields into a hex digest.
fn digest(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Key for a prompt-optimization result: `(prompt, domain)`.
pub fn prompt_key(prompt: &str, domain: &str) -> String {
    digest(&[prompt, domain])
}

/// Key for a context-compression result: `(context, target_reduction)`.
pub fn compression_key(context: &str, target_reduction: f64) -> String {
    // Ryu-style float formatting is deterministic for a given value, so the
    // textual form is a stable key component.
    digest(&[context, &target_reduction.to_string()])
}

/// Key for a fully optimized request: `(optimized_prompt, final_context, domain)`.
///
/// This is the key the caller passes back to
/// [`cache_response`](crate::pipeline::OptimizationPipeline::cache_response)
/// after the downstream backend completes.
pub fn request_key(prompt: &str, context: &str, domain: &str) -> String {
    digest(&[prompt, context, domain])
}
