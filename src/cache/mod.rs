//! In-memory caching: generic TTL+LRU store and cache-key derivation.

pub mod key;
pub mod ttl_lru;

pub use key::{compression_key, prompt_key, request_key};
pub use ttl_lru::{CacheStats, TtlLruCache};

/// Truncate a key to at most 8 bytes for log output, backing off to the
/// nearest char boundary so arbitrary caller keys never split a UTF-8
/// character.
pub(crate) fn log_prefix(key: &str) -> &str {
    let mut end = 8.min(key.len());
    while end > 0 && !key.is_char_boundary(end) {
        end -= 1;
    }
    &key[..end]
}
