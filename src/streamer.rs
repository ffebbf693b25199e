//! Response chunking for streamed delivery.
//!
//! Splits a finished response into fixed-size chunks so the transport layer
//! can deliver it incrementally. Chunk boundaries never split a UTF-8
//! character. Pacing and delivery are the transport's concern, not ours.

/// Default chunk size in characters.
const DEFAULT_CHUNK_CHARS: usize = 100;

/// Splits responses into character-bounded chunks.
#[derive(Debug, Clone, Copy)]
pub struct ResponseChunker {
    chunk_chars: usize,
}

impl ResponseChunker {
    /// Chunker emitting at most `chunk_chars` characters per chunk.
    /// Clamped to a minimum of 1.
    pub fn new(chunk_chars: usize) -> Self {
        Self {
            chunk_chars: chunk_chars.max(1),
        }
    }

    /// Iterate over `response` in chunks. The final chunk may be shorter;
    /// an empty response yields no chunks.
    pub fn chunks<'a>(&self, response: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let size = self.chunk_chars;
        let mut rest = response;
        std::iter::from_fn(move || {
            if rest.is_empty() {
                return None;
            }
            let split = rest
                .char_indices()
                .nth(size)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let (chunk, tail) = rest.split_at(split);
            rest = tail;
            Some(chunk)
        })
    }
}

impl Default for ResponseChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_CHARS)
    }
}
