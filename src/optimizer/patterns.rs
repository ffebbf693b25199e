//! Rewrite pattern tables for prompt optimization.
//!
//! Three fixed tables drive the text passes: politeness phrases removed
//! wherever they occur as substrings, filler words removed when surrounded
//! by spaces, and verbose phrases replaced by concise equivalents. Each
//! table compiles once into a case-insensitive Aho-Corasick automaton.

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

/// Politeness phrases stripped wherever they appear (case-insensitive).
pub(crate) const REDUNDANT_PHRASES: &[&str] = &[
    "please",
    "could you",
    "would you mind",
    "if possible",
    "i need you to",
    "can you help me",
    "i would like",
];

/// Filler words removed only as whole words surrounded by spaces.
pub(crate) const FILLER_WORDS: &[&str] = &[
    "actually",
    "basically",
    "essentially",
    "literally",
    "obviously",
    "definitely",
    "certainly",
];

/// Verbose phrase → concise equivalent, applied in table order.
pub(crate) const VERBOSE_PATTERNS: &[(&str, &str)] = &[
    ("in order to", "to"),
    ("due to the fact that", "because"),
    ("at this point in time", "now"),
    ("in the event that", "if"),
    ("for the purpose of", "for"),
];

fn matcher(patterns: &[String]) -> AhoCorasick {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(patterns)
        .unwrap()
}

static REDUNDANT_AC: Lazy<AhoCorasick> = Lazy::new(|| {
    matcher(
        &REDUNDANT_PHRASES
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>(),
    )
});

static FILLER_AC: Lazy<AhoCorasick> = Lazy::new(|| {
    // Space padding enforces the whole-word rule.
    matcher(
        &FILLER_WORDS
            .iter()
            .map(|w| format!(" {w} "))
            .collect::<Vec<_>>(),
    )
});

static VERBOSE_AC: Lazy<AhoCorasick> = Lazy::new(|| {
    matcher(
        &VERBOSE_PATTERNS
            .iter()
            .map(|(v, _)| v.to_string())
            .collect::<Vec<_>>(),
    )
});

/// Record which pattern indices matched, in table order, without duplicates.
fn matched_indices(ac: &AhoCorasick, text: &str, pattern_count: usize) -> Vec<usize> {
    let mut seen = vec![false; pattern_count];
    for m in ac.find_iter(text) {
        seen[m.pattern().as_usize()] = true;
    }
    (0..pattern_count).filter(|&i| seen[i]).collect()
}

/// Remove redundant politeness phrases. Returns the rewritten text and the
/// indices into [`REDUNDANT_PHRASES`] that matched.
pub(crate) fn strip_redundant(text: &str) -> (String, Vec<usize>) {
    let indices = matched_indices(&REDUNDANT_AC, text, REDUNDANT_PHRASES.len());
    if indices.is_empty() {
        return (text.to_string(), indices);
    }
    let empties = vec![""; REDUNDANT_PHRASES.len()];
    (REDUNDANT_AC.replace_all(text, &empties), indices)
}

/// Remove space-delimited filler words. Runs to a fixpoint because removing
/// one filler can expose an adjacent one (`" actually basically "`).
pub(crate) fn strip_fillers(text: &str) -> (String, Vec<usize>) {
    let spaces = vec![" "; FILLER_WORDS.len()];
    let mut out = text.to_string();
    let mut seen = vec![false; FILLER_WORDS.len()];
    loop {
        for i in matched_indices(&FILLER_AC, &out, FILLER_WORDS.len()) {
            seen[i] = true;
        }
        let next = FILLER_AC.replace_all(&out, &spaces);
        if next == out {
            break;
        }
        out = next;
    }
    let indices = (0..FILLER_WORDS.len()).filter(|&i| seen[i]).collect();
    (out, indices)
}

/// Replace verbose phrases with their concise equivalents.
pub(crate) fn simplify_verbose(text: &str) -> (String, Vec<usize>) {
    let indices = matched_indices(&VERBOSE_AC, text, VERBOSE_PATTERNS.len());
    if indices.is_empty() {
        return (text.to_string(), indices);
    }
    let concise: Vec<&str> = VERBOSE_PATTERNS.iter().map(|(_, c)| *c).collect();
    (VERBOSE_AC.replace_all(text, &concise), indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_redundant_case_insensitive() {
        let (out, idx) = strip_redundant("Could you PLEASE check the logs");
        assert_eq!(out, "  check the logs");
        // "please" is index 0, "could you" index 1; reported in table order.
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn test_strip_redundant_substring_semantics() {
        // Phrases are removed wherever they occur, even inside words.
        let (out, _) = strip_redundant("I am pleased");
        assert_eq!(out, "I am d");
    }

    #[test]
    fn test_strip_fillers_whole_word_only() {
        let (out, idx) = strip_fillers("it is basically done");
        assert_eq!(out, "it is done");
        assert_eq!(idx, vec![1]);
        // Not whole-word: embedded occurrence survives.
        let (out, idx) = strip_fillers("the basicallyness of it");
        assert_eq!(out, "the basicallyness of it");
        assert!(idx.is_empty());
    }

    #[test]
    fn test_strip_fillers_adjacent() {
        let (out, idx) = strip_fillers("it is actually basically done");
        assert_eq!(out, "it is done");
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn test_simplify_verbose() {
        let (out, idx) = simplify_verbose("in order to ship, due to the fact that we must");
        assert_eq!(out, "to ship, because we must");
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn test_no_match_passthrough() {
        let (out, idx) = strip_redundant("deploy the service");
        assert_eq!(out, "deploy the service");
        assert!(idx.is_empty());
        let (out, idx) = simplify_verbose("deploy the service");
        assert_eq!(out, "deploy the service");
        assert!(idx.is_empty());
    }
}
