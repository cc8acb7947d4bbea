//! Text segmentation into bounded-length passages
//!
//! Words are accumulated greedily into a buffer joined by single spaces. A
//! word is appended only while `chars(buffer + word) < max_len`, where the
//! buffer still carries the trailing space of its last word. Words are never
//! split, so a word longer than `max_len` becomes a passage on its own.

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};

/// Default passage size threshold, in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// A contiguous run of document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Position in the chunker output, used as the passage identifier
    pub index: usize,
    pub text: String,
}

/// Greedy word-accumulating chunker
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_len: usize,
}

impl Chunker {
    /// Create a chunker; `max_len` must be positive
    pub fn new(max_len: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(PipelineError::ConfigError(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { max_len })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Split `text` into passages indexed 0..N-1 in source order
    pub fn chunk(&self, text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut buffer = String::new();
        // Character count of `buffer`, including its trailing space
        let mut buffer_len = 0usize;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();

            if buffer_len + word_len < self.max_len {
                buffer.push_str(word);
                buffer.push(' ');
                buffer_len += word_len + 1;
            } else {
                Self::emit(&mut passages, &buffer);
                buffer.clear();
                buffer.push_str(word);
                buffer.push(' ');
                buffer_len = word_len + 1;
            }
        }

        Self::emit(&mut passages, &buffer);
        passages
    }

    fn emit(passages: &mut Vec<Passage>, buffer: &str) {
        let text = buffer.trim();
        if text.is_empty() {
            return;
        }
        passages.push(Passage {
            index: passages.len(),
            text: text.to_string(),
        });
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Chunk `text` with the given threshold
pub fn chunk(text: &str, max_len: usize) -> Result<Vec<Passage>> {
    Ok(Chunker::new(max_len)?.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn texts(passages: &[Passage]) -> Vec<&str> {
        passages.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_empty_text_yields_no_passages() {
        assert!(Chunker::default().chunk("").is_empty());
        assert!(Chunker::default().chunk("   \n\t  ").is_empty());
    }

    #[test]
    fn test_zero_max_len_rejected() {
        assert!(matches!(
            Chunker::new(0),
            Err(PipelineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_boundary_is_strict() {
        // "alpha " + "beta" is exactly 10 characters, which is not < 10
        let passages = chunk("alpha beta gamma delta", 10).unwrap();
        assert_eq!(texts(&passages), vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_pairs_fit_with_larger_threshold() {
        let passages = chunk("alpha beta gamma delta", 12).unwrap();
        assert_eq!(texts(&passages), vec!["alpha beta", "gamma delta"]);
        assert_eq!(passages[0].index, 0);
        assert_eq!(passages[1].index, 1);
    }

    #[test]
    fn test_overlong_word_kept_whole() {
        let passages = chunk("a supercalifragilistic b", 5).unwrap();
        assert_eq!(texts(&passages), vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_leading_overlong_word_emits_no_empty_passage() {
        let passages = chunk("enormousword tail", 4).unwrap();
        assert_eq!(texts(&passages), vec!["enormousword", "tail"]);
        assert_eq!(passages[0].index, 0);
    }

    #[test]
    fn test_collapses_mixed_whitespace() {
        let passages = chunk("one\ntwo\t\tthree   four", 100).unwrap();
        assert_eq!(texts(&passages), vec!["one two three four"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // Each word is 4 characters but 8 bytes
        let passages = chunk("ñañá éééé", 10).unwrap();
        assert_eq!(texts(&passages), vec!["ñañá éééé"]);
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(Chunker::default().max_len(), DEFAULT_CHUNK_SIZE);
    }

    #[quickcheck]
    fn prop_rejoining_preserves_words(text: String, max_len: u8) -> TestResult {
        if max_len == 0 {
            return TestResult::discard();
        }
        let passages = chunk(&text, max_len as usize).unwrap();
        let rejoined = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let original: Vec<&str> = text.split_whitespace().collect();
        let recovered: Vec<&str> = rejoined.split_whitespace().collect();
        TestResult::from_bool(original == recovered)
    }

    #[quickcheck]
    fn prop_passages_bounded_unless_single_word(text: String, max_len: u8) -> TestResult {
        if max_len == 0 {
            return TestResult::discard();
        }
        let max_len = max_len as usize;
        let passages = chunk(&text, max_len).unwrap();
        let ok = passages.iter().all(|p| {
            p.text.chars().count() < max_len || p.text.split_whitespace().count() == 1
        });
        TestResult::from_bool(ok)
    }

    #[quickcheck]
    fn prop_indices_are_sequential(text: String) -> bool {
        Chunker::new(16)
            .unwrap()
            .chunk(&text)
            .iter()
            .enumerate()
            .all(|(i, p)| p.index == i && !p.text.is_empty())
    }
}
