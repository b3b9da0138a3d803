//! Splitting documents into fixed-size word chunks, plus character-safe
//! truncation used wherever text is bounded before reaching a model.

/// Default number of words per chunk.
pub const DEFAULT_CHUNK_WORDS: usize = 500;

/// Splits text into contiguous word windows.
///
/// Words are whitespace-separated tokens; each chunk rejoins its words with
/// a single space. Only the final chunk may be shorter than `chunk_words`.
#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    chunk_words: usize,
}

impl WordChunker {
    /// Create a chunker. A size of zero is clamped to one word.
    pub fn new(chunk_words: usize) -> Self {
        Self {
            chunk_words: chunk_words.max(1),
        }
    }

    /// Split `text` into chunks. Empty or whitespace-only input yields nothing.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        words
            .chunks(self.chunk_words)
            .map(|window| window.join(" "))
            .collect()
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_WORDS)
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// `text` cut to `max_chars` characters with `marker` appended when anything was cut.
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{}{}", head, marker)
    } else {
        text.to_string()
    }
}
