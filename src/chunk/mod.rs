//! Sentence-aware chunking of generated text.
//!
//! [`split_into_chunks`] turns an arbitrary monologue into display-sized
//! chunks that respect sentence boundaries wherever the word budget allows.
//!
//! # Algorithm
//!
//! ```text
//! text ──normalise whitespace──▶ words
//!      ──close a sentence after every word ending in . ! ?──▶ sentences
//!      ──greedy pack while running word count ≤ max_words──▶ chunks
//!
//! sentence longer than max_words:
//!      flush accumulator, then emit max_words-sized windows directly
//! ```
//!
//! # Example
//!
//! ```rust
//! use persona_stage::chunk::split_into_chunks;
//!
//! let chunks = split_into_chunks(
//!     "Hello world. This is a test sentence that is quite long indeed.",
//!     3,
//! );
//! assert_eq!(
//!     chunks,
//!     vec!["Hello world.", "This is a", "test sentence that", "is quite long", "indeed."]
//! );
//! ```

/// Characters that end a sentence when followed by whitespace.
const TERMINAL_PUNCTUATION: [char; 3] = ['.', '!', '?'];

// ---------------------------------------------------------------------------
// Sentence splitting
// ---------------------------------------------------------------------------

/// Split `text` into sentences, each returned as its list of words.
///
/// Whitespace is normalised first, so a boundary is simply a word whose last
/// character is terminal punctuation.  The punctuation stays attached to the
/// sentence it closes.  Empty sentences cannot be produced.
pub fn split_sentences(text: &str) -> Vec<Vec<&str>> {
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(TERMINAL_PUNCTUATION) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}

// ---------------------------------------------------------------------------
// Chunk packing
// ---------------------------------------------------------------------------

/// Accumulates whole sentences until the word budget would be exceeded.
struct Accumulator<'a> {
    words: Vec<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn new() -> Self {
        Self { words: Vec::new() }
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn push(&mut self, sentence: &[&'a str]) {
        self.words.extend_from_slice(sentence);
    }

    fn flush_into(&mut self, chunks: &mut Vec<String>) {
        if !self.words.is_empty() {
            chunks.push(self.words.join(" "));
            self.words.clear();
        }
    }
}

/// Pack complete sentences of `text` into chunks of at most `max_words`
/// words.
///
/// * Empty or whitespace-only input yields no chunks.
/// * A sentence longer than `max_words` is hard-split into consecutive
///   windows of exactly `max_words` words (the last may be shorter); those
///   windows never merge with neighbouring sentences.
/// * A `max_words` of `0` is treated as `1`.
///
/// Output depends only on the arguments.
pub fn split_into_chunks(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut acc = Accumulator::new();

    for sentence in split_sentences(text) {
        if sentence.len() > max_words {
            acc.flush_into(&mut chunks);
            chunks.extend(sentence.chunks(max_words).map(|window| window.join(" ")));
            continue;
        }

        if acc.len() + sentence.len() > max_words {
            acc.flush_into(&mut chunks);
        }
        acc.push(&sentence);
    }
    acc.flush_into(&mut chunks);

    log::debug!("chunk: produced {} chunks (max_words={max_words})", chunks.len());
    chunks
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
