//! Topic prompt and sanitisation of raw topic output.

use rand::seq::IndexedRandom;

/// Maximum topic length in characters.
pub const MAX_TOPIC_CHARS: usize = 64;

/// Token budget for a topic request.
pub const TOPIC_MAX_TOKENS: u32 = 24;

/// Instruction sent to the backend to obtain one short topic.
pub const TOPIC_PROMPT: &str = "You are a random topic generator. Return ONE short topic only (3-6 words), \
no punctuation, no quotes. Example: amusement parks\nTopic:";

/// Used when the backend output sanitises to nothing.
pub const DEFAULT_TOPICS: [&str; 4] = [
    "amusement parks",
    "rainy sidewalks",
    "old libraries",
    "lost satellites",
];

/// Reduce raw backend output to a single short topic line.
///
/// Keeps only alphanumerics, whitespace and `-`, collapses whitespace runs,
/// trims, and truncates to [`MAX_TOPIC_CHARS`] characters.  Returns `None`
/// when nothing is left.
pub fn sanitize_topic(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_TOPIC_CHARS).collect();
    let topic = truncated.trim_end();

    (!topic.is_empty()).then(|| topic.to_string())
}

/// A uniformly random entry of [`DEFAULT_TOPICS`].
pub fn random_default_topic() -> String {
    DEFAULT_TOPICS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(DEFAULT_TOPICS[0])
        .to_string()
}
