use chrono::{DateTime, Utc};

use crate::models::{LayerStatus, ScrapeResult};

/// Reading speed used for the read-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-separated tokens.
pub fn word_count(markdown: &str) -> usize {
    markdown.split_whitespace().count()
}

/// Minutes needed to read `words`, rounded up.
pub fn read_time(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

/// Build the result of a successful run from its final Markdown.
pub fn assemble(
    markdown: String,
    strategy_index: usize,
    strategy_name: &str,
    scraped_at: DateTime<Utc>,
    layers: Vec<LayerStatus>,
) -> ScrapeResult {
    let word_count = word_count(&markdown);
    ScrapeResult {
        markdown,
        strategy_index_used: strategy_index,
        strategy_name: strategy_name.to_string(),
        word_count,
        read_time: read_time(word_count),
        scraped_at,
        layers,
    }
}
