use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::error::{AppError, Rejection};
use crate::models::{CandidateContent, ContentKind};
use crate::traits::Cleaner;

/// Three or more line breaks, with only horizontal whitespace between them.
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank-run regex is valid"));

/// Turns an accepted candidate into the final Markdown document.
pub struct Normalizer<C: Cleaner> {
    cleaner: C,
}

impl<C: Cleaner> Normalizer<C> {
    pub fn new(cleaner: C) -> Self {
        Self { cleaner }
    }

    /// Markdown body for a candidate, without the provenance header.
    ///
    /// HTML goes through the cleaner and is collapsed; reader text is only trimmed.
    /// An empty result is a [`Rejection::EmptyBody`].
    pub fn body(&self, candidate: &CandidateContent) -> Result<String, AppError> {
        let body = match candidate.kind {
            ContentKind::Html => {
                let markdown = self.cleaner.clean(&candidate.body)?;
                collapse_blank_lines(&markdown).trim().to_string()
            }
            ContentKind::Text => candidate.body.trim().to_string(),
        };
        if body.is_empty() {
            return Err(Rejection::EmptyBody.into());
        }
        Ok(body)
    }

    /// Full document: provenance header, blank line, body.
    pub fn normalize(
        &self,
        candidate: &CandidateContent,
        source_url: &str,
        strategy_index: usize,
        scraped_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let body = self.body(candidate)?;
        Ok(format!(
            "{}{body}",
            provenance_header(source_url, scraped_at, strategy_index)
        ))
    }
}

/// Replace every run of two or more blank lines with a single blank line.
pub fn collapse_blank_lines(markdown: &str) -> String {
    BLANK_RUN.replace_all(markdown, "\n\n").into_owned()
}

/// Metadata block recording where and when the content came from.
pub fn provenance_header(source_url: &str, scraped_at: DateTime<Utc>, strategy_index: usize) -> String {
    format!(
        "---\nsource: {source_url}\nscraped: {}\nlayers_tried: {strategy_index}\n---\n\n",
        scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
