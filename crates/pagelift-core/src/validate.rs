//! Heuristics that decide whether a strategy's payload is real page content.
//!
//! HTML payloads go through the length check and the application-shell
//! detector. Reader-service text goes through the bot-wall detector instead.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::Rejection;
use crate::models::{CandidateContent, ContentKind};

/// Visible text shorter than this marks an empty application shell.
pub const SHELL_MIN_VISIBLE_CHARS: usize = 150;

/// An empty mount point only condemns a page whose visible text is also this thin.
const MOUNT_POINT_MAX_VISIBLE_CHARS: usize = 500;

/// Elements whose text never reaches the reader.
const INVISIBLE_TAGS: &[&str] = &[
    "head", "script", "style", "meta", "link", "noscript", "template",
];

/// Strings reader services emit instead of content when the upstream blocked them.
const BOT_WALL_MARKERS: &[&str] = &[
    "warning: target url returned error",
    "captcha",
    "403: forbidden",
    "403 forbidden",
    "access denied",
    "verify you are human",
    "just a moment...",
];

/// Header lines reader services put before the body.
const READER_HEADER_PREFIXES: &[&str] = &[
    "Title:",
    "URL Source:",
    "Published Time:",
    "Markdown Content:",
];

static MOUNT_POINTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#root, #app, #__next, #__nuxt, #svelte, #main-app")
        .expect("mount point selector is valid")
});

static HYDRATION_MARKERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[data-reactroot], [data-server-rendered], [ng-version], [data-v-app]")
        .expect("hydration selector is valid")
});

/// Apply the validators that fit the candidate's kind.
pub fn validate(candidate: &CandidateContent, min_length: usize) -> Result<(), Rejection> {
    match candidate.kind {
        ContentKind::Html => {
            check_min_length(&candidate.body, min_length)?;
            detect_spa_shell(&candidate.body)
        }
        ContentKind::Text => detect_bot_wall(&candidate.body, min_length),
    }
}

/// Reject payloads of `min` characters or fewer.
pub fn check_min_length(body: &str, min: usize) -> Result<(), Rejection> {
    let len = body.chars().count();
    if len <= min {
        return Err(Rejection::TooShort { len, min });
    }
    Ok(())
}

/// Reject HTML that is only a client-side application waiting to render.
pub fn detect_spa_shell(html: &str) -> Result<(), Rejection> {
    let doc = Html::parse_document(html);
    let visible = visible_text(doc.root_element());
    let visible_len = visible.chars().count();

    if visible_len < SHELL_MIN_VISIBLE_CHARS {
        return Err(Rejection::SpaShell(format!(
            "only {visible_len} chars of visible text"
        )));
    }

    if let Some(el) = doc
        .select(&HYDRATION_MARKERS)
        .find(|el| visible_text(*el).is_empty())
    {
        return Err(Rejection::SpaShell(format!(
            "empty hydration root <{}>",
            el.value().name()
        )));
    }

    if visible_len < MOUNT_POINT_MAX_VISIBLE_CHARS
        && let Some(el) = doc
            .select(&MOUNT_POINTS)
            .find(|el| visible_text(*el).is_empty())
    {
        return Err(Rejection::SpaShell(format!(
            "empty mount point #{}",
            el.value().id().unwrap_or_default()
        )));
    }

    Ok(())
}

/// Reject reader-service output that is an error notice or interstitial.
pub fn detect_bot_wall(text: &str, min: usize) -> Result<(), Rejection> {
    let trimmed = text.trim();
    check_min_length(trimmed, min)?;

    let lower = trimmed.to_lowercase();
    if let Some(marker) = BOT_WALL_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(Rejection::BotWall(format!("found \"{marker}\"")));
    }

    let body_len = strip_reader_header(trimmed).chars().count();
    if body_len <= min {
        return Err(Rejection::BotWall(format!(
            "only {body_len} chars after the title header"
        )));
    }

    Ok(())
}

/// Text under `root`, skipping invisible elements, with whitespace runs collapsed.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut words: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| INVISIBLE_TAGS.contains(&e.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

/// Drop the leading `Title:` / `URL Source:` / separator lines of reader output.
fn strip_reader_header(text: &str) -> &str {
    let mut rest = text;
    loop {
        let (line, tail) = match rest.split_once('\n') {
            Some((line, tail)) => (line, tail),
            None => (rest, ""),
        };
        let line = line.trim();
        let is_header = line.is_empty()
            || READER_HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
            || is_separator(line);
        if !is_header || rest.is_empty() {
            return rest.trim();
        }
        rest = tail;
    }
}

fn is_separator(line: &str) -> bool {
    line.len() >= 3 && (line.chars().all(|c| c == '=') || line.chars().all(|c| c == '-'))
}
