use url::Url;

use crate::error::AppError;

/// Check that `url` is an absolute http(s) URL with a host.
pub fn validate_target_url(url: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::InvalidUrl(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::InvalidUrl(format!("{url}: URL has no host")));
    }

    Ok(parsed)
}

/// Derive a display title for a scraped page.
///
/// Uses the first level-1 heading after the provenance block, falling back
/// to the URL's host name and finally to the URL itself. Lines inside fenced
/// code blocks are never headings.
/// Example: `"# Rust 2024\n..."` → `"Rust 2024"`
pub fn derive_title(markdown: &str, url: &str) -> String {
    first_heading(skip_provenance(markdown))
        .or_else(|| {
            Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
        })
        .unwrap_or_else(|| url.to_string())
}

fn first_heading(markdown: &str) -> Option<String> {
    let mut open_fence: Option<&str> = None;
    for line in markdown.lines() {
        let line = line.trim_start();
        if let Some(fence) = ["```", "~~~"].into_iter().find(|f| line.starts_with(f)) {
            open_fence = match open_fence {
                None => Some(fence),
                Some(open) if open == fence => None,
                still_open => still_open,
            };
            continue;
        }
        if open_fence.is_some() {
            continue;
        }
        if let Some(title) = line.strip_prefix("# ").map(str::trim)
            && !title.is_empty()
        {
            return Some(title.to_string());
        }
    }
    None
}

fn skip_provenance(markdown: &str) -> &str {
    let Some(rest) = markdown.strip_prefix("---\n") else {
        return markdown;
    };
    match rest.find("\n---\n") {
        Some(end) => &rest[end + "\n---\n".len()..],
        None => markdown,
    }
}
