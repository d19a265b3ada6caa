use std::sync::{Arc, LazyLock};

use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use pagelift_core::error::AppError;
use pagelift_core::traits::Cleaner;
use scraper::{ElementRef, Html, Selector};

/// Elements that never carry article content.
const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "template",
    "iframe",
    "svg",
    "nav",
    "footer",
    "body > header",
    "aside",
    "form",
    "button",
    "input",
    "select",
    "textarea",
    "dialog",
    "[role=\"navigation\"]",
    "[role=\"banner\"]",
    "[role=\"contentinfo\"]",
    "[role=\"complementary\"]",
    "[role=\"search\"]",
    "[role=\"dialog\"]",
    "[aria-hidden=\"true\"]",
    ".sidebar",
    ".advertisement",
    ".ad",
    ".ads",
    ".cookie-banner",
    ".cookie-consent",
    ".popup",
    ".modal",
    ".overlay",
    ".newsletter",
    ".share",
    ".social-share",
    ".related-posts",
    ".comments",
    ".paywall",
];

/// Candidate content roots, most specific first.
const CONTENT_ROOT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".article-body",
    "#content",
    ".content",
];

static NOISE: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_all(NOISE_SELECTORS));
static CONTENT_ROOTS: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_all(CONTENT_ROOT_SELECTORS));
static BODY: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("body").ok());

fn parse_all(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

/// HTML-to-Markdown cleaner using scraper and htmd.
///
/// Removes page chrome (navigation, ads, cookie banners, forms and the like),
/// narrows the document to its main content element and renders that as
/// Markdown with ATX headings, fenced code, dash bullets and inline links.
pub struct HtmdCleaner {
    converter: Arc<HtmlToMarkdown>,
}

impl Clone for HtmdCleaner {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
        }
    }
}

impl HtmdCleaner {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .options(Options {
                heading_style: HeadingStyle::Atx,
                code_block_style: CodeBlockStyle::Fenced,
                bullet_list_marker: BulletListMarker::Dash,
                link_style: LinkStyle::Inlined,
                ..Default::default()
            })
            .skip_tags(vec!["script", "style", "noscript", "template", "iframe", "svg"])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }
}

impl Default for HtmdCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner for HtmdCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let content = extract_content(html);
        self.converter
            .convert(&content)
            .map_err(|e| AppError::CleanerError(e.to_string()))
    }
}

/// Strip noise elements and return the HTML of the main content root.
///
/// Falls back to the body, then to the whole document, when no content
/// root with text survives the strip.
fn extract_content(html: &str) -> String {
    let mut doc = Html::parse_document(html);

    let noise: Vec<_> = NOISE
        .iter()
        .flat_map(|selector| doc.select(selector).map(|el| el.id()).collect::<Vec<_>>())
        .collect();
    for id in noise {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    if let Some(root) = CONTENT_ROOTS
        .iter()
        .find_map(|selector| doc.select(selector).find(has_text))
    {
        return root.html();
    }

    match BODY.as_ref().and_then(|body| doc.select(body).next()) {
        Some(body) => body.inner_html(),
        None => doc.root_element().html(),
    }
}

fn has_text(element: &ElementRef) -> bool {
    element.text().any(|t| !t.trim().is_empty())
}
