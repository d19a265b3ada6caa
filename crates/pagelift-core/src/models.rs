use std::sync::Arc;

use chrono::{DateTime, Utc};

/// State of one strategy within a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerState {
    Pending,
    Trying,
    Success,
    Failed,
}

impl std::fmt::Display for LayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerState::Pending => write!(f, "pending"),
            LayerState::Trying => write!(f, "trying"),
            LayerState::Success => write!(f, "success"),
            LayerState::Failed => write!(f, "failed"),
        }
    }
}

/// Progress record for one configured strategy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayerStatus {
    /// 1-based position in the strategy list.
    pub index: usize,
    pub name: String,
    pub state: LayerState,
}

/// Immutable view of every [`LayerStatus`] at one point in a run.
pub type ProgressSnapshot = Arc<[LayerStatus]>;

/// What kind of payload a strategy produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Raw HTML that still needs cleaning.
    Html,
    /// Text already rendered by an upstream reader service.
    Text,
}

/// Raw payload returned by a strategy, before validation.
#[derive(Debug, Clone)]
pub struct CandidateContent {
    pub kind: ContentKind,
    pub body: String,
}

impl CandidateContent {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Html,
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Text,
            body: body.into(),
        }
    }
}

/// A single outbound HTTP GET issued by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScrapeResult {
    /// Final Markdown, provenance header included.
    pub markdown: String,
    /// 1-based index of the strategy whose payload was accepted.
    pub strategy_index_used: usize,
    pub strategy_name: String,
    pub word_count: usize,
    /// Minutes, rounded up.
    pub read_time: usize,
    pub scraped_at: DateTime<Utc>,
    /// Progress snapshot at the moment the run finished.
    pub layers: Vec<LayerStatus>,
}

/// A `(url, title)` pair handed to history stores after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub scraped_at: DateTime<Utc>,
}
