use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pagelift_core::models::{LayerStatus, ScrapeResult};
use pagelift_core::strategy::AcquisitionStrategy;

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ScrapeRequest {
    /// Absolute http(s) URL of the page to retrieve.
    pub url: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LayerResponse {
    /// 1-based position in the cascade.
    pub index: usize,
    pub name: String,
    /// One of `pending`, `trying`, `success`, `failed`.
    pub state: String,
}

impl From<LayerStatus> for LayerResponse {
    fn from(layer: LayerStatus) -> Self {
        Self {
            index: layer.index,
            name: layer.name,
            state: layer.state.to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScrapeResponse {
    /// Markdown document, provenance header included.
    pub markdown: String,
    pub title: String,
    pub strategy_index_used: usize,
    pub strategy_name: String,
    pub word_count: usize,
    /// Estimated minutes to read.
    pub read_time: usize,
    pub scraped_at: DateTime<Utc>,
    pub layers: Vec<LayerResponse>,
}

impl ScrapeResponse {
    pub fn new(result: ScrapeResult, title: String) -> Self {
        Self {
            markdown: result.markdown,
            title,
            strategy_index_used: result.strategy_index_used,
            strategy_name: result.strategy_name,
            word_count: result.word_count,
            read_time: result.read_time,
            scraped_at: result.scraped_at,
            layers: result.layers.into_iter().map(LayerResponse::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StrategyResponse {
    pub index: usize,
    pub name: String,
    pub timeout_ms: u64,
    pub min_length: usize,
}

impl StrategyResponse {
    pub fn new(index: usize, strategy: &AcquisitionStrategy) -> Self {
        Self {
            index,
            name: strategy.name.to_string(),
            timeout_ms: strategy.timeout.as_millis() as u64,
            min_length: strategy.min_length,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StrategyListResponse {
    pub strategies: Vec<StrategyResponse>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
