use pagelift_client::{HtmdCleaner, ReqwestFetcher};
use pagelift_core::error::AppError;
use pagelift_core::{PipelineConfig, ScrapePipeline};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub pipeline: ScrapePipeline<ReqwestFetcher, HtmdCleaner>,
    /// API key protecting `/v1/*` (None = open access).
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(config: &PipelineConfig, api_key: Option<String>) -> Result<Self, AppError> {
        let fetcher = ReqwestFetcher::from_config(config)?;
        Ok(Self {
            pipeline: ScrapePipeline::new(fetcher, HtmdCleaner::new(), config),
            api_key,
        })
    }
}
