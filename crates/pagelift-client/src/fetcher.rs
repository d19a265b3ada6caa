use std::time::Duration;

use pagelift_core::config::PipelineConfig;
use pagelift_core::error::AppError;
use pagelift_core::models::FetchRequest;
use pagelift_core::traits::Fetcher;
use reqwest::Client;

/// Upper bound on a single request. Strategies enforce their own, shorter
/// deadlines on top of this.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

const ACCEPT: &str = "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8";

/// HTTP fetcher using reqwest.
///
/// Sends GET requests with the configured User-Agent plus any per-request
/// headers and returns the body text of 2xx responses.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::build(pagelift_core::config::DEFAULT_USER_AGENT, CLIENT_TIMEOUT)
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, AppError> {
        Self::build(&config.user_agent, CLIENT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Self::build(pagelift_core::config::DEFAULT_USER_AGENT, timeout)
    }

    fn build(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, AppError> {
        let mut builder = self
            .client
            .get(&request.url)
            .header(reqwest::header::ACCEPT, ACCEPT);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_ms)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %request.url, status = status.as_u16(), "Non-success response");
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                request.url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}
