use url::Url;

use crate::error::AppError;

pub const DEFAULT_ALLORIGINS_URL: &str = "https://api.allorigins.win";
pub const DEFAULT_CORSPROXY_URL: &str = "https://corsproxy.io";
pub const DEFAULT_CODETABS_URL: &str = "https://api.codetabs.com";
pub const DEFAULT_JINA_URL: &str = "https://r.jina.ai";
pub const DEFAULT_GOOGLE_CACHE_URL: &str = "https://webcache.googleusercontent.com";
pub const DEFAULT_WAYBACK_URL: &str = "https://archive.org";
pub const DEFAULT_TWELVE_FT_URL: &str = "https://12ft.io";
/// Largest accepted timeout multiplier.
pub const MAX_TIMEOUT_SCALE: f64 = 1000.0;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; pagelift/0.1; +https://github.com/pagelift)";

/// Base URLs of the third-party services the strategies talk to.
///
/// Stored without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub allorigins: String,
    pub corsproxy: String,
    pub codetabs: String,
    pub jina: String,
    pub google_cache: String,
    pub wayback: String,
    pub twelve_ft: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            allorigins: DEFAULT_ALLORIGINS_URL.to_string(),
            corsproxy: DEFAULT_CORSPROXY_URL.to_string(),
            codetabs: DEFAULT_CODETABS_URL.to_string(),
            jina: DEFAULT_JINA_URL.to_string(),
            google_cache: DEFAULT_GOOGLE_CACHE_URL.to_string(),
            wayback: DEFAULT_WAYBACK_URL.to_string(),
            twelve_ft: DEFAULT_TWELVE_FT_URL.to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// Give every service its own sub-path below `base` (used with a local stub server).
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            allorigins: format!("{base}/allorigins"),
            corsproxy: format!("{base}/corsproxy"),
            codetabs: format!("{base}/codetabs"),
            jina: format!("{base}/jina"),
            google_cache: format!("{base}/google-cache"),
            wayback: format!("{base}/wayback"),
            twelve_ft: format!("{base}/12ft"),
        }
    }
}

/// Configuration for building the strategy cascade.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoints: ServiceEndpoints,
    pub user_agent: String,
    /// Optional key for the reader service; raises its rate limit.
    pub reader_api_key: Option<String>,
    /// Multiplier applied to every per-strategy timeout.
    pub timeout_scale: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            reader_api_key: None,
            timeout_scale: 1.0,
        }
    }
}

impl PipelineConfig {
    /// Read configuration from environment variables.
    ///
    /// - `PAGELIFT_ALLORIGINS_URL`, `PAGELIFT_CORSPROXY_URL`, `PAGELIFT_CODETABS_URL`,
    ///   `PAGELIFT_JINA_URL`, `PAGELIFT_GOOGLE_CACHE_URL`, `PAGELIFT_WAYBACK_URL`,
    ///   `PAGELIFT_TWELVE_FT_URL` (optional service overrides)
    /// - `PAGELIFT_USER_AGENT` (optional)
    /// - `PAGELIFT_JINA_API_KEY` (optional)
    /// - `PAGELIFT_TIMEOUT_SCALE` (optional, positive number, defaults to 1)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let endpoint = |key: &str, default: &str| -> Result<String, AppError> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                None => Ok(default.to_string()),
                Some(raw) => {
                    let raw = raw.trim();
                    Url::parse(raw).map_err(|e| {
                        AppError::ConfigError(format!("Invalid {key} '{raw}': {e}"))
                    })?;
                    Ok(raw.trim_end_matches('/').to_string())
                }
            }
        };

        let endpoints = ServiceEndpoints {
            allorigins: endpoint("PAGELIFT_ALLORIGINS_URL", DEFAULT_ALLORIGINS_URL)?,
            corsproxy: endpoint("PAGELIFT_CORSPROXY_URL", DEFAULT_CORSPROXY_URL)?,
            codetabs: endpoint("PAGELIFT_CODETABS_URL", DEFAULT_CODETABS_URL)?,
            jina: endpoint("PAGELIFT_JINA_URL", DEFAULT_JINA_URL)?,
            google_cache: endpoint("PAGELIFT_GOOGLE_CACHE_URL", DEFAULT_GOOGLE_CACHE_URL)?,
            wayback: endpoint("PAGELIFT_WAYBACK_URL", DEFAULT_WAYBACK_URL)?,
            twelve_ft: endpoint("PAGELIFT_TWELVE_FT_URL", DEFAULT_TWELVE_FT_URL)?,
        };

        let user_agent = lookup("PAGELIFT_USER_AGENT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let reader_api_key = lookup("PAGELIFT_JINA_API_KEY").filter(|v| !v.trim().is_empty());

        let timeout_scale = match lookup("PAGELIFT_TIMEOUT_SCALE") {
            None => 1.0,
            Some(raw) => {
                let parsed: f64 = raw.trim().parse().map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid PAGELIFT_TIMEOUT_SCALE '{raw}': must be a positive number"
                    ))
                })?;
                check_timeout_scale(parsed)?
            }
        };

        Ok(Self {
            endpoints,
            user_agent,
            reader_api_key,
            timeout_scale,
        })
    }

    pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Fails with [`AppError::ConfigError`] unless `0 < scale <= MAX_TIMEOUT_SCALE`.
    pub fn with_timeout_scale(mut self, scale: f64) -> Result<Self, AppError> {
        self.timeout_scale = check_timeout_scale(scale)?;
        Ok(self)
    }

    pub fn with_reader_api_key(mut self, key: impl Into<String>) -> Self {
        self.reader_api_key = Some(key.into());
        self
    }
}

fn check_timeout_scale(scale: f64) -> Result<f64, AppError> {
    if !scale.is_finite() || scale <= 0.0 || scale > MAX_TIMEOUT_SCALE {
        return Err(AppError::ConfigError(format!(
            "PAGELIFT_TIMEOUT_SCALE must be greater than 0 and at most {MAX_TIMEOUT_SCALE}, got {scale}"
        )));
    }
    Ok(scale)
}
