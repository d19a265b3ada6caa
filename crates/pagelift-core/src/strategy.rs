//! The ordered catalogue of acquisition strategies.
//!
//! Each strategy is plain data: which service to ask, how long to wait and how
//! much content counts as "real". Executing one issues one or two requests
//! through a [`Fetcher`] and returns the raw payload without judging it; the
//! pipeline runs the validators afterwards.
//!
//! | # | name             | path                                              |
//! |---|------------------|---------------------------------------------------|
//! | 1 | `allorigins`     | JSON envelope proxy                               |
//! | 2 | `corsproxy`      | raw proxy                                         |
//! | 3 | `codetabs`       | raw proxy                                         |
//! | 4 | `jina-reader`    | JS-rendering reader, returns Markdown-like text   |
//! | 5 | `google-cache`   | search cache, through the envelope proxy          |
//! | 6 | `wayback`        | availability lookup, then snapshot via envelope   |
//! | 7 | `12ft`           | paywall bypass, through the envelope proxy        |
//! | 8 | `allorigins-raw` | envelope proxy's raw endpoint                     |

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{CandidateContent, FetchRequest};
use crate::traits::Fetcher;

const DIRECT_PROXY_TIMEOUT: Duration = Duration::from_secs(10);
const READER_TIMEOUT: Duration = Duration::from_secs(25);
const CACHE_TIMEOUT: Duration = Duration::from_secs(15);
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(20);
const BYPASS_TIMEOUT: Duration = Duration::from_secs(20);
const LAST_RESORT_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum raw length for HTML fetched through a direct proxy.
pub const PROXY_MIN_LENGTH: usize = 200;
/// Minimum raw length for HTML that went through a nested hop.
pub const NESTED_MIN_LENGTH: usize = 300;
/// Minimum text length for reader-service output.
pub const READER_MIN_LENGTH: usize = 100;

/// Seconds the reader service may wait for the page to settle.
const READER_SERVER_WAIT_SECS: u32 = 10;

/// Where a nested strategy sends the envelope proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerTarget {
    /// `{base}/search?q=cache:<url>`
    SearchCache { base: String },
    /// `{base}/<url>`
    PathPrefixed { base: String },
}

impl InnerTarget {
    fn url_for(&self, target: &str) -> Result<String, AppError> {
        match self {
            InnerTarget::SearchCache { base } => {
                let query = format!("cache:{target}");
                with_params(&format!("{base}/search"), &[("q", query.as_str())])
            }
            InnerTarget::PathPrefixed { base } => Ok(format!("{base}/{target}")),
        }
    }
}

/// How a strategy obtains its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `{proxy}/get?url=<url>` answering `{"contents": ..., "status": {...}}`.
    Envelope { proxy: String },
    /// `{endpoint}?{param}=<url>` answering the page HTML as-is.
    Raw { endpoint: String, param: &'static str },
    /// `{base}/<url>` answering pre-rendered Markdown-like text.
    Reader {
        base: String,
        api_key: Option<String>,
    },
    /// The envelope proxy pointed at another service's view of the page.
    Nested { proxy: String, inner: InnerTarget },
    /// Resolve the closest archived snapshot, then fetch it through the proxy.
    Archive { archive: String, proxy: String },
}

/// One entry of the cascade.
#[derive(Debug, Clone)]
pub struct AcquisitionStrategy {
    pub name: &'static str,
    pub method: Method,
    /// Budget for the whole attempt, inner hops included.
    pub timeout: Duration,
    /// Payloads at or below this many characters are rejected.
    pub min_length: usize,
}

impl AcquisitionStrategy {
    /// Run this strategy once for `url`.
    pub async fn execute<F: Fetcher>(
        &self,
        fetcher: &F,
        url: &str,
    ) -> Result<CandidateContent, AppError> {
        match &self.method {
            Method::Envelope { proxy } => fetch_envelope(fetcher, proxy, url).await,
            Method::Raw { endpoint, param } => {
                let request = FetchRequest::get(with_params(endpoint, &[(*param, url)])?);
                let body = fetcher.fetch(&request).await?;
                Ok(CandidateContent::html(body))
            }
            Method::Reader { base, api_key } => {
                let mut request = FetchRequest::get(format!("{base}/{url}"))
                    .header("X-Return-Format", "markdown")
                    .header("X-Timeout", READER_SERVER_WAIT_SECS.to_string());
                if let Some(key) = api_key {
                    request = request.header("Authorization", format!("Bearer {key}"));
                }
                let body = fetcher.fetch(&request).await?;
                Ok(CandidateContent::text(body))
            }
            Method::Nested { proxy, inner } => {
                let inner_url = inner.url_for(url)?;
                fetch_envelope(fetcher, proxy, &inner_url).await
            }
            Method::Archive { archive, proxy } => {
                let snapshot = resolve_snapshot(fetcher, archive, url).await?;
                tracing::debug!(%snapshot, "Resolved archived snapshot");
                fetch_envelope(fetcher, proxy, &snapshot).await
            }
        }
    }
}

/// Build the eight-strategy cascade in priority order.
pub fn catalogue(config: &PipelineConfig) -> Vec<AcquisitionStrategy> {
    let ep = &config.endpoints;
    let scaled = |d: Duration| {
        Duration::try_from_secs_f64(d.as_secs_f64() * config.timeout_scale).unwrap_or(Duration::MAX)
    };

    vec![
        AcquisitionStrategy {
            name: "allorigins",
            method: Method::Envelope {
                proxy: ep.allorigins.clone(),
            },
            timeout: scaled(DIRECT_PROXY_TIMEOUT),
            min_length: PROXY_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "corsproxy",
            method: Method::Raw {
                endpoint: format!("{}/", ep.corsproxy),
                param: "url",
            },
            timeout: scaled(DIRECT_PROXY_TIMEOUT),
            min_length: PROXY_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "codetabs",
            method: Method::Raw {
                endpoint: format!("{}/v1/proxy", ep.codetabs),
                param: "quest",
            },
            timeout: scaled(DIRECT_PROXY_TIMEOUT),
            min_length: PROXY_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "jina-reader",
            method: Method::Reader {
                base: ep.jina.clone(),
                api_key: config.reader_api_key.clone(),
            },
            timeout: scaled(READER_TIMEOUT),
            min_length: READER_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "google-cache",
            method: Method::Nested {
                proxy: ep.allorigins.clone(),
                inner: InnerTarget::SearchCache {
                    base: ep.google_cache.clone(),
                },
            },
            timeout: scaled(CACHE_TIMEOUT),
            min_length: NESTED_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "wayback",
            method: Method::Archive {
                archive: ep.wayback.clone(),
                proxy: ep.allorigins.clone(),
            },
            timeout: scaled(ARCHIVE_TIMEOUT),
            min_length: NESTED_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "12ft",
            method: Method::Nested {
                proxy: ep.allorigins.clone(),
                inner: InnerTarget::PathPrefixed {
                    base: ep.twelve_ft.clone(),
                },
            },
            timeout: scaled(BYPASS_TIMEOUT),
            min_length: NESTED_MIN_LENGTH,
        },
        AcquisitionStrategy {
            name: "allorigins-raw",
            method: Method::Raw {
                endpoint: format!("{}/raw", ep.allorigins),
                param: "url",
            },
            timeout: scaled(LAST_RESORT_TIMEOUT),
            min_length: PROXY_MIN_LENGTH,
        },
    ]
}

// ---- Envelope proxy ----

#[derive(Deserialize)]
struct ProxyEnvelope {
    contents: Option<String>,
    #[serde(default)]
    status: Option<EnvelopeStatus>,
}

#[derive(Deserialize)]
struct EnvelopeStatus {
    http_code: Option<u16>,
}

async fn fetch_envelope<F: Fetcher>(
    fetcher: &F,
    proxy: &str,
    target: &str,
) -> Result<CandidateContent, AppError> {
    let request = FetchRequest::get(with_params(&format!("{proxy}/get"), &[("url", target)])?);
    let body = fetcher.fetch(&request).await?;
    let html = decode_envelope(&body, target)?;
    Ok(CandidateContent::html(html))
}

/// Pull the page out of an envelope, surfacing an inner-hop failure as an error.
fn decode_envelope(body: &str, target: &str) -> Result<String, AppError> {
    let envelope: ProxyEnvelope = serde_json::from_str(body)?;

    if let Some(code) = envelope.status.and_then(|s| s.http_code)
        && !(200..300).contains(&code)
    {
        return Err(AppError::HttpError(format!(
            "Proxied HTTP {code} for {target}"
        )));
    }

    envelope
        .contents
        .ok_or_else(|| AppError::HttpError(format!("Proxy returned no contents for {target}")))
}

// ---- Archive lookup ----

#[derive(Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Deserialize, Default)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Deserialize)]
struct Snapshot {
    available: Option<bool>,
    url: String,
}

async fn resolve_snapshot<F: Fetcher>(
    fetcher: &F,
    archive: &str,
    target: &str,
) -> Result<String, AppError> {
    let request = FetchRequest::get(with_params(
        &format!("{archive}/wayback/available"),
        &[("url", target)],
    )?);
    let body = fetcher.fetch(&request).await?;
    let availability: AvailabilityResponse = serde_json::from_str(&body)?;

    match availability.archived_snapshots.closest {
        Some(snapshot) if snapshot.available != Some(false) && !snapshot.url.is_empty() => {
            Ok(upgrade_archive_scheme(snapshot.url))
        }
        _ => Err(AppError::NoSnapshot(target.to_string())),
    }
}

/// The availability API hands out `http://` snapshot links; the archive serves them over TLS.
fn upgrade_archive_scheme(url: String) -> String {
    match url.strip_prefix("http://web.archive.org/") {
        Some(rest) => format!("https://web.archive.org/{rest}"),
        None => url,
    }
}

fn with_params(base: &str, params: &[(&str, &str)]) -> Result<String, AppError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| AppError::InvalidUrl(format!("{base}: {e}")))
}
