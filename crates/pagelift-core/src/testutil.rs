//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{FetchRequest, ProgressSnapshot};
use crate::traits::{Cleaner, Fetcher, ProgressReporter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

struct Stub {
    prefix: String,
    delay: Option<Duration>,
    response: Result<String, AppError>,
}

/// Mock fetcher answering by URL prefix.
///
/// Stubs are consumed in registration order: a request takes the first
/// unused stub whose prefix matches its URL. Requests with no stub left
/// fail with an HTTP 404 error.
#[derive(Clone, Default)]
pub struct MockFetcher {
    stubs: Arc<Mutex<VecDeque<Stub>>>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, prefix: &str, response: Result<String, AppError>) -> Self {
        self.push(prefix, None, response)
    }

    /// Like [`respond`](Self::respond), but only after sleeping for `delay`.
    pub fn respond_after(
        self,
        prefix: &str,
        delay: Duration,
        response: Result<String, AppError>,
    ) -> Self {
        self.push(prefix, Some(delay), response)
    }

    fn push(self, prefix: &str, delay: Option<Duration>, response: Result<String, AppError>) -> Self {
        self.stubs.lock().unwrap().push_back(Stub {
            prefix: prefix.to_string(),
            delay,
            response,
        });
        self
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        let stub = {
            let mut stubs = self.stubs.lock().unwrap();
            stubs
                .iter()
                .position(|s| request.url.starts_with(&s.prefix))
                .and_then(|pos| stubs.remove(pos))
        };

        match stub {
            Some(stub) => {
                if let Some(delay) = stub.delay {
                    tokio::time::sleep(delay).await;
                }
                stub.response
            }
            None => Err(AppError::HttpError(format!("HTTP 404 for {}", request.url))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockCleaner
// ---------------------------------------------------------------------------

/// Mock cleaner: replays queued outputs, then passes input through unchanged.
#[derive(Clone)]
pub struct MockCleaner {
    queued: Arc<Mutex<VecDeque<Result<String, AppError>>>>,
}

impl MockCleaner {
    /// Creates a cleaner that returns the input unchanged.
    pub fn passthrough() -> Self {
        Self {
            queued: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Creates a cleaner that fails once, then passes through.
    pub fn with_error(error: AppError) -> Self {
        Self {
            queued: Arc::new(Mutex::new(VecDeque::from([Err(error)]))),
        }
    }

    /// Creates a cleaner that returns `output` once, then passes through.
    pub fn returning(output: &str) -> Self {
        Self {
            queued: Arc::new(Mutex::new(VecDeque::from([Ok(output.to_string())]))),
        }
    }
}

impl Cleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        match self.queued.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(html.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Mock reporter that keeps every snapshot it receives.
#[derive(Default)]
pub struct RecordingReporter {
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, snapshot: ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A server-rendered article page with roughly `chars` characters of prose.
pub fn article_html(chars: usize) -> String {
    let sentence = "The quick brown fox jumps over the lazy dog again. ";
    let body = sentence.repeat(chars / sentence.len() + 1);
    format!(
        "<!DOCTYPE html><html><head><title>Article</title>\
         <script>window.analytics = {{}};</script><style>body {{ margin: 0 }}</style></head>\
         <body><nav><a href=\"/\">Home</a></nav>\
         <article><h1>Article Title</h1><p>{body}</p></article>\
         <footer>Copyright</footer></body></html>"
    )
}
