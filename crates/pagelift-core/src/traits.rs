use std::future::Future;

use crate::error::AppError;
use crate::models::{FetchRequest, HistoryEntry, ProgressSnapshot};

/// Performs a single HTTP GET and returns the response body.
///
/// Implementations map a non-success status to [`AppError::HttpError`],
/// connection failures to [`AppError::NetworkError`] and client-side
/// timeouts to [`AppError::Timeout`].
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, request: &FetchRequest)
    -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into a Markdown body.
///
/// Only the conversion is expected here; whitespace collapsing and the
/// provenance header are applied by [`crate::normalize::Normalizer`].
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// Receives a fresh snapshot of every layer after each state transition.
///
/// Called synchronously from the task driving the pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, snapshot: ProgressSnapshot);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    fn report(&self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}

/// Remembers which pages were scraped successfully.
pub trait HistoryStore: Send + Sync {
    fn record(&self, entry: &HistoryEntry) -> Result<(), AppError>;

    /// Most recent entries first.
    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, AppError>;
}

/// A no-op HistoryStore for use when persistence is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistory;

impl HistoryStore for NullHistory {
    fn record(&self, _entry: &HistoryEntry) -> Result<(), AppError> {
        Ok(())
    }

    fn recent(&self, _limit: usize) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(vec![])
    }
}
