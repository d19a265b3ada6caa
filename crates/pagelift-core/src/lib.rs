pub mod assembler;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod strategy;
pub mod traits;
pub mod util;
pub mod validate;

#[cfg(test)]
mod testutil;

pub use config::{PipelineConfig, ServiceEndpoints};
pub use error::{AppError, Rejection};
pub use models::{
    CandidateContent, ContentKind, FetchRequest, HistoryEntry, LayerState, LayerStatus,
    ProgressSnapshot, ScrapeResult,
};
pub use pipeline::ScrapePipeline;
pub use progress::TracingProgressReporter;
pub use strategy::{AcquisitionStrategy, catalogue};
pub use traits::{Cleaner, Fetcher, HistoryStore, NullHistory, ProgressReporter};
pub use util::derive_title;
