use chrono::Utc;

use crate::assembler::assemble;
use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{CandidateContent, LayerState, ScrapeResult};
use crate::normalize::Normalizer;
use crate::progress::LayerTracker;
use crate::strategy::{AcquisitionStrategy, catalogue};
use crate::traits::{Cleaner, Fetcher, ProgressReporter};
use crate::util::validate_target_url;
use crate::validate::validate;

/// Orchestrates the retrieval cascade: try → validate → normalize → assemble.
///
/// Strategies run strictly one after another. The first payload that passes
/// validation wins; every failure, timeout or rejection just moves on to the
/// next strategy. Generic over the transport and the HTML cleaner so the whole
/// cascade can be exercised without real HTTP.
pub struct ScrapePipeline<F, C>
where
    F: Fetcher,
    C: Cleaner,
{
    fetcher: F,
    normalizer: Normalizer<C>,
    strategies: Vec<AcquisitionStrategy>,
}

impl<F, C> ScrapePipeline<F, C>
where
    F: Fetcher,
    C: Cleaner,
{
    /// Create a pipeline with the standard strategy catalogue.
    pub fn new(fetcher: F, cleaner: C, config: &PipelineConfig) -> Self {
        Self::with_strategies(fetcher, cleaner, catalogue(config))
    }

    /// Create a pipeline with a custom, ordered strategy list.
    pub fn with_strategies(fetcher: F, cleaner: C, strategies: Vec<AcquisitionStrategy>) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(cleaner),
            strategies,
        }
    }

    pub fn strategies(&self) -> &[AcquisitionStrategy] {
        &self.strategies
    }

    /// Retrieve `url` and convert it to Markdown.
    ///
    /// `reporter` receives the full layer list after every transition.
    /// Fails with [`AppError::Exhausted`] when no strategy produced usable
    /// content, or [`AppError::InvalidUrl`] before anything runs.
    pub async fn run<R>(&self, url: &str, reporter: &R) -> Result<ScrapeResult, AppError>
    where
        R: ProgressReporter + ?Sized,
    {
        validate_target_url(url)?;
        tracing::info!(%url, strategies = self.strategies.len(), "Starting retrieval");

        let mut tracker = LayerTracker::new(self.strategies.iter().map(|s| s.name), reporter);

        for (position, strategy) in self.strategies.iter().enumerate() {
            let index = position + 1;
            tracker.mark(position, LayerState::Trying);

            let outcome = match self.attempt(strategy, url).await {
                Ok(candidate) => {
                    let scraped_at = Utc::now();
                    self.normalizer
                        .normalize(&candidate, url, index, scraped_at)
                        .map(|markdown| (markdown, scraped_at))
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok((markdown, scraped_at)) => {
                    tracker.mark(position, LayerState::Success);
                    tracing::info!(
                        index,
                        strategy = strategy.name,
                        bytes = markdown.len(),
                        "Content accepted"
                    );
                    return Ok(assemble(
                        markdown,
                        index,
                        strategy.name,
                        scraped_at,
                        tracker.snapshot(),
                    ));
                }
                Err(e) => {
                    if e.is_rejection() {
                        tracing::debug!(index, strategy = strategy.name, error = %e, "Content rejected");
                    } else {
                        tracing::debug!(index, strategy = strategy.name, error = %e, "Attempt failed");
                    }
                    tracker.mark(position, LayerState::Failed);
                }
            }
        }

        tracing::warn!(%url, "Every strategy failed");
        Err(AppError::Exhausted {
            url: url.to_string(),
            attempted: self.strategies.len(),
        })
    }

    /// One bounded attempt: execute under the strategy's timeout, then validate.
    async fn attempt(
        &self,
        strategy: &AcquisitionStrategy,
        url: &str,
    ) -> Result<CandidateContent, AppError> {
        let candidate =
            match tokio::time::timeout(strategy.timeout, strategy.execute(&self.fetcher, url)).await
            {
                Ok(result) => result?,
                Err(_) => return Err(AppError::Timeout(strategy.timeout.as_millis() as u64)),
            };

        tracing::debug!(
            strategy = strategy.name,
            chars = candidate.body.chars().count(),
            "Validating candidate"
        );
        validate(&candidate, strategy.min_length)?;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ServiceEndpoints;
    use crate::models::{LayerStatus, ProgressSnapshot};
    use crate::testutil::*;

    const TARGET: &str = "https://example.com/article";

    fn pipeline(fetcher: MockFetcher) -> ScrapePipeline<MockFetcher, MockCleaner> {
        let config = PipelineConfig::default().with_endpoints(ServiceEndpoints::under("http://stub"));
        ScrapePipeline::new(fetcher, MockCleaner::passthrough(), &config)
    }

    fn envelope(html: &str) -> Result<String, AppError> {
        Ok(serde_json::json!({ "contents": html, "status": { "http_code": 200 } }).to_string())
    }

    fn states(layers: &[LayerStatus]) -> Vec<LayerState> {
        layers.iter().map(|l| l.state).collect()
    }

    #[tokio::test]
    async fn first_strategy_success_stops_the_cascade() {
        let fetcher =
            MockFetcher::new().respond("http://stub/allorigins/get", envelope(&article_html(5000)));
        let reporter = RecordingReporter::new();

        let result = pipeline(fetcher.clone()).run(TARGET, &reporter).await.unwrap();

        assert_eq!(result.strategy_index_used, 1);
        assert_eq!(result.strategy_name, "allorigins");
        assert!(result.markdown.contains("\nlayers_tried: 1\n"));
        assert!(result.markdown.starts_with(&format!("---\nsource: {TARGET}\n")));
        assert_eq!(fetcher.requests().len(), 1);

        let snapshots = reporter.snapshots();
        assert_eq!(snapshots.len(), 2);
        let last = snapshots.last().unwrap();
        assert_eq!(last[0].state, LayerState::Success);
        assert!(last[1..].iter().all(|l| l.state == LayerState::Pending));
        assert_eq!(states(&result.layers), states(last));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_short_page_then_valid_article() {
        let fetcher = MockFetcher::new()
            .respond_after(
                "http://stub/allorigins/get",
                Duration::from_secs(60),
                envelope(&article_html(5000)),
            )
            .respond("http://stub/corsproxy/", Ok("<html>Error: rate limited, retry</html>".into()))
            .respond("http://stub/codetabs/", Ok(article_html(1200)));
        let reporter = RecordingReporter::new();

        let result = pipeline(fetcher).run(TARGET, &reporter).await.unwrap();

        assert_eq!(result.strategy_index_used, 3);
        assert!(result.markdown.contains("\nlayers_tried: 3\n"));

        let snapshots = reporter.snapshots();
        // trying/failed for 1 and 2, trying/success for 3
        assert_eq!(snapshots.len(), 6);
        assert_eq!(
            states(snapshots.last().unwrap()),
            vec![
                LayerState::Failed,
                LayerState::Failed,
                LayerState::Success,
                LayerState::Pending,
                LayerState::Pending,
                LayerState::Pending,
                LayerState::Pending,
                LayerState::Pending,
            ]
        );
        let touched: Vec<usize> = snapshots
            .iter()
            .flat_map(|s| s.iter().filter(|l| l.state != LayerState::Pending).map(|l| l.index))
            .collect();
        assert!(touched.iter().all(|i| (1..=3).contains(i)));
    }

    #[tokio::test]
    async fn all_strategies_failing_is_exhaustion() {
        let reporter = RecordingReporter::new();

        let err = pipeline(MockFetcher::new())
            .run(TARGET, &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Exhausted { attempted: 8, .. }));
        let snapshots = reporter.snapshots();
        assert_eq!(snapshots.len(), 16);
        assert!(
            snapshots
                .last()
                .unwrap()
                .iter()
                .all(|l| l.state == LayerState::Failed)
        );
    }

    #[tokio::test]
    async fn reader_bot_wall_is_rejected_despite_transport_success() {
        let wall = format!(
            "Title: Blocked\n\nWarning: Target URL returned error 403: Forbidden\n\n{}",
            "Padding text to get past the length limit. ".repeat(5)
        );
        let fetcher = MockFetcher::new()
            .respond("http://stub/jina/", Ok(wall))
            .respond("http://stub/wayback/", Ok(r#"{"archived_snapshots":{}}"#.into()))
            .respond("http://stub/allorigins/raw", Ok(article_html(800)));
        let reporter = RecordingReporter::new();

        let result = pipeline(fetcher).run(TARGET, &reporter).await.unwrap();

        assert_eq!(result.strategy_index_used, 8);
        assert!(
            result.layers[..7]
                .iter()
                .all(|l| l.state == LayerState::Failed)
        );
    }

    #[tokio::test]
    async fn reader_text_is_used_verbatim() {
        let text = format!(
            "Title: Hydrated App\n\nMarkdown Content:\n# Hydrated App\n\n{}",
            "Client-rendered prose. ".repeat(20)
        );
        let fetcher = MockFetcher::new().respond("http://stub/jina/", Ok(format!("\n{text}\n")));
        let pipeline = ScrapePipeline::new(
            fetcher,
            MockCleaner::with_error(AppError::CleanerError("not for text".into())),
            &PipelineConfig::default().with_endpoints(ServiceEndpoints::under("http://stub")),
        );

        let result = pipeline.run(TARGET, &|_: ProgressSnapshot| {}).await.unwrap();

        assert_eq!(result.strategy_index_used, 4);
        assert!(result.markdown.ends_with(&format!("---\n\n{}", text.trim())));
    }

    #[tokio::test]
    async fn cleaner_failure_moves_on_to_next_strategy() {
        let fetcher = MockFetcher::new()
            .respond("http://stub/allorigins/get", envelope(&article_html(1000)))
            .respond("http://stub/corsproxy/", Ok(article_html(1000)));
        let pipeline = ScrapePipeline::new(
            fetcher,
            MockCleaner::with_error(AppError::CleanerError("bad html".into())),
            &PipelineConfig::default().with_endpoints(ServiceEndpoints::under("http://stub")),
        );

        let result = pipeline.run(TARGET, &|_: ProgressSnapshot| {}).await.unwrap();
        assert_eq!(result.strategy_index_used, 2);
    }

    #[tokio::test]
    async fn page_rendering_to_nothing_moves_on_to_next_strategy() {
        let fetcher = MockFetcher::new()
            .respond("http://stub/allorigins/get", envelope(&article_html(1000)))
            .respond("http://stub/corsproxy/", Ok(article_html(1000)));
        let pipeline = ScrapePipeline::new(
            fetcher,
            MockCleaner::returning("\n  \n"),
            &PipelineConfig::default().with_endpoints(ServiceEndpoints::under("http://stub")),
        );
        let reporter = RecordingReporter::new();

        let result = pipeline.run(TARGET, &reporter).await.unwrap();

        assert_eq!(result.strategy_index_used, 2);
        assert_eq!(result.layers[0].state, LayerState::Failed);
        assert!(result.markdown.contains("Article Title"));
    }

    #[tokio::test]
    async fn word_count_and_read_time_cover_whole_document() {
        let fetcher =
            MockFetcher::new().respond("http://stub/allorigins/get", envelope(&article_html(5000)));

        let result = pipeline(fetcher).run(TARGET, &|_: ProgressSnapshot| {}).await.unwrap();

        assert_eq!(result.word_count, result.markdown.split_whitespace().count());
        assert_eq!(result.read_time, result.word_count.div_ceil(200));
        assert!(result.read_time >= 1);
    }

    #[tokio::test]
    async fn invalid_url_fails_before_any_strategy() {
        let fetcher = MockFetcher::new();
        let reporter = RecordingReporter::new();

        let err = pipeline(fetcher.clone())
            .run("ftp://example.com/file", &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidUrl(_)));
        assert!(reporter.snapshots().is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn reruns_start_from_the_first_strategy() {
        let fetcher = MockFetcher::new()
            .respond("http://stub/corsproxy/", Ok(article_html(1000)))
            .respond("http://stub/corsproxy/", Ok(article_html(1000)));
        let pipeline = pipeline(fetcher.clone());

        let first = pipeline.run(TARGET, &|_: ProgressSnapshot| {}).await.unwrap();
        let second = pipeline.run(TARGET, &|_: ProgressSnapshot| {}).await.unwrap();

        assert_eq!(first.strategy_index_used, 2);
        assert_eq!(second.strategy_index_used, 2);
        let envelope_calls = fetcher
            .requests()
            .iter()
            .filter(|r| r.url.starts_with("http://stub/allorigins/get"))
            .count();
        assert_eq!(envelope_calls, 2);
    }
}
