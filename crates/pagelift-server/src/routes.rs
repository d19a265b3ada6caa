use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pagelift_core::{TracingProgressReporter, derive_title};

use crate::auth::require_api_key;
use crate::dto::{
    HealthResponse, ScrapeRequest, ScrapeResponse, StrategyListResponse, StrategyResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/scrape", post(scrape))
        .route("/v1/strategies", get(list_strategies))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Page converted to Markdown", body = ScrapeResponse),
        (status = 400, description = "Invalid target URL", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Every retrieval strategy failed", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "scrape"
)]
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<ScrapeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .pipeline
        .run(&body.url, &TracingProgressReporter)
        .await?;

    let title = derive_title(&result.markdown, &body.url);
    tracing::info!(
        url = %body.url,
        strategy = %result.strategy_name,
        words = result.word_count,
        "Scrape complete"
    );

    Ok(axum::Json(ScrapeResponse::new(result, title)))
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/strategies",
    responses(
        (status = 200, description = "Strategies in the order they are tried", body = StrategyListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "scrape"
)]
pub async fn list_strategies(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let strategies = state
        .pipeline
        .strategies()
        .iter()
        .enumerate()
        .map(|(i, s)| StrategyResponse::new(i + 1, s))
        .collect();

    axum::Json(StrategyListResponse { strategies })
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> impl IntoResponse {
    axum::Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
