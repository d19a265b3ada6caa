use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use wiremock::MockServer;

use pagelift_core::{PipelineConfig, ServiceEndpoints};
use pagelift_server::routes;
use pagelift_server::state::AppState;

pub const TEST_API_KEY: &str = "test-secret-key";

pub struct TestApp {
    pub router: Router,
    /// Stands in for every upstream service.
    pub upstream: MockServer,
}

/// Build the app with every upstream service routed to a local stub.
pub async fn setup_test_app() -> TestApp {
    setup(Some(TEST_API_KEY.to_string())).await
}

pub async fn setup_test_app_no_auth() -> TestApp {
    setup(None).await
}

async fn setup(api_key: Option<String>) -> TestApp {
    let upstream = MockServer::start().await;
    let config = PipelineConfig::default()
        .with_endpoints(ServiceEndpoints::under(&upstream.uri()))
        .with_timeout_scale(0.01)
        .expect("valid timeout scale");
    let state = Arc::new(AppState::new(&config, api_key).expect("Failed to build app state"));

    TestApp {
        router: routes::router(state),
        upstream,
    }
}

pub fn scrape_request(url: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/v1/scrape").header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::json!({ "url": url }).to_string()))
        .unwrap()
}
