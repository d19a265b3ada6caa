use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{TEST_API_KEY, scrape_request, setup_test_app, setup_test_app_no_auth};

async fn json_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn article_html() -> String {
    let paragraph = "Plain server rendered paragraph text for the integration test. ".repeat(40);
    format!(
        "<html><head><title>T</title><script>track()</script></head><body>\
         <nav>Menu</nav><article><h1>Integration Story</h1><p>{paragraph}</p></article>\
         </body></html>"
    )
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(scrape_request("https://example.com", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(scrape_request("https://example.com", Some("wrong-key")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_url_returns_400() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(scrape_request("ftp://example.com/file", Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_url");
}

#[tokio::test]
async fn exhausted_cascade_returns_502() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(scrape_request("https://example.com/gone", Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert_eq!(json["error"], "exhausted");
    assert!(json["message"].as_str().unwrap().contains("all 8"));
}

#[tokio::test]
async fn scrape_returns_markdown_and_layers() {
    let app = setup_test_app().await;
    Mock::given(method("GET"))
        .and(path("/corsproxy/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
        .mount(&app.upstream)
        .await;

    let response = app
        .router
        .oneshot(scrape_request("https://example.com/story", Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["strategy_index_used"], 2);
    assert_eq!(json["strategy_name"], "corsproxy");
    assert_eq!(json["title"], "Integration Story");
    assert!(json["markdown"].as_str().unwrap().contains("layers_tried: 2"));
    assert!(!json["markdown"].as_str().unwrap().contains("track()"));
    assert_eq!(json["layers"][0]["state"], "failed");
    assert_eq!(json["layers"][1]["state"], "success");
    assert_eq!(json["layers"][2]["state"], "pending");
}

#[tokio::test]
async fn open_server_needs_no_token() {
    let app = setup_test_app_no_auth().await;

    let response = app
        .router
        .oneshot(
            Request::get("/v1/strategies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let strategies = json["strategies"].as_array().unwrap();
    assert_eq!(strategies.len(), 8);
    assert_eq!(strategies[0]["name"], "allorigins");
    assert_eq!(strategies[7]["name"], "allorigins-raw");
}
