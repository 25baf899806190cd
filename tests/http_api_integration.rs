//! End-to-end tests for the HTTP surface: envelope shapes, status mapping,
//! the auth gate, admin settings CRUD, and rate limiting, all driven through
//! the real router with `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use quotes_api::config::ServerConfig;
use quotes_api::dataset::Datasets;
use quotes_api::state::ServerState;
use quotes_api::store::{Database, SettingsStore};
use quotes_api::build_router;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const TEST_TOKEN: &str = "integration-test-token";

fn test_app() -> (NamedTempFile, Router) {
    let file = NamedTempFile::new().expect("temp file");
    let router = app_with_db(&file);
    (file, router)
}

fn app_with_db(file: &NamedTempFile) -> Router {
    let db = Database::open(file.path()).expect("open database");
    let datasets = Datasets::load_embedded().expect("embedded datasets");
    let state = ServerState::new(ServerConfig::default(), &db, datasets).expect("state");
    state
        .credentials
        .create_admin("admin", "integration-pw", TEST_TOKEN)
        .expect("seed admin");
    build_router(Arc::new(state))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_authed(app: &Router, uri: &str, auth: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn random_quote_returns_success_envelope() {
    let (_file, app) = test_app();
    let (status, body) = get(&app, "/api/v1/random").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["id"].is_number());
    assert!(body["data"]["text"].is_string());
}

#[tokio::test]
async fn quote_by_id_returns_the_matching_item() {
    let (_file, app) = test_app();
    let (status, body) = get(&app, "/api/v1/quotes/2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 2);
}

#[tokio::test]
async fn quote_by_absent_id_is_404() {
    let (_file, app) = test_app();
    let (status, body) = get(&app, "/api/v1/quotes/9999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_quote_id_is_400() {
    let (_file, app) = test_app();
    let (status, body) = get(&app, "/api/v1/quotes/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid quote ID");
}

#[tokio::test]
async fn field_queries_return_matches_or_404() {
    let (_file, app) = test_app();

    let (status, body) = get(&app, "/api/v1/quotes/category/work").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"].as_array().unwrap().is_empty());

    let (status, _) = get(&app, "/api/v1/quotes/author/Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // exact match is case-sensitive
    let (status, _) = get(&app, "/api/v1/quotes/category/Work").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anime_field_routes_work() {
    let (_file, app) = test_app();

    let (status, body) = get(&app, "/api/v1/anime/character/Naruto%20Uzumaki").await;
    assert_eq!(status, StatusCode::OK);
    for item in body["data"].as_array().unwrap() {
        assert_eq!(item["character"], "Naruto Uzumaki");
    }

    let (status, _) = get(&app, "/api/v1/anime/show/One%20Piece").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn shorthand_aliases_serve_the_same_data() {
    let (_file, app) = test_app();

    for uri in [
        "/anime/random",
        "/chucknorris/random",
        "/dadjokes/random",
        "/programming/random",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "alias {uri}");
        assert_eq!(body["success"], true);
    }
}

#[tokio::test]
async fn raw_dataset_blob_is_served_verbatim() {
    let (_file, app) = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/quotes.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(parsed.is_array());
}

#[tokio::test]
async fn missing_auth_header_is_rejected() {
    let (_file, app) = test_app();
    let (status, body) = get(&app, "/api/v1/admin/settings").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let (_file, app) = test_app();
    let (status, body) = get_authed(&app, "/api/v1/admin/settings", "Basic dXNlcjpwdw==").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid authorization header format");
}

#[tokio::test]
async fn bearer_without_token_is_rejected() {
    let (_file, app) = test_app();
    let (status, body) = get_authed(&app, "/api/v1/admin/settings", "Bearer").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid authorization header format");
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let (_file, app) = test_app();
    let (status, body) =
        get_authed(&app, "/api/v1/admin/settings", "Bearer not-the-token").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or expired token");
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let (_file, app) = test_app();
    let (status, _) = get_authed(
        &app,
        "/api/v1/admin/settings",
        &format!("bearer {TEST_TOKEN}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_settings_crud_flow() {
    let (_file, app) = test_app();
    let auth = format!("Bearer {TEST_TOKEN}");

    // defaults are listed
    let (status, body) = get_authed(&app, "/api/v1/admin/settings", &auth).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rate.enabled"], "true");

    // upsert
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admin/settings")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"key":"site.motd","value":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = get_authed(&app, "/api/v1/admin/settings", &auth).await;
    assert_eq!(body["data"]["site.motd"], "hello");

    // delete, then delete again
    let delete = |uri: &'static str| {
        let app = app.clone();
        let auth = auth.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
        }
    };
    assert_eq!(delete("/api/v1/admin/settings/site.motd").await, StatusCode::OK);
    assert_eq!(
        delete("/api/v1/admin/settings/site.motd").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn set_setting_validates_the_body() {
    let (_file, app) = test_app();
    let auth = format!("Bearer {TEST_TOKEN}");

    let post = |body: &'static str| {
        let app = app.clone();
        let auth = auth.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/admin/settings")
                    .header(header::AUTHORIZATION, &auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
        }
    };

    assert_eq!(post("{not json").await, StatusCode::BAD_REQUEST);
    assert_eq!(post(r#"{"key":"","value":"x"}"#).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_uses_the_error_envelope() {
    let (_file, app) = test_app();
    let (status, body) = get(&app, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_and_status_report_ok() {
    let (_file, app) = test_app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&app, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["datasets"]["quotes"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn preflight_carries_cors_headers() {
    let (_file, app) = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/random")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn exhausted_tier_returns_429() {
    let file = NamedTempFile::new().expect("temp file");

    // shrink the global tier before the limiter is constructed
    {
        let db = Database::open(file.path()).expect("open database");
        let store = SettingsStore::new(&db);
        store.set("rate.global_burst", "2").unwrap();
        store.set("rate.global_rps", "1").unwrap();
    }

    let app = app_with_db(&file);

    let (first, _) = get(&app, "/health").await;
    let (second, _) = get(&app, "/health").await;
    let (third, body) = get(&app, "/health").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(third, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn disabled_rate_limiting_passes_everything() {
    let file = NamedTempFile::new().expect("temp file");

    {
        let db = Database::open(file.path()).expect("open database");
        let store = SettingsStore::new(&db);
        store.set("rate.global_burst", "1").unwrap();
        store.set("rate.enabled", "false").unwrap();
    }

    let app = app_with_db(&file);

    for _ in 0..5 {
        let (status, _) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
