//! End-to-end routing tests against the full application stack

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tenantgate_api::{
    build_app, AppState, Config, MemoryTenantDirectory, TenantDirectory, UnknownTenantPolicy,
};
use tenantgate_shared::TenantRecord;
use tower::ServiceExt;

fn app_with(config: Config) -> (Router, AppState) {
    let directory = MemoryTenantDirectory::with_records([
        TenantRecord::new("acme", "🚀"),
        TenantRecord::new("globex", "🌍"),
    ]);
    let state = AppState::new(config, Arc::new(directory));
    (build_app(state.clone()), state)
}

fn app() -> Router {
    app_with(Config::for_root_domain("root.com")).0
}

fn get(host: &str, path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_tenant_root_is_rewritten() {
    let response = app().oneshot(get("acme.root.com", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subdomain"], "acme");
    assert_eq!(body["icon"], "🚀");
    assert_eq!(body["visible_path"], "/");
    assert_eq!(body["resolved"]["tenant_id"], "acme");
}

#[tokio::test]
async fn test_tenant_host_is_case_insensitive() {
    let response = app().oneshot(get("ACME.Root.com:443", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["subdomain"], "acme");
}

#[tokio::test]
async fn test_local_development_host() {
    let (app, _) = app_with(Config::for_root_domain("localhost:3000"));
    let response = app.oneshot(get("globex.localhost:3000", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subdomain"], "globex");
    assert_eq!(body["resolved"]["resolution_type"], "local_development");
}

#[tokio::test]
async fn test_preview_host() {
    let response = app()
        .oneshot(get("acme---my-app-git-main.vercel.app", "/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["subdomain"], "acme");
}

#[tokio::test]
async fn test_tenant_admin_redirects_home() {
    let response = app().oneshot(get("acme.root.com", "/admin")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_admin_redirect_does_not_need_registration() {
    let response = app()
        .oneshot(get("ghost.root.com", "/admin/settings"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_platform_admin_passes_through() {
    let response = app().oneshot(get("root.com", "/admin")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["tenants"][0]["subdomain"], "acme");
    assert_eq!(body["tenants"][1]["subdomain"], "globex");
}

#[tokio::test]
async fn test_platform_root_is_landing_page() {
    let response = app().oneshot(get("www.root.com", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["root_domain"], "root.com");
    assert!(body["tenant"].is_null());
}

#[tokio::test]
async fn test_unknown_tenant_is_not_found() {
    let response = app().oneshot(get("ghost.root.com", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_tenant_pass_through_policy() {
    let mut config = Config::for_root_domain("root.com");
    config.unknown_tenant_policy = UnknownTenantPolicy::PassThrough;
    let (app, _) = app_with(config);

    let response = app.oneshot(get("ghost.root.com", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["tenant"]["tenant_id"], "ghost");
}

#[tokio::test]
async fn test_unknown_tenant_redirect_policy() {
    let mut config = Config::for_root_domain("root.com");
    config.unknown_tenant_policy = UnknownTenantPolicy::RedirectToPlatform;
    let (app, _) = app_with(config);

    let response = app.oneshot(get("ghost.root.com", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "//root.com/");
}

#[tokio::test]
async fn test_excluded_paths_are_not_rewritten() {
    let response = app()
        .oneshot(get("acme.root.com", "/favicon.ico"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app()
        .oneshot(get("acme.root.com", "/_next/static/chunk.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app().oneshot(get("root.com", "/api/tenants")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total"], 2);
}

#[tokio::test]
async fn test_tenant_api_is_platform_only() {
    let (app, state) = app_with(Config::for_root_domain("root.com"));

    let response = app
        .clone()
        .oneshot(get("acme.root.com", "/api/tenants"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(body["tenants"].is_null());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tenants")
        .header(header::HOST, "acme---my-app-git-main.vercel.app")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "subdomain": "initech", "icon": "🏢" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(state.directory.get("initech").await.unwrap().is_none());

    let response = app.oneshot(get("www.root.com", "/api/tenants")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_loopback_text_in_query_does_not_change_routing() {
    let response = app()
        .oneshot(get("acme.root.com", "/admin?next=localhost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let response = app()
        .oneshot(get("acme.root.com", "/?x=127.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["subdomain"], "acme");

    let response = app()
        .oneshot(get("acme.root.com", "/api/tenants?next=localhost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_tenant_paths_pass_through() {
    let response = app()
        .oneshot(get("acme.root.com", "/tenants/globex"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subdomain"], "globex");
    assert_eq!(body["visible_path"], "/tenants/globex");
}

#[tokio::test]
async fn test_create_tenant() {
    let (app, state) = app_with(Config::for_root_domain("root.com"));

    // Prime a negative cache entry; registration must clear it
    let response = app
        .clone()
        .oneshot(get("initech.root.com", "/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.cache.stats().negative_entries, 1);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tenants")
        .header(header::HOST, "root.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "subdomain": "initech", "icon": "🏢" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["subdomain"], "initech");
    assert_eq!(body["icon"], "🏢");

    let response = app.oneshot(get("initech.root.com", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_tenant_rejections() {
    let cases = [
        (json!({ "subdomain": "acme", "icon": "🔥" }), StatusCode::CONFLICT),
        (json!({ "subdomain": "Bad Name!", "icon": "🔥" }), StatusCode::BAD_REQUEST),
        (json!({ "subdomain": "admin", "icon": "🔥" }), StatusCode::BAD_REQUEST),
        (json!({ "subdomain": "fresh", "icon": "" }), StatusCode::BAD_REQUEST),
    ];

    for (payload, expected) in cases {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/tenants")
            .header(header::HOST, "root.com")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), expected, "payload: {payload}");
    }
}

#[tokio::test]
async fn test_health_reports_backend() {
    let response = app().oneshot(get("root.com", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["directory_backend"], "memory");
}

#[tokio::test]
async fn test_security_headers_on_rewritten_responses() {
    let response = app().oneshot(get("acme.root.com", "/")).await.unwrap();

    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
