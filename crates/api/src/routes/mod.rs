//! HTTP routes

pub mod health;
pub mod tenants;

use axum::{middleware, routing::get, Router};
use tower::Layer;
use tower_http::trace::TraceLayer;

use crate::{
    routing::{
        platform_only_middleware, tenant_routing_middleware, ADMIN_PREFIX, TENANT_PATH_PREFIX,
    },
    security::security_headers_middleware,
    state::AppState,
};

/// Create the route table (paths as seen after tenant rewriting)
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Tenant management is served on the platform host only
    let api_routes = Router::new()
        .route(
            "/tenants",
            get(tenants::list_tenants).post(tenants::create_tenant),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            platform_only_middleware,
        ));

    Router::new()
        .route("/", get(tenants::landing))
        .route(&format!("{TENANT_PATH_PREFIX}/:subdomain"), get(tenants::tenant_home))
        .route(ADMIN_PREFIX, get(tenants::admin_dashboard))
        .merge(health_routes)
        .nest("/api", api_routes)
        .with_state(state)
}

/// Build the full application.
///
/// The tenant middleware wraps the route table itself rather than being added
/// with `Router::layer`, because layers added that way run after routing and
/// could not rewrite the path being matched.
pub fn build_app(state: AppState) -> Router {
    let routes = create_router(state.clone());
    let tenant_aware =
        middleware::from_fn_with_state(state, tenant_routing_middleware).layer(routes);

    Router::new()
        .fallback_service(tenant_aware)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}
