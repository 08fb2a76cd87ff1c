//! HTTP routes for the music store gateway.
//!
//! Defines the Axum router and application state. Routes are grouped by the
//! [`Capability`] they require; each group gets its own policy middleware.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{enforce_policy, http_metrics_middleware, PolicyState};
use crate::policy::{Capability, EmailSource};
use crate::repositories::Store;
use crate::services::PaymentProvider;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: Config,

    /// Payment provider client.
    pub payments: Arc<dyn PaymentProvider>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/`, `/health`, `/ready`, `/metrics` - operational, public
/// - catalog and review reads, user upsert and admin status - public
/// - review creation, user listing, order creation and fetch, payment
///   intents - any valid token
/// - `/user/admin/:email` - admin only
/// - `/order?customerEmail=` and `DELETE /order/:email` - owner of the email
/// - TraceLayer, 30 second timeout, CORS and HTTP metrics on everything
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let guard = |capability: Capability| {
        middleware::from_fn_with_state(
            Arc::new(PolicyState {
                store: state.store.clone(),
                token_secret: state.config.access_token_secret.clone(),
                clock_skew_seconds: state.config.jwt_clock_skew_seconds,
                capability,
            }),
            enforce_policy,
        )
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/instruments", get(handlers::list_instruments))
        .route("/instruments/:id", get(handlers::get_instrument))
        .route("/reviews", get(handlers::list_reviews))
        .route("/user/:email", put(handlers::upsert_user))
        .route("/admin/:email", get(handlers::get_admin_status))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Any valid token. Order creation and fetch also check ownership in the
    // handler against the body or the stored order.
    let authenticated_routes = Router::new()
        .route("/reviews", post(handlers::create_review))
        .route("/user", get(handlers::list_users))
        .route("/order", post(handlers::create_order))
        .route("/order/:id", get(handlers::get_order))
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route_layer(guard(Capability::Authenticated))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/user/admin/:email", put(handlers::promote_user))
        .route_layer(guard(Capability::Admin))
        .with_state(state.clone());

    let order_query_owner_routes = Router::new()
        .route("/order", get(handlers::list_orders))
        .route_layer(guard(Capability::Owner(EmailSource::Query(
            "customerEmail",
        ))))
        .with_state(state.clone());

    // Shares `/order/:id` with the authenticated GET; the segment is the
    // customer email for DELETE.
    let order_path_owner_routes = Router::new()
        .route("/order/:id", delete(handlers::delete_orders))
        .route_layer(guard(Capability::Owner(EmailSource::PathParam)))
        .with_state(state.clone());

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflights, decorate responses
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .merge(order_query_owner_routes)
        .merge(order_path_owner_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS with credentials. Without a configured list the request origin is
/// mirrored back.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                }),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
