use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{classifiers, diseases, genes, system, users};
use crate::middleware::slug_auth_middleware;
use crate::state::AppState;

/// Build the full HTTP application around `state`
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(user_routes())
        .merge(classifier_routes())
        .merge(catalog_routes())
        .fallback(system::not_found)
        // Every route sees the resolved identity (or anonymous)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            slug_auth_middleware,
        ));

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::create))
        .route(
            "/users/:id",
            get(users::show).put(users::update).patch(users::update),
        )
        .route("/users/:id/slugs", post(users::rotate_slugs))
}

fn classifier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/classifiers",
            get(classifiers::list).post(classifiers::create),
        )
        .route(
            "/classifiers/:id",
            get(classifiers::show)
                .put(classifiers::replace)
                .patch(classifiers::modify),
        )
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/genes", get(genes::list))
        .route("/genes/:id", get(genes::show))
        .route("/diseases", get(diseases::list))
        .route("/diseases/:acronym", get(diseases::show))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
            .allow_headers(Any),
    )
}
