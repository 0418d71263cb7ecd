use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use shared::config::Config;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Movie routes
        .route("/api/movies/new", get(handlers::latest_movies))
        .route("/api/movies/tmdb/{type}/{id}", get(handlers::movie_by_tmdb))
        .route("/api/movies/{slug}", get(handlers::movie_details))
        // Listing routes
        .route("/api/collections", get(handlers::collections))
        .route("/api/search", get(handlers::search))
        .route("/api/genres", get(handlers::genres))
        .route("/api/genres/{slug}", get(handlers::genre_detail))
        .route("/api/countries", get(handlers::countries))
        .route("/api/countries/{slug}", get(handlers::country_detail))
        .route("/api/years/{year}", get(handlers::year_detail))
        // Middleware
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router wrapped so trailing slashes are trimmed before routing
pub fn build_app(state: AppState, config: &Config) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(build_router(state, config))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
