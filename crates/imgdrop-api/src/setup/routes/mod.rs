//! Route configuration and setup.

mod health;

use crate::constants::{
    EDITOR_CONFIG_PATH, HEALTH_LIVE_PATH, HEALTH_READY_PATH, MEDIA_EPOCH_PATH,
    MULTIPART_OVERHEAD_BYTES, UPLOAD_IMAGES_PATH, UPLOAD_METRICS_PATH,
};
use crate::handlers::{editor, image_upload, metrics};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use imgdrop_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Setup all application routes
///
/// The body limit and the static mount are taken from the settings in effect at startup.
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config);
    let settings = state.settings.snapshot();

    let body_limit = usize::try_from(
        settings
            .limits
            .max_file_size
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .route(
            UPLOAD_IMAGES_PATH,
            post(image_upload::upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(UPLOAD_METRICS_PATH, get(metrics::get_upload_metrics))
        .route(EDITOR_CONFIG_PATH, get(editor::get_editor_config))
        .route(MEDIA_EPOCH_PATH, get(editor::get_media_epoch))
        .route(HEALTH_LIVE_PATH, get(health::liveness_check))
        .route(HEALTH_READY_PATH, get(health::readiness_check));

    let api_routes = match settings.serve_path() {
        Some(path) => {
            tracing::info!(
                path = %path,
                root = %settings.storage_root.display(),
                "Serving stored uploads"
            );
            api_routes.nest_service(&path, ServeDir::new(&settings.storage_root))
        }
        None => api_routes,
    };

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        body_limit_bytes = body_limit,
        "HTTP limits enabled"
    );

    let app = api_routes
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> CorsLayer {
    if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}
