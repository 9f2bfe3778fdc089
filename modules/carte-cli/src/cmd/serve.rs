use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::{error, info};

use carte_common::Config;
use carte_core::render::render_error_page;
use carte_core::{build_map, source_for};

// --- App State ---

pub struct AppState {
    /// `Err` holds the rendered error panel when the datasets failed to load.
    page: std::result::Result<String, String>,
    geojson: serde_json::Value,
}

impl AppState {
    pub fn ready(page: String, geojson: serde_json::Value) -> Self {
        Self {
            page: Ok(page),
            geojson,
        }
    }

    pub fn failed(error_page: String) -> Self {
        Self {
            page: Err(error_page),
            geojson: serde_json::json!({ "type": "FeatureCollection", "features": [] }),
        }
    }
}

pub async fn run(config: &Config) -> Result<()> {
    let source = source_for(&config.data);
    let mut geocoder = super::geocoder(config);

    let state = match build_map(source.as_ref(), &mut geocoder).await {
        Ok(map) => AppState::ready(map.html(), map.geojson()),
        Err(e) => {
            error!(error = %e, "Failed to load datasets, serving error page");
            AppState::failed(render_error_page(&e.to_string()))
        }
    };

    let app = router(Arc::new(state));

    info!("Carte server starting on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(map_page))
        .route("/markers.geojson", get(markers))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

// --- Handlers ---

async fn map_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.page {
        Ok(html) => (StatusCode::OK, Html(html.clone())),
        Err(error_page) => (StatusCode::INTERNAL_SERVER_ERROR, Html(error_page.clone())),
    }
}

async fn markers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.geojson.clone())
}
