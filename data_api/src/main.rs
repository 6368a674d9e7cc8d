mod state;
mod v1;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use display_store::error::{ConfigError, InitializationError};
use display_store::geocoder::NominatimGeocoder;
use display_store::photo::PhotoStore;
use display_store::store::RecordStore;
use display_store::{init_tracing, load_config, prepare_storage, shutdown_listener};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    init_tracing()?;

    let config = load_config()?;
    prepare_storage(&config.storage)?;

    let state = AppState {
        store: RecordStore::from_config(&config.storage),
        photos: PhotoStore::new(&config.storage.image_dir),
        geocoder: NominatimGeocoder::new(&config.geocoder).map_err(InitializationError::from)?,
        config: Arc::new(config.clone()),
    };

    let app = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .nest("/v1", v1::router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listen_addr = config.server.listen_addr.as_str();
    info!(name: "server.starting", listen_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_listener())
        .await?;

    Ok(())
}
