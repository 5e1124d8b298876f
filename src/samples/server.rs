//! HTTP endpoint serving example sources as plain text.
//!
//! Serving `.php` files from a PHP-capable host would execute them, so the
//! dynamic variant reads them through `GET /examples/_get_file?file=<id>`.

use crate::config::types::Result;
use crate::samples::catalog::CATALOG_FILE;
use crate::samples::validate::resolve_sample;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

#[derive(Clone, Debug)]
pub struct SampleServerState {
    dir: Arc<PathBuf>,
}

impl SampleServerState {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GetFileParams {
    pub file: Option<String>,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found.").into_response()
}

/// GET `/examples/_get_file?file=<id>`
///
/// - `400 Bad Request.` without a `file` parameter
/// - `404 File not found.` for anything that is not an accepted example
/// - `200` with the source as `text/plain`, never cached
pub async fn get_file_handler(
    State(state): State<SampleServerState>,
    Query(params): Query<GetFileParams>,
) -> Response {
    let Some(file) = params.file else {
        return (StatusCode::BAD_REQUEST, "Bad Request.").into_response();
    };

    let path = match resolve_sample(&state.dir, &file) {
        Ok(path) => path,
        Err(e) => {
            log::debug!("Rejected example request {:?}: {}", file, e);
            return not_found();
        }
    };

    match tokio::fs::read(&path).await {
        Ok(body) => (
            [
                (header::CONTENT_TYPE, "text/plain"),
                (header::CACHE_CONTROL, NO_CACHE),
                (header::PRAGMA, "no-cache"),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            not_found()
        }
    }
}

/// GET `/examples/examples.json`
pub async fn catalog_handler(State(state): State<SampleServerState>) -> Response {
    match tokio::fs::read(state.dir.join(CATALOG_FILE)).await {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(_) => not_found(),
    }
}

pub fn router(dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/examples/_get_file", get(get_file_handler))
        .route("/examples/examples.json", get(catalog_handler))
        .with_state(SampleServerState::new(dir))
}

pub async fn serve(addr: SocketAddr, dir: PathBuf) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Serving examples from {} on http://{}", dir.display(), addr);
    axum::serve(listener, router(dir)).await?;
    Ok(())
}
