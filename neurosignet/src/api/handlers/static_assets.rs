//! HTTP handler for embedded static assets under `/static`.

use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::errors::{Error, Result};
use crate::static_assets;

/// Serve an embedded file from the `static/` folder
#[instrument]
pub async fn serve_static_asset(Path(path): Path<String>) -> Result<Response> {
    let path = path.trim_start_matches('/');

    let Some(content) = static_assets::Assets::get(path) else {
        debug!("Static asset not found: {}", path);
        return Err(Error::NotFound {
            resource: "Static asset".to_string(),
            id: path.to_string(),
        });
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        content.data.into_owned(),
    )
        .into_response())
}
