//! Embedded static assets under `/static/`

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::WebError;
use crate::view::Assets;

/// Serve a file from the embedded `assets/` folder
pub async fn serve_asset(Path(path): Path<String>) -> Result<Response, WebError> {
    if path.split('/').any(|segment| segment == "..") {
        return Err(WebError::NotFound);
    }

    let file = Assets::get(&path).ok_or(WebError::NotFound)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, get_content_type(&path)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        file.data.into_owned(),
    )
        .into_response())
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(get_content_type("style.css"), "text/css");
        assert_eq!(get_content_type("img/logo.svg"), "image/svg+xml");
        assert_eq!(get_content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_stylesheet_is_embedded() {
        assert!(Assets::get("style.css").is_some());
    }
}
