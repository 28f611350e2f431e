//! HTTP Frontend (C4)
//!
//! Maps URL paths to `Manager::get`; packs multi-key requests into a ZIP
//! archive. Grounded directly on `manager.go`'s `handlerSingle`/
//! `handlerMany` for behavior (the `mimeSwaps` allowlist, the empty-path
//! 200, 500-on-error-string, the `*`-suffixed prefix expansion); the axum
//! router/`AppState` idiom follows teacher's `controlplane/api/rest.rs` and
//! `server.rs`.

use crate::cache::Manager;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// `.js`/`.css` get an explicit Content-Type; everything else is served with
/// none, matching `mimeSwaps` in the original source.
fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "js" => Some("text/javascript"),
        "css" => Some("text/css"),
        _ => None,
    }
}

/// A key with no `.` has no extension, matching `filepath.Ext`'s behavior
/// on an extension-less name (returns `""`, which matches nothing below).
fn extension_of(key: &str) -> Option<&str> {
    key.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn router(manager: Arc<Manager>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/_many/", post(get_many))
        .route("/*key", get(get_one))
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

async fn index() -> impl IntoResponse {
    (StatusCode::OK, "No file requested in path.")
}

async fn get_one(State(manager): State<Arc<Manager>>, Path(key): Path<String>) -> impl IntoResponse {
    match manager.get(&key).await {
        Ok(object) => {
            let mut response = (StatusCode::OK, object.contents.clone()).into_response();
            if let Some(ext) = extension_of(&key) {
                if let Some(mime) = mime_for_extension(ext) {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(mime));
                }
            }
            response
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Ran into err: {e}")).into_response(),
    }
}

/// Any element containing `*` expands into an origin prefix query. Done in
/// two explicit passes — collect expansions, then splice them in — per
/// SPEC_FULL.md §9's note against mutating the key list mid-iteration.
async fn get_many(
    State(manager): State<Arc<Manager>>,
    body: Result<Json<Vec<String>>, JsonRejection>,
) -> impl IntoResponse {
    let requested = match body {
        Ok(Json(requested)) => requested,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Ran into err: {e}")).into_response();
        }
    };

    let mut keys = Vec::new();
    for entry in requested {
        if entry.contains('*') {
            let prefix = entry.replace('*', "");
            match manager.origin_list(&prefix).await {
                Ok(files) => keys.extend(files.into_iter().map(|f| f.key)),
                Err(e) => {
                    return (StatusCode::INTERNAL_SERVER_ERROR, format!("Ran into err: {e}"))
                        .into_response();
                }
            }
        } else {
            keys.push(entry);
        }
    }

    let mut contents: HashMap<String, Bytes> = HashMap::new();
    for key in &keys {
        let body = match manager.get(key).await {
            Ok(object) => object.contents,
            Err(e) => Bytes::from(format!("Ran into err: {e}")),
        };
        contents.insert(key.clone(), body);
    }

    match build_zip(&keys, &contents) {
        Ok(buf) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/zip")],
            buf,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Ran into err: {e}")).into_response(),
    }
}

/// `zip` is a synchronous, blocking API; the handler is small enough that
/// running it inline is fine for the request sizes this endpoint expects
/// (one entry per requested key), matching the synchronous archive build in
/// the original `handlerMany`.
fn build_zip(keys: &[String], contents: &HashMap<String, Bytes>) -> crate::error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buf);
        let mut writer = zip::ZipWriter::new(cursor);
        let options = zip::write::FileOptions::default();
        for key in keys {
            writer.start_file(key, options)?;
            if let Some(body) = contents.get(key) {
                writer.write_all(body)?;
            }
        }
        writer.finish()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_allowlist_matches_only_js_and_css() {
        assert_eq!(mime_for_extension("js"), Some("text/javascript"));
        assert_eq!(mime_for_extension("css"), Some("text/css"));
        assert_eq!(mime_for_extension("html"), None);
        assert_eq!(mime_for_extension(""), None);
    }

    #[test]
    fn extension_of_requires_a_dot() {
        assert_eq!(extension_of("app.js"), Some("js"));
        assert_eq!(extension_of("js"), None);
        assert_eq!(extension_of("css"), None);
        assert_eq!(extension_of("a/b/app.css"), Some("css"));
    }

    #[test]
    fn zip_contains_one_entry_per_key() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let mut contents = HashMap::new();
        contents.insert("a".to_string(), Bytes::from_static(b"1"));
        contents.insert("b".to_string(), Bytes::from_static(b"2"));

        let buf = build_zip(&keys, &contents).unwrap();
        let reader = std::io::Cursor::new(buf);
        let mut archive = zip::ZipArchive::new(reader).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("a").is_ok());
        assert!(archive.by_name("b").is_ok());
    }
}
