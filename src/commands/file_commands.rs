use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use tokio_util::io::ReaderStream;

use super::JsonBody;
use crate::error::AppError;
use crate::models::dir_entry::DirEntry;
use crate::models::request::{PathQuery, RenameRequest, ROOT_PATH};
use crate::services::file_service::{self, EntryKind, UploadedFile};
use crate::services::path_service::sanitize;
use crate::state::AppState;

const UPLOAD_PATH_FIELD: &str = "path";
const UPLOAD_FILES_FIELDS: &[&str] = &["files", "files[]"];

/// `GET /files`: streams the file inline with a content type guessed from
/// its name.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, AppError> {
    let path = sanitize(query.raw_path());
    let download = file_service::open_file(&state.resolver, &path).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&download.mime_type)
            .map_err(|_| AppError::General(format!("invalid mime type: {}", download.mime_type)))?,
    );
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.len));

    tracing::info!(path = %path, size = download.len, "download file");
    let stream = ReaderStream::new(download.file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// `POST /files`: multipart body with an optional `path` text field naming the
/// target directory and one or more `files` parts.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, &'static str), AppError> {
    let mut target: Option<String> = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == UPLOAD_PATH_FIELD {
            target = Some(field.text().await?);
        } else if UPLOAD_FILES_FIELDS.contains(&field_name.as_str()) {
            let name = field.file_name().unwrap_or_default().to_string();
            let contents = field.bytes().await?.to_vec();
            uploads.push(UploadedFile { name, contents });
        }
    }

    let dir = match target.as_deref() {
        Some(raw) if !raw.is_empty() => sanitize(raw),
        _ => ROOT_PATH.to_string(),
    };
    file_service::save_uploads(&state.resolver, &dir, uploads).await?;
    Ok((StatusCode::CREATED, "OK"))
}

pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RenameRequest>,
) -> Result<Json<DirEntry>, AppError> {
    let source = sanitize(&body.path);
    let destination = sanitize(&body.updates.path);
    let entry = file_service::rename(&state.resolver, &source, &destination, EntryKind::File).await?;
    Ok(Json(entry))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<&'static str, AppError> {
    let path = sanitize(query.raw_path());
    file_service::delete_file(&state.resolver, &path).await?;
    Ok("OK")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{body_string, multipart_request, request, TestServer};
    use axum::http::{header, Method, StatusCode};
    use std::fs;

    #[tokio::test]
    async fn downloads_file_inline() {
        let server = TestServer::new();
        fs::write(server.root().join("notes.txt"), "hello world").unwrap();

        let response = server
            .send(request(Method::GET, "/files?path=/notes.txt"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");
        assert_eq!(body_string(response).await, "hello world");
    }

    #[tokio::test]
    async fn downloading_directory_or_missing_file_is_404() {
        let server = TestServer::new();
        fs::create_dir(server.root().join("dir")).unwrap();

        let response = server.send(request(Method::GET, "/files?path=/dir")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = server
            .send(request(Method::GET, "/files?path=/ghost.bin"))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uploads_files_into_target_directory() {
        let server = TestServer::new();
        fs::create_dir(server.root().join("inbox")).unwrap();

        let response = server
            .send(multipart_request(
                Some("/inbox"),
                &[("a.txt", "first"), ("b.md", "second")],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_string(response).await, "OK");
        assert_eq!(
            fs::read_to_string(server.root().join("inbox/a.txt")).unwrap(),
            "first"
        );
        assert_eq!(
            fs::read_to_string(server.root().join("inbox/b.md")).unwrap(),
            "second"
        );
    }

    #[tokio::test]
    async fn upload_without_path_lands_in_base_root() {
        let server = TestServer::new();
        let response = server
            .send(multipart_request(None, &[("root.txt", "r")]))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(server.root().join("root.txt").is_file());
    }

    #[tokio::test]
    async fn upload_without_files_is_400() {
        let server = TestServer::new();
        let response = server.send(multipart_request(Some("/"), &[])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Bad request");
    }

    #[tokio::test]
    async fn renames_file_keeping_mime() {
        let server = TestServer::new();
        fs::write(server.root().join("photo.png"), [0u8; 4]).unwrap();

        let response = server
            .send_json(
                Method::PUT,
                "/files",
                serde_json::json!({"path": "/photo.png", "updates": {"path": "/renamed.png"}}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"path": "/renamed.png", "isDir": false, "mimeType": "image/png"})
        );

        let response = server
            .send(request(Method::GET, "/directories?path=/"))
            .await;
        let listing: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        let paths: Vec<&str> = listing["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["/renamed.png"]);
    }

    #[tokio::test]
    async fn malformed_rename_body_is_plain_400() {
        let server = TestServer::new();
        fs::write(server.root().join("a.txt"), "").unwrap();

        let response = server
            .send_json(Method::PUT, "/files", serde_json::json!({"path": "/a.txt"}))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Bad request");
        assert!(server.root().join("a.txt").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_through_symlinked_directory_is_refused() {
        let server = TestServer::new();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "top secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), server.root().join("link")).unwrap();

        let response = server
            .send(request(Method::GET, "/files?path=/link/secret.txt"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_ne!(body_string(response).await, "top secret");

        let response = server
            .send(request(Method::GET, "/directories?path=/link"))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_file() {
        let server = TestServer::new();
        fs::write(server.root().join("bye.txt"), "").unwrap();

        let response = server
            .send(request(Method::DELETE, "/files?path=/bye.txt"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!server.root().join("bye.txt").exists());

        let response = server
            .send(request(Method::DELETE, "/files?path=/bye.txt"))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
