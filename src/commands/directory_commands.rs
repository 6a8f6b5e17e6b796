use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};

use super::JsonBody;
use crate::error::AppError;
use crate::models::dir_entry::DirEntry;
use crate::models::request::{ListQuery, PathQuery, RenameRequest};
use crate::services::file_service::{self, EntryKind};
use crate::services::listing_service;
use crate::services::path_service::{self, sanitize};
use crate::state::AppState;

/// `GET /directories`: one listing, or the ancestor chain with `withParents=true`.
pub async fn list_directory(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let path = sanitize(query.raw_path());

    if query.wants_parents() {
        let stop = sanitize(query.raw_stop_ancestor());
        let listings = listing_service::list_with_ancestors(&state.resolver, &path, &stop).await?;
        tracing::debug!(path = %path, stop = %stop, count = listings.len(), "listed with parents");
        return Ok(Json(listings).into_response());
    }

    let depth = path_service::depth(&path);
    match listing_service::list_dir(&state.resolver, &path, depth).await? {
        Some(listing) => {
            tracing::debug!(path = %path, count = listing.files.len(), "listed directory");
            Ok(Json(listing).into_response())
        }
        None => Err(AppError::NotFound(path)),
    }
}

pub async fn create_directory(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<&'static str, AppError> {
    let path = sanitize(query.raw_path());
    file_service::create_dir(&state.resolver, &path).await?;
    Ok("OK")
}

pub async fn rename_directory(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RenameRequest>,
) -> Result<Json<DirEntry>, AppError> {
    let source = sanitize(&body.path);
    let destination = sanitize(&body.updates.path);
    let entry =
        file_service::rename(&state.resolver, &source, &destination, EntryKind::Directory).await?;
    Ok(Json(entry))
}

pub async fn delete_directory(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<&'static str, AppError> {
    let path = sanitize(query.raw_path());
    file_service::delete_dir(&state.resolver, &path).await?;
    Ok("OK")
}
