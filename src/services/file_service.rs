use crate::error::AppError;
use crate::models::dir_entry::DirEntry;
use crate::scope_path;
use crate::services::listing_service::guess_mime;
use crate::services::path_service::PathResolver;
use futures_util::future::join_all;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    fn matches(self, meta: &std::fs::Metadata) -> bool {
        match self {
            Self::File => meta.is_file(),
            Self::Directory => meta.is_dir(),
        }
    }
}

/// One file received by an upload request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// An opened file ready to be streamed back to a client.
#[derive(Debug)]
pub struct FileDownload {
    pub file: fs::File,
    pub len: u64,
    pub mime_type: String,
}

/// Resolves `relative` and requires it to exist with the given kind.
async fn resolve_existing(
    resolver: &PathResolver,
    relative: &str,
    kind: EntryKind,
) -> Result<PathBuf, AppError> {
    let path = resolver.resolve_contained(relative).await?;
    match fs::symlink_metadata(&path).await {
        Ok(meta) if kind.matches(&meta) => Ok(path),
        Ok(_) => Err(AppError::NotFound(relative.to_string())),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Err(AppError::NotFound(relative.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// The base root itself may be listed and uploaded into, but never removed
/// or renamed.
fn reject_root(resolver: &PathResolver, path: &Path, relative: &str) -> Result<(), AppError> {
    if path == resolver.resolve("/").as_path() {
        return Err(AppError::BadRequest(format!(
            "operation on base root not allowed: {relative}"
        )));
    }
    Ok(())
}

/// Creates a single directory; fails if it already exists or its parent is
/// missing.
pub async fn create_dir(resolver: &PathResolver, relative: &str) -> Result<(), AppError> {
    let path = resolver.resolve_contained(relative).await?;
    fs::create_dir(&path).await?;
    tracing::info!(path = relative, "created directory");
    Ok(())
}

pub async fn rename(
    resolver: &PathResolver,
    source: &str,
    destination: &str,
    kind: EntryKind,
) -> Result<DirEntry, AppError> {
    let src = resolve_existing(resolver, source, kind).await?;
    reject_root(resolver, &src, source)?;
    let dest = resolver.resolve_contained(destination).await?;
    reject_root(resolver, &dest, destination)?;

    if fs::symlink_metadata(&dest).await.is_ok() {
        return Err(AppError::General(format!(
            "destination already exists: {destination}"
        )));
    }

    fs::rename(&src, &dest).await?;
    tracing::info!(from = source, to = destination, "renamed");

    let is_dir = kind == EntryKind::Directory;
    let name = Path::new(destination)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(DirEntry {
        path: destination.to_string(),
        is_dir,
        mime_type: if is_dir { None } else { guess_mime(&name) },
    })
}

/// Removes a directory and everything below it.
pub async fn delete_dir(resolver: &PathResolver, relative: &str) -> Result<(), AppError> {
    let path = resolver.resolve_contained(relative).await?;
    reject_root(resolver, &path, relative)?;
    fs::remove_dir_all(&path).await?;
    tracing::info!(path = relative, "deleted directory");
    Ok(())
}

pub async fn delete_file(resolver: &PathResolver, relative: &str) -> Result<(), AppError> {
    let path = resolver.resolve_contained(relative).await?;
    fs::remove_file(&path).await?;
    tracing::info!(path = relative, "deleted file");
    Ok(())
}

pub async fn open_file(resolver: &PathResolver, relative: &str) -> Result<FileDownload, AppError> {
    let path = resolve_existing(resolver, relative, EntryKind::File).await?;
    let file = fs::File::open(&path).await?;
    let len = file.metadata().await?.len();
    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(FileDownload {
        file,
        len,
        mime_type,
    })
}

/// Hidden sibling an upload is written to before it is moved into place.
fn staging_name(name: &str) -> String {
    format!(".{name}.upload")
}

async fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp).await;
    }
}

/// Writes every upload into the directory at `relative`, concurrently.
/// Existing files with the same name are overwritten.
///
/// Contents go to hidden staging files first and are renamed over their
/// targets only once every write succeeded, so a failed request never leaves
/// truncated files under their real names.
pub async fn save_uploads(
    resolver: &PathResolver,
    relative: &str,
    uploads: Vec<UploadedFile>,
) -> Result<usize, AppError> {
    if uploads.is_empty() {
        return Err(AppError::BadRequest("no files uploaded".to_string()));
    }
    if let Some(bad) = uploads.iter().find(|u| !scope_path::is_single_segment(&u.name)) {
        return Err(AppError::BadRequest(format!(
            "invalid upload file name: {}",
            bad.name
        )));
    }

    let dir = resolver.resolve_contained(relative).await?;
    let staged: Vec<(PathBuf, PathBuf)> = uploads
        .iter()
        .map(|upload| (dir.join(staging_name(&upload.name)), dir.join(&upload.name)))
        .collect();

    // Every write is awaited, even after one fails, so none is still running
    // when the staging files are cleaned up.
    let written = join_all(
        staged
            .iter()
            .zip(&uploads)
            .map(|((tmp, _), upload)| fs::write(tmp, &upload.contents)),
    )
    .await;
    if let Some(err) = written.into_iter().find_map(Result::err) {
        discard_staged(&staged).await;
        tracing::warn!(path = relative, error = %err, "upload failed, no files written");
        return Err(err.into());
    }

    for (placed, (tmp, dest)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(tmp, dest).await {
            discard_staged(&staged[placed..]).await;
            let names: Vec<&str> = uploads[..placed].iter().map(|u| u.name.as_str()).collect();
            tracing::warn!(path = relative, placed = ?names, error = %err, "upload partially saved");
            return Err(err.into());
        }
    }

    let count = uploads.len();
    tracing::info!(path = relative, count, "saved uploads");
    Ok(count)
}
