use crate::error::AppError;
use crate::models::dir_entry::{DirEntry, DirListing};
use crate::scope_path;
use crate::services::path_service::{self, PathResolver};
use futures_util::future::{join_all, try_join_all};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Entries whose name starts with a dot are never listed.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Only regular files and directories are listed. Symlinks, sockets, devices
/// and entries whose stat failed are dropped without error.
fn is_listable(stat: &std::io::Result<Metadata>) -> Option<bool> {
    match stat {
        Ok(meta) if meta.is_dir() => Some(true),
        Ok(meta) if meta.is_file() => Some(false),
        _ => None,
    }
}

/// `None` for directories and for names without a known extension.
pub fn guess_mime(name: &str) -> Option<String> {
    mime_guess::from_path(name).first().map(|m| m.to_string())
}

pub async fn is_dir(path: &Path) -> Result<bool, AppError> {
    match fs::symlink_metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Lists the immediate children of `relative`, or `None` when it does not
/// resolve to a directory. Children keep the order the directory read
/// returned them in.
pub async fn list_dir(
    resolver: &PathResolver,
    relative: &str,
    depth: usize,
) -> Result<Option<DirListing>, AppError> {
    let dir_path = resolver.resolve_contained(relative).await?;
    if !is_dir(&dir_path).await? {
        return Ok(None);
    }

    let mut names = Vec::new();
    let mut reader = fs::read_dir(&dir_path).await?;
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_hidden(&name) {
            names.push(name);
        }
    }

    let stats = join_all(
        names
            .iter()
            .map(|name| fs::symlink_metadata(dir_path.join(name))),
    )
    .await;

    let files = names
        .into_iter()
        .zip(stats.iter())
        .filter_map(|(name, stat)| {
            let is_dir = is_listable(stat)?;
            Some(DirEntry {
                path: path_service::join_child(relative, &name),
                is_dir,
                mime_type: if is_dir { None } else { guess_mime(&name) },
            })
        })
        .collect();

    Ok(Some(DirListing {
        files,
        parent_path: relative.to_string(),
        depth,
    }))
}

/// Listings for every prefix of `relative` at or below `stop_ancestor`,
/// shortest first. Depths run `depth(stop_ancestor) + i` over the surviving
/// prefixes; prefixes that are not directories are left out.
pub async fn list_with_ancestors(
    resolver: &PathResolver,
    relative: &str,
    stop_ancestor: &str,
) -> Result<Vec<DirListing>, AppError> {
    let base_depth = path_service::depth(stop_ancestor);
    let stop = scope_path::rooted(stop_ancestor);

    let prefixes: Vec<String> = path_service::prefix_chain(relative)
        .into_iter()
        .filter(|prefix| scope_path::is_within_scope(&scope_path::rooted(prefix), &stop))
        .collect();

    let listings = try_join_all(
        prefixes
            .iter()
            .enumerate()
            .map(|(i, prefix)| list_dir(resolver, prefix, base_depth + i)),
    )
    .await?;

    Ok(listings.into_iter().flatten().collect())
}
