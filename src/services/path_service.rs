//! Client path handling: sanitizing raw input, resolving it under the base
//! root, and deriving depths and ancestor prefixes from relative path strings.
//!
//! Relative paths always use `/` as the separator, independent of the host.

use crate::error::AppError;
use crate::models::request::ROOT_PATH;
use crate::scope_path;
use percent_encoding::percent_decode_str;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

const PARENT_SEGMENT: &str = "..";

/// Removes the first `..` that touches a separator, then percent-decodes.
///
/// This is a single substitution: `/a/../../b` keeps its second `..`, and an
/// encoded `%2e%2e` survives untouched until decoding. Containment is enforced
/// by [`PathResolver::resolve_contained`], not here.
pub fn sanitize(raw: &str) -> String {
    let raw = if raw.is_empty() { ROOT_PATH } else { raw };
    let stripped = match first_parent_segment(raw) {
        Some(idx) => format!("{}{}", &raw[..idx], &raw[idx + PARENT_SEGMENT.len()..]),
        None => raw.to_string(),
    };
    percent_decode_str(&stripped)
        .decode_utf8_lossy()
        .into_owned()
}

fn first_parent_segment(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    path.match_indices(PARENT_SEGMENT)
        .map(|(idx, _)| idx)
        .find(|&idx| {
            let before = idx.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(idx + PARENT_SEGMENT.len()).copied();
            before == Some(b'/') || after == Some(b'/')
        })
}

/// Nesting depth of a relative path: `/` and `/a` are both 0, `/a/b` is 1.
pub fn depth(relative: &str) -> usize {
    if scope_path::rooted(relative) == ROOT_PATH {
        return 0;
    }
    segments(relative).count().saturating_sub(1)
}

/// Ordered prefixes of `relative`, shortest first. For a rooted path the
/// chain starts at `/`: `/a/b` yields `/`, `/a`, `/a/b`. Empty and repeated
/// separators are collapsed.
pub fn prefix_chain(relative: &str) -> Vec<String> {
    let is_rooted = relative.is_empty() || relative.starts_with('/');
    let mut chain = Vec::new();
    let mut current = String::new();

    if is_rooted {
        chain.push(ROOT_PATH.to_string());
    }

    for segment in segments(relative) {
        if is_rooted || !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        chain.push(current.clone());
    }

    chain
}

/// `parent` joined with a single child name.
pub fn join_child(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn segments(relative: &str) -> impl Iterator<Item = &str> {
    relative.split('/').filter(|s| !s.is_empty())
}

/// Maps relative paths onto the filesystem below one fixed base root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Pure join onto the base root. `.` and redundant separators vanish,
    /// `..` is passed through for the OS to interpret.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let mut resolved = self.base.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir => resolved.push(PARENT_SEGMENT),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        resolved
    }

    /// Like [`resolve`](Self::resolve), but folds `..` lexically and fails
    /// with [`AppError::PathEscapesRoot`] if the result leaves the base root.
    /// Touches no filesystem state.
    pub fn fold_contained(&self, relative: &str) -> Result<PathBuf, AppError> {
        let mut parts: Vec<&OsStr> = Vec::new();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(AppError::PathEscapesRoot(relative.to_string()));
                    }
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let mut resolved = self.base.clone();
        resolved.extend(parts);

        let base = self.base.to_string_lossy();
        if !scope_path::is_within_scope(&resolved.to_string_lossy(), &base) {
            return Err(AppError::PathEscapesRoot(relative.to_string()));
        }
        Ok(resolved)
    }

    /// [`fold_contained`](Self::fold_contained) plus a walk over the existing
    /// intermediate directories: a symlink anywhere above the final component
    /// could lead out of the base root, so it is rejected. The final component
    /// is left to the caller, which `lstat`s it and never follows it.
    pub async fn resolve_contained(&self, relative: &str) -> Result<PathBuf, AppError> {
        let resolved = self.fold_contained(relative)?;
        let Ok(below_base) = resolved.strip_prefix(&self.base) else {
            return Err(AppError::PathEscapesRoot(relative.to_string()));
        };

        let mut current = self.base.clone();
        let mut ancestors = below_base.components().peekable();
        while let Some(component) = ancestors.next() {
            if ancestors.peek().is_none() {
                break;
            }
            current.push(component);
            match fs::symlink_metadata(&current).await {
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(AppError::PathEscapesRoot(relative.to_string()));
                }
                Ok(_) => {}
                // Nothing below a missing or unreadable ancestor can be reached
                // through a link; the caller's own stat reports the failure.
                Err(_) => break,
            }
        }
        Ok(resolved)
    }
}
