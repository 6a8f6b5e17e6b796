use std::path::{Component, Path};

/// Forward slashes only, no trailing separator (except for the root itself).
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }
    normalized
}

/// Client paths are rooted at the base root whether or not they carry the
/// leading separator.
pub fn rooted(path: &str) -> String {
    let normalized = normalize(path);
    if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{normalized}")
    }
}

/// Segment-aware prefix test: `/a/b` is within `/a`, `/ab` is not.
pub fn is_within_scope(path: &str, root: &str) -> bool {
    let path = normalize(path);
    let root = normalize(root);

    if path == root {
        return true;
    }

    if root == "/" {
        return path.starts_with('/');
    }

    path.starts_with(&(root + "/"))
}

/// True when `name` is exactly one plain path segment, so joining it onto a
/// directory cannot land anywhere but inside that directory.
pub fn is_single_segment(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
