use crate::services::path_service::PathResolver;
use std::io::ErrorKind;
use std::path::Path;

/// Per-process context shared by every request. Nothing here is mutated after
/// startup; the filesystem is the only shared state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: PathResolver,
}

impl AppState {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Canonicalizes `base` and requires it to be an existing directory.
    pub fn from_base_path(base: &Path) -> std::io::Result<Self> {
        let canonical = std::fs::canonicalize(base)?;
        if !canonical.is_dir() {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("base path is not a directory: {}", canonical.display()),
            ));
        }
        Ok(Self::new(PathResolver::new(canonical)))
    }
}
