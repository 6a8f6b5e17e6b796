use serde::{Deserialize, Serialize};

/// One file or directory, addressed by its path relative to the base root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub path: String,
    pub is_dir: bool,
    pub mime_type: Option<String>,
}

/// Immediate children of `parent_path`, captured at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirListing {
    pub files: Vec<DirEntry>,
    pub parent_path: String,
    pub depth: usize,
}
