use serde::Deserialize;

pub const ROOT_PATH: &str = "/";

#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

impl PathQuery {
    pub fn raw_path(&self) -> &str {
        raw_or_root(self.path.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub path: Option<String>,
    pub with_parents: Option<String>,
    pub with_parents_top_parent: Option<String>,
}

impl ListQuery {
    pub fn raw_path(&self) -> &str {
        raw_or_root(self.path.as_deref())
    }

    /// Ancestor mode is only selected by the literal `true`.
    pub fn wants_parents(&self) -> bool {
        self.with_parents.as_deref() == Some("true")
    }

    pub fn raw_stop_ancestor(&self) -> &str {
        raw_or_root(self.with_parents_top_parent.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameUpdates {
    pub path: String,
}

/// Body of `PUT /directories` and `PUT /files`.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub path: String,
    pub updates: RenameUpdates,
}

fn raw_or_root(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if !path.is_empty() => path,
        _ => ROOT_PATH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_path_defaults_to_root() {
        assert_eq!(PathQuery::default().raw_path(), "/");
        let query = PathQuery {
            path: Some(String::new()),
        };
        assert_eq!(query.raw_path(), "/");
    }

    #[test]
    fn with_parents_requires_literal_true() {
        let mut query = ListQuery {
            with_parents: Some("true".to_string()),
            ..Default::default()
        };
        assert!(query.wants_parents());
        query.with_parents = Some("1".to_string());
        assert!(!query.wants_parents());
        query.with_parents = None;
        assert!(!query.wants_parents());
    }

    #[test]
    fn rename_body_parses_nested_updates() {
        let body: RenameRequest =
            serde_json::from_str(r#"{"path":"/a.txt","updates":{"path":"/b.txt"}}"#).unwrap();
        assert_eq!(body.path, "/a.txt");
        assert_eq!(body.updates.path, "/b.txt");
    }
}
