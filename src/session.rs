use std::collections::HashMap;
use std::fmt;

// -----------------------------------------------------------------------------
// File identity
// -----------------------------------------------------------------------------

/// Canonical identity of a file being transformed.
///
/// Always a full path: two `index.js` files in different directories must not
/// share a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    /// Build an identity from the host's filename, joining it onto `cwd` when
    /// the name is relative.
    pub fn resolve(filename: Option<&str>, cwd: Option<&str>) -> Self {
        let Some(filename) = filename else {
            return FileId("unknown".to_string());
        };
        let name = normalize_filename(filename);
        if is_absolute(&name) {
            return FileId(name);
        }
        match cwd {
            Some(cwd) if !cwd.is_empty() => {
                let cwd = normalize_filename(cwd);
                let rel = name.strip_prefix("./").unwrap_or(&name);
                FileId(format!("{}/{}", cwd.trim_end_matches('/'), rel))
            }
            _ => FileId(name),
        }
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        FileId(s.to_string())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize host filenames (windows separators, `file://` urls).
fn normalize_filename(filename: &str) -> String {
    let s = filename.replace('\\', "/");
    if let Some(rest) = s.strip_prefix("file://") {
        return rest.to_string();
    }
    s
}

fn is_absolute(name: &str) -> bool {
    if name.starts_with('/') {
        return true;
    }
    // C:/...
    let b = name.as_bytes();
    b.len() > 2 && b[0].is_ascii_alphabetic() && b[1] == b':' && b[2] == b'/'
}

// -----------------------------------------------------------------------------
// Per-file session state
// -----------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct FileSession {
    transformed: bool,
    model_paths: Vec<String>,
}

impl FileSession {
    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    pub fn model_paths(&self) -> &[String] {
        &self.model_paths
    }
}

/// Registration accumulator and transform cache, keyed by file.
///
/// Owned by whoever drives the traversal and handed to the transform by
/// reference; nothing here is ambient.
#[derive(Debug, Default)]
pub struct SessionStore {
    files: HashMap<FileId, FileSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session for `file`. Must run once before each traversal
    /// of that file, including re-runs on a later revision.
    pub fn reset_session(&mut self, file: &FileId) {
        tracing::debug!(file = %file, "[dva-hmr] session reset");
        self.files.insert(file.clone(), FileSession::default());
    }

    /// Append in discovery order. Duplicates are kept.
    pub fn append(&mut self, file: &FileId, model_path: String) {
        self.files
            .entry(file.clone())
            .or_default()
            .model_paths
            .push(model_path);
    }

    pub fn is_transformed(&self, file: &FileId) -> bool {
        self.files.get(file).map(|s| s.transformed).unwrap_or(false)
    }

    pub fn mark_transformed(&mut self, file: &FileId) {
        self.files.entry(file.clone()).or_default().transformed = true;
    }

    pub fn model_paths(&self, file: &FileId) -> &[String] {
        self.files
            .get(file)
            .map(|s| s.model_paths.as_slice())
            .unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn session(&self, file: &FileId) -> Option<&FileSession> {
        self.files.get(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_discovery_order_and_duplicates() {
        let mut store = SessionStore::new();
        let file = FileId::from("/app/src/index.js");
        store.reset_session(&file);
        store.append(&file, "./models/a".into());
        store.append(&file, "./models/b".into());
        store.append(&file, "./models/a".into());
        assert_eq!(
            store.model_paths(&file),
            &["./models/a", "./models/b", "./models/a"]
        );
    }

    #[test]
    fn reset_clears_flag_and_paths() {
        let mut store = SessionStore::new();
        let file = FileId::from("/app/src/index.js");
        store.append(&file, "./models/a".into());
        store.mark_transformed(&file);
        assert!(store.is_transformed(&file));

        store.reset_session(&file);
        assert!(!store.is_transformed(&file));
        assert!(store.model_paths(&file).is_empty());
        let session = store.session(&file).expect("reset creates the session");
        assert!(!session.is_transformed());
        assert!(session.model_paths().is_empty());
    }

    #[test]
    fn sessions_are_isolated_per_file() {
        let mut store = SessionStore::new();
        let a = FileId::from("/app/a/index.js");
        let b = FileId::from("/app/b/index.js");
        store.append(&a, "./models/a".into());
        store.mark_transformed(&a);
        assert!(!store.is_transformed(&b));
        assert!(store.model_paths(&b).is_empty());
    }

    #[test]
    fn relative_names_are_joined_onto_cwd() {
        let id = FileId::resolve(Some("./src/index.js"), Some("/home/me/proj/"));
        assert_eq!(id.as_str(), "/home/me/proj/src/index.js");

        let abs = FileId::resolve(Some("/abs/index.js"), Some("/home/me/proj"));
        assert_eq!(abs.as_str(), "/abs/index.js");

        let win = FileId::resolve(Some("C:\\proj\\src\\index.js"), None);
        assert_eq!(win.as_str(), "C:/proj/src/index.js");

        assert_eq!(FileId::resolve(None, None).as_str(), "unknown");
    }

    #[test]
    fn file_urls_are_stripped() {
        let id = FileId::resolve(Some("file:///srv/app/index.js"), None);
        assert_eq!(id.as_str(), "/srv/app/index.js");
    }
}
