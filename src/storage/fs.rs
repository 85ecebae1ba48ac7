// Saved-site mirror on the local filesystem

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use log::{debug, trace};

use super::{DocumentSource, SourceMetrics, SourceMetricsStats};
use crate::error::{Error, Result};

const SITE_DIR: &str = "en.wikipedia.org";

/// Pages stored as `<root>/en.wikipedia.org/wiki/<page>.html`.
#[derive(Debug)]
pub struct FsPageStore {
    root: PathBuf,
    metrics: SourceMetrics,
}

impl FsPageStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            metrics: SourceMetrics::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `page_key`. Keys are percent-decoded and must stay below the root.
    pub fn page_path(&self, page_key: &str) -> Result<PathBuf> {
        let decoded = urlencoding::decode(page_key)
            .map_err(|e| Error::storage(format!("Invalid page key {:?}: {}", page_key, e)))?;

        if decoded.is_empty() || decoded.starts_with('/') || decoded.contains('\\') || decoded.contains('\0') {
            return Err(Error::storage(format!("Invalid page key: {:?}", page_key)));
        }
        let relative = Path::new(decoded.as_ref());
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(Error::storage(format!("Page key escapes the site root: {:?}", page_key)));
        }

        Ok(self.root.join(SITE_DIR).join("wiki").join(format!("{}.html", decoded)))
    }
}

impl DocumentSource for FsPageStore {
    fn fetch(&self, page_key: &str) -> Result<Option<Arc<str>>> {
        let path = self.page_path(page_key)?;
        if !path.is_file() {
            debug!("Page {} not found at {:?}", page_key, path);
            self.metrics.record_not_found();
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|e| {
            self.metrics.record_failure();
            Error::storage(format!("Failed to read {:?}: {}", path, e))
        })?;
        self.metrics.record_read(bytes.len());
        trace!("Read {} bytes for page {}", bytes.len(), page_key);

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Some(Arc::from(text)))
    }

    fn describe(&self) -> String {
        format!("saved site at {:?}", self.root)
    }

    fn metrics(&self) -> Option<SourceMetricsStats> {
        Some(self.metrics.get_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_page(key: &str, body: &str) -> (tempfile::TempDir, FsPageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPageStore::new(dir.path());
        let path = store.page_path(key).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        (dir, store)
    }

    #[test]
    fn test_fetch_existing_and_missing() {
        let (_dir, store) = store_with_page("Apollo_11", "<p>Apollo</p>");
        assert_eq!(store.fetch("Apollo_11").unwrap().as_deref(), Some("<p>Apollo</p>"));
        assert!(store.fetch("Apollo_12").unwrap().is_none());

        let stats = store.metrics().unwrap();
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.bytes_read, 13);
    }

    #[test]
    fn test_percent_encoded_keys() {
        let (dir, store) = store_with_page("Caf%C3%A9", "x");
        assert_eq!(
            store.page_path("Caf%C3%A9").unwrap(),
            dir.path().join("en.wikipedia.org/wiki/Café.html")
        );
        assert!(store.fetch("Café").unwrap().is_some());
    }

    #[test]
    fn test_rejects_traversal() {
        let store = FsPageStore::new("/srv/site");
        assert!(store.page_path("../etc/passwd").is_err());
        assert!(store.page_path("%2E%2E/secret").is_err());
        assert!(store.page_path("/etc/passwd").is_err());
        assert!(store.page_path("").is_err());
        assert!(store.page_path("Talk:Moon/Archive_1").is_ok());
    }
}
