use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use super::DocumentSource;
use crate::error::Result;

/// Pages held in memory, for tests and single-page runs.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: RwLock<AHashMap<String, Arc<str>>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: AsRef<str>>(&self, page_key: K, markup: V) {
        self.pages.write().insert(page_key.into(), Arc::from(markup.as_ref()));
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for MemoryPageStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let store = Self::new();
        for (key, markup) in iter {
            store.insert(key, markup);
        }
        store
    }
}

impl DocumentSource for MemoryPageStore {
    fn fetch(&self, page_key: &str) -> Result<Option<Arc<str>>> {
        Ok(self.pages.read().get(page_key).cloned())
    }

    fn describe(&self) -> String {
        format!("{} in-memory pages", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store: MemoryPageStore = [("Moon", "<p>Moon</p>")].into_iter().collect();
        assert_eq!(store.fetch("Moon").unwrap().as_deref(), Some("<p>Moon</p>"));
        assert!(store.fetch("Sun").unwrap().is_none());
        store.insert("Sun", "<p>Sun</p>");
        assert_eq!(store.len(), 2);
    }
}
