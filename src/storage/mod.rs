// storage/mod.rs

pub mod cache;
pub mod fs;
pub mod memory;
pub mod metrics;

use std::sync::Arc;

use crate::error::Result;

pub use self::cache::CachedSource;
pub use self::fs::FsPageStore;
pub use self::memory::MemoryPageStore;
pub use self::metrics::{SourceMetrics, SourceMetricsStats};

/// Resolves a page key to the cached markup of that page.
///
/// `Ok(None)` means the page is not available; `Err` is reserved for
/// failures reading a page that should exist.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, page_key: &str) -> Result<Option<Arc<str>>>;

    /// Short label for log lines.
    fn describe(&self) -> String {
        "document source".to_string()
    }

    fn metrics(&self) -> Option<SourceMetricsStats> {
        None
    }
}

impl<S: DocumentSource + ?Sized> DocumentSource for Arc<S> {
    fn fetch(&self, page_key: &str) -> Result<Option<Arc<str>>> {
        (**self).fetch(page_key)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn metrics(&self) -> Option<SourceMetricsStats> {
        (**self).metrics()
    }
}
