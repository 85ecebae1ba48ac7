pub mod failed_log;
pub mod links;
pub mod report;
pub mod url;

pub use self::failed_log::{FailedItemLog, FAILED_LOG};
pub use self::links::rewrite_links;
pub use self::report::RunReport;
pub use self::url::page_key_from_url;
