//! Static report pages for the assignment log.

pub mod build;
pub mod pages;

pub use build::{build_report, BuildManifest};
pub use pages::{render_log_page, ReportConfig};
