//! Append-only assignment log for blockrand trials.

pub mod export;
pub mod memory;
pub mod query;
pub mod schema;

pub use export::{export_csv, records_to_csv, CSV_FILE_NAME};
pub use memory::MemoryLogStore;
pub use query::LogSummary;
pub use schema::{init_schema, SqliteLogStore};
