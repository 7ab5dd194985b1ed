pub mod export;
pub mod log;
pub mod report;
pub mod session;
pub mod strata;

use std::error::Error;

use blockrand_log::SqliteLogStore;

use crate::config::SessionConfig;

pub(crate) fn open_store(config: &SessionConfig) -> Result<SqliteLogStore, Box<dyn Error>> {
    if let Some(parent) = config.log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteLogStore::open(&config.log_path)?)
}
