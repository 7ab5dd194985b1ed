use std::fs;
use std::path::Path;

use blockrand_core::{local_timestamp, ErrorInfo, LogStore, RandError};
use blockrand_log::{records_to_csv, CSV_FILE_NAME};
use serde::{Deserialize, Serialize};

use crate::pages::{render_log_page, validate_config, ReportConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub record_count: usize,
    pub files: Vec<String>,
    pub generated_at: String,
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RandError> {
    fs::write(path, bytes).map_err(|err| {
        RandError::Persistence(
            ErrorInfo::new("blockrand_web.write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Writes `index.html`, the CSV export and `manifest.json` into `out_dir`.
///
/// A failing log read aborts the build; it is never rendered as an empty log.
pub fn build_report<S: LogStore + ?Sized>(
    store: &S,
    config: &ReportConfig,
    out_dir: &Path,
) -> Result<BuildManifest, RandError> {
    validate_config(config)?;
    let records = store.read_all_records()?;
    fs::create_dir_all(out_dir).map_err(|err| {
        RandError::Persistence(
            ErrorInfo::new("blockrand_web.output_dir", err.to_string())
                .with_context("path", out_dir.display().to_string()),
        )
    })?;
    let page = render_log_page(config, &records);
    write_file(&out_dir.join("index.html"), page.as_bytes())?;
    write_file(&out_dir.join(CSV_FILE_NAME), &records_to_csv(&records)?)?;
    let manifest = BuildManifest {
        record_count: records.len(),
        files: vec!["index.html".into(), CSV_FILE_NAME.into()],
        generated_at: local_timestamp(),
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|err| RandError::persistence("blockrand_web.manifest", err))?;
    write_file(&out_dir.join("manifest.json"), &manifest_bytes)?;
    Ok(manifest)
}
