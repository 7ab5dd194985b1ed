use std::fs::File;
use std::io::Write;
use std::path::Path;

use blockrand_core::{AssignmentRecord, ErrorInfo, LogStore, RandError, RECORD_FIELDS};

/// Default file name offered for log downloads.
pub const CSV_FILE_NAME: &str = "randomization_log.csv";

fn export_error(err: impl ToString) -> RandError {
    RandError::persistence("blockrand_log.export", err)
}

/// Writes records as UTF-8 CSV: header row of field names, then one row per
/// record in the given order.
pub fn write_csv<W: Write>(records: &[AssignmentRecord], out: W) -> Result<(), RandError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(RECORD_FIELDS).map_err(export_error)?;
    for record in records {
        wtr.write_record(record.to_fields()).map_err(export_error)?;
    }
    wtr.flush().map_err(export_error)
}

pub fn records_to_csv(records: &[AssignmentRecord]) -> Result<Vec<u8>, RandError> {
    let mut bytes = Vec::new();
    write_csv(records, &mut bytes)?;
    Ok(bytes)
}

/// Exports the whole log to `out_path`, returning the number of rows written.
pub fn export_csv<S: LogStore + ?Sized>(store: &S, out_path: &Path) -> Result<usize, RandError> {
    let records = store.read_all_records()?;
    let file = File::create(out_path).map_err(|err| {
        RandError::Persistence(
            ErrorInfo::new("blockrand_log.export", err.to_string())
                .with_context("path", out_path.display().to_string()),
        )
    })?;
    write_csv(&records, file)?;
    Ok(records.len())
}
