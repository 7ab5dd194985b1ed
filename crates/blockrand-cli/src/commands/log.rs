use std::error::Error;

use blockrand_core::{AssignmentRecord, LogStore, RECORD_FIELDS};
use clap::Args;

use crate::commands::open_store;
use crate::config::SessionConfig;

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Show only the most recent N assignments
    #[arg(long)]
    pub tail: Option<usize>,
}

pub fn run(args: &LogArgs, config: &SessionConfig) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    print!("{}", render_log(&store, args.tail));
    Ok(())
}

/// Renders the log view. A failed read is reported as an error, distinct from
/// an empty log.
pub(crate) fn render_log<S: LogStore + ?Sized>(store: &S, tail: Option<usize>) -> String {
    match store.read_all_records() {
        Ok(records) if records.is_empty() => "No assignments recorded yet.\n".to_string(),
        Ok(records) => {
            let skip = tail.map_or(0, |n| records.len().saturating_sub(n));
            render_table(&records[skip..])
        }
        Err(err) => format!("error: could not read the assignment log: {err}\n"),
    }
}

pub(crate) fn render_table(records: &[AssignmentRecord]) -> String {
    let rows: Vec<[String; 7]> = records.iter().map(AssignmentRecord::to_fields).collect();
    let mut widths: Vec<usize> = RECORD_FIELDS.iter().map(|field| field.len()).collect();
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(value.chars().count());
        }
    }
    let mut out = String::new();
    push_row(&mut out, RECORD_FIELDS.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockrand_core::{Group, Stratum};
    use blockrand_log::MemoryLogStore;

    fn record() -> AssignmentRecord {
        let stratum = Stratum::all()[7];
        AssignmentRecord {
            subject_id: "S-001".into(),
            age_level: stratum.age,
            duration_level: stratum.duration,
            bev_free_level: stratum.bev_free,
            stratum_key: stratum.key(),
            assigned_group: Group::A,
            timestamp: "2024-05-01 09:30:00".into(),
        }
    }

    #[test]
    fn empty_and_failed_reads_render_differently() {
        let store = MemoryLogStore::new();
        assert_eq!(render_log(&store, None), "No assignments recorded yet.\n");
        store.fail_reads(true);
        assert!(render_log(&store, None).starts_with("error: could not read"));
    }

    #[test]
    fn table_lists_header_then_rows() {
        let table = render_table(&[record()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("subject_id"));
        assert!(lines[2].contains(">=75_>=18mo_>=2mo"));
        assert!(lines[2].contains("Group A"));
    }

    #[test]
    fn tail_limits_rows() {
        let store = MemoryLogStore::new();
        for _ in 0..3 {
            store.append_record(&record()).expect("append");
        }
        assert_eq!(render_log(&store, Some(1)).lines().count(), 3);
    }
}
