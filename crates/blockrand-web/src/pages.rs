use blockrand_core::{AssignmentRecord, ErrorInfo, RandError, GROUPS, RECORD_FIELDS};
use blockrand_log::{LogSummary, CSV_FILE_NAME};
use html_escape::encode_text;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Randomization Log".into(),
        }
    }
}

pub fn validate_config(config: &ReportConfig) -> Result<(), RandError> {
    if config.title.trim().is_empty() {
        return Err(RandError::Config(ErrorInfo::new(
            "blockrand_web.config_title",
            "report title cannot be empty",
        )));
    }
    Ok(())
}

/// Renders the log table, the per-stratum summary and a CSV download link.
pub fn render_log_page(config: &ReportConfig, records: &[AssignmentRecord]) -> String {
    let title = encode_text(&config.title);
    let body = if records.is_empty() {
        "<p class=\"info\">No assignments recorded yet.</p>".to_string()
    } else {
        format!(
            "{table}<h2>Summary</h2>{summary}<p><a href=\"{csv}\" download>Download CSV</a></p>",
            table = render_table(records),
            summary = render_summary(&LogSummary::from_records(records)),
            csv = CSV_FILE_NAME,
        )
    };
    format!(
        "<html><head><meta charset=\"utf-8\"><title>{title}</title></head><body><h1>{title}</h1>{body}</body></html>"
    )
}

fn render_table(records: &[AssignmentRecord]) -> String {
    let mut header = String::new();
    for field in RECORD_FIELDS {
        header.push_str(&format!("<th>{field}</th>"));
    }
    let mut rows = String::new();
    for record in records {
        rows.push_str("<tr>");
        for value in record.to_fields() {
            rows.push_str(&format!("<td>{}</td>", encode_text(&value)));
        }
        rows.push_str("</tr>");
    }
    format!("<table><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>")
}

fn render_summary(summary: &LogSummary) -> String {
    let mut header = String::from("<th>stratum_key</th>");
    for group in GROUPS {
        header.push_str(&format!("<th>{group}</th>"));
    }
    let mut rows = String::new();
    for (stratum, counts) in &summary.per_stratum {
        rows.push_str(&format!("<tr><td>{}</td>", encode_text(stratum)));
        for group in GROUPS {
            rows.push_str(&format!(
                "<td>{}</td>",
                counts.get(&group).copied().unwrap_or(0)
            ));
        }
        rows.push_str("</tr>");
    }
    format!(
        "<p>Total assignments: {total}</p><table><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>",
        total = summary.total
    )
}
