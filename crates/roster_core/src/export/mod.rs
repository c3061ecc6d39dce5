use time::Date;

use crate::domain::{Severity, TaskTemplate, Violation, ViolationType};
use crate::error::AppError;
use crate::normalize::clock::parse_instant;
use crate::settings::ComplianceSettings;

const UTF8_BOM: &str = "\u{feff}";

pub const CSV_HEADERS: [&str; 7] = ["שם", "סוג", "חומרה", "פרטים", "תאריך", "שעה", "משימה"];

pub fn type_label(kind: ViolationType) -> &'static str {
    match kind {
        ViolationType::RestTime => "מנוחה",
        ViolationType::RoleMismatch => "הסמכה",
        ViolationType::AbsenceConflict => "התנגשות",
    }
}

/// Only `high` has its own label; everything else reads as medium.
pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "קריטי",
        _ => "בינוני",
    }
}

fn csv_err(e: impl std::fmt::Display) -> AppError {
    AppError::new("EXPORT_CSV_WRITE_FAILED", "Failed to write compliance CSV")
        .with_details(e.to_string())
}

/// Serialize violations as a BOM-prefixed UTF-8 CSV, one row per violation, in the given order.
///
/// Columns: person, type label, severity label, details (commas replaced by spaces), first
/// shift's local start date (`D.M.YYYY`), local start hour (`HH:MM`), task name.
pub fn export_violations_csv(
    violations: &[Violation<'_>],
    tasks: &[TaskTemplate],
    settings: &ComplianceSettings,
) -> Result<Vec<u8>, AppError> {
    let offset = settings.offset();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.as_bytes().to_vec());

    wtr.write_record(CSV_HEADERS).map_err(csv_err)?;

    for v in violations {
        let first = v.shifts.first();
        let start = first.and_then(|s| parse_instant(&s.start_time, offset));
        let (date, hour) = match start {
            Some(dt) => {
                let local = dt.to_offset(offset);
                (
                    format!("{}.{}.{}", local.day(), u8::from(local.month()), local.year()),
                    format!("{:02}:{:02}", local.hour(), local.minute()),
                )
            }
            None => (String::new(), String::new()),
        };
        let task_name = first
            .and_then(|s| tasks.iter().find(|t| t.id == s.task_id))
            .map(|t| t.name.as_str())
            .unwrap_or(settings.unknown_task_label.as_str());

        wtr.write_record([
            v.person.name.as_str(),
            type_label(v.kind),
            severity_label(v.severity),
            v.details.replace(',', " ").as_str(),
            date.as_str(),
            hour.as_str(),
            task_name,
        ])
        .map_err(csv_err)?;
    }

    let bytes = wtr.into_inner().map_err(csv_err)?;
    tracing::debug!(rows = violations.len(), bytes = bytes.len(), "exported compliance CSV");
    Ok(bytes)
}

/// File name embedding the active date range, e.g. `compliance_report_2024-01-01_2024-01-31.csv`.
pub fn export_file_name(from: Date, to: Date, settings: &ComplianceSettings) -> String {
    format!("{}_{from}_{to}.csv", settings.export_file_prefix)
}
