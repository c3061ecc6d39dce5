use crate::analytics::ComplianceSummary;
use crate::domain::Violation;
use crate::export::{severity_label, type_label};
use crate::normalize::clock::from_unix_millis;
use crate::settings::ComplianceSettings;

fn local_stamp(millis: i64, settings: &ComplianceSettings) -> String {
    match from_unix_millis(millis) {
        Some(dt) => {
            let local = dt.to_offset(settings.offset());
            format!(
                "{}.{}.{} {:02}:{:02}",
                local.day(),
                u8::from(local.month()),
                local.year(),
                local.hour(),
                local.minute()
            )
        }
        None => "UNKNOWN".to_string(),
    }
}

fn escape_cell(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Deterministic Markdown compliance report.
///
/// Violations are listed in the order given; pass them through
/// [`crate::query::apply_query`] first to control sorting.
pub fn generate_compliance_markdown(
    violations: &[Violation<'_>],
    summary: &ComplianceSummary,
    settings: &ComplianceSettings,
) -> String {
    let mut out = String::new();
    out.push_str("# דוח חריגות שיבוץ\n\n");

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Violations: **{}**\n", summary.violation_count));
    out.push_str(&format!("- People affected: **{}**\n", summary.people_affected));
    out.push_str(&format!("- Shifts affected: **{}**\n", summary.shifts_affected));
    out.push('\n');

    out.push_str("## By type\n\n");
    for t in &summary.by_type {
        out.push_str(&format!("- {} (`{}`): {}\n", t.label, t.kind.as_str(), t.count));
    }
    out.push('\n');

    out.push_str("## By severity\n\n");
    for s in &summary.by_severity {
        out.push_str(&format!("- `{}`: {}\n", s.severity.as_str(), s.count));
    }
    out.push('\n');

    out.push_str("## People with most violations\n\n");
    if summary.top_people.is_empty() {
        out.push_str("- None.\n");
    }
    for p in &summary.top_people {
        out.push_str(&format!(
            "- {}: {} (critical: {})\n",
            p.label, p.count, p.high_count
        ));
    }
    out.push('\n');

    out.push_str("## Violations\n\n");
    if violations.is_empty() {
        out.push_str("- None.\n");
        return out;
    }
    out.push_str("| Person | Type | Severity | When | Shifts | Details |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for v in violations {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&v.person.name),
            type_label(v.kind),
            severity_label(v.severity),
            local_stamp(v.timestamp, settings),
            v.shift_ids().join(", "),
            escape_cell(&v.details)
        ));
    }

    out
}
