use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::{Severity, Violation, ViolationType};
use crate::normalize::clock::{from_unix_millis, local_date};
use crate::settings::ComplianceSettings;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    #[default]
    Date,
    Severity,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Filter and sort options of the compliance report screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViolationQuery {
    /// Case-insensitive substring of the person's name.
    pub search: Option<String>,
    pub kind: Option<ViolationType>,
    pub severity: Option<Severity>,
    /// Inclusive local calendar window on the violation timestamp.
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

fn matches(
    v: &Violation<'_>,
    query: &ViolationQuery,
    needle: Option<&str>,
    settings: &ComplianceSettings,
) -> bool {
    if let Some(needle) = needle {
        if !v.person.name.to_lowercase().contains(needle) {
            return false;
        }
    }
    if query.kind.is_some_and(|k| k != v.kind) {
        return false;
    }
    if query.severity.is_some_and(|s| s != v.severity) {
        return false;
    }
    if query.from.is_some() || query.to.is_some() {
        let Some(day) = from_unix_millis(v.timestamp).map(|dt| local_date(dt, settings.offset()))
        else {
            return false;
        };
        if query.from.is_some_and(|from| day < from) || query.to.is_some_and(|to| day > to) {
            return false;
        }
    }
    true
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Apply the screen's filters, then sort. Ties break on violation id so output is stable
/// regardless of detection order.
pub fn apply_query<'a>(
    violations: Vec<Violation<'a>>,
    query: &ViolationQuery,
    settings: &ComplianceSettings,
) -> Vec<Violation<'a>> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut out: Vec<Violation<'a>> = violations
        .into_iter()
        .filter(|v| matches(v, query, needle.as_deref(), settings))
        .collect();

    out.sort_by(|a, b| {
        let primary = match query.sort {
            SortKey::Name => compare_names(&a.person.name, &b.person.name),
            SortKey::Date => a.timestamp.cmp(&b.timestamp),
            SortKey::Severity => a.severity.rank().cmp(&b.severity.rank()),
        };
        let primary = match query.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });

    out
}
