//! Compliance violation detection over an in-memory roster snapshot.
//!
//! Three independent rules run for every person: rest time between consecutive shifts, role
//! composition, and absence/hourly-blockage conflicts. A shift may trigger any combination of
//! them. Missing cross-references never fail the run; they simply mean "no constraint".

pub mod requirements;

use std::collections::HashMap;

use time::{OffsetDateTime, UtcOffset};

use crate::domain::{
    Absence, AbsenceStatus, HourlyBlockage, Person, RosterSnapshot, Segment, Severity, Shift,
    TaskTemplate, Violation, ViolationType,
};
use crate::normalize::clock::{
    add_hours, hours_between, local_date, local_instant, parse_date, parse_instant,
    parse_wall_time, unix_millis, windows_overlap, DAY_END, DAY_START,
};
use crate::settings::ComplianceSettings;

use requirements::{min_rest_hours, required_roles};

const ROLE_SEPARATOR: &str = " או ";
const ABSENCE_FALLBACK: &str = "היעדרות";
const BLOCKAGE_FALLBACK: &str = "חסימה שעתית";

/// An active shift with its window parsed once per run.
#[derive(Debug, Clone, Copy)]
struct TimedShift<'a> {
    shift: &'a Shift,
    start: OffsetDateTime,
    end: OffsetDateTime,
}

/// Lookup tables built once per run. First occurrence wins on duplicate ids.
struct RosterIndex<'a> {
    tasks: HashMap<&'a str, &'a TaskTemplate>,
    role_names: HashMap<&'a str, &'a str>,
    absences: HashMap<&'a str, Vec<&'a Absence>>,
    blockages: HashMap<&'a str, Vec<&'a HourlyBlockage>>,
    active_shifts: Vec<TimedShift<'a>>,
    offset: UtcOffset,
}

impl<'a> RosterIndex<'a> {
    fn build(snapshot: &'a RosterSnapshot, offset: UtcOffset) -> Self {
        let mut tasks = HashMap::new();
        for task in &snapshot.tasks {
            tasks.entry(task.id.as_str()).or_insert(task);
        }

        let mut role_names = HashMap::new();
        for role in &snapshot.roles {
            role_names
                .entry(role.id.as_str())
                .or_insert(role.name.as_str());
        }

        let mut absences: HashMap<&str, Vec<&Absence>> = HashMap::new();
        for absence in &snapshot.absences {
            absences
                .entry(absence.person_id.as_str())
                .or_default()
                .push(absence);
        }

        let mut blockages: HashMap<&str, Vec<&HourlyBlockage>> = HashMap::new();
        for blockage in &snapshot.hourly_blockages {
            blockages
                .entry(blockage.person_id.as_str())
                .or_default()
                .push(blockage);
        }

        let mut active_shifts = Vec::new();
        for shift in snapshot.shifts.iter().filter(|s| !s.is_cancelled) {
            let start = parse_instant(&shift.start_time, offset);
            let end = parse_instant(&shift.end_time, offset);
            match (start, end) {
                (Some(start), Some(end)) => active_shifts.push(TimedShift { shift, start, end }),
                _ => tracing::warn!(
                    shift_id = %shift.id,
                    start_time = %shift.start_time,
                    end_time = %shift.end_time,
                    "skipping shift with unparseable window"
                ),
            }
        }

        Self {
            tasks,
            role_names,
            absences,
            blockages,
            active_shifts,
            offset,
        }
    }

    fn segment(&self, shift: &Shift) -> Option<&'a Segment> {
        self.tasks
            .get(shift.task_id.as_str())
            .copied()
            .and_then(|task| task.segment(&shift.segment_id))
    }

    /// Active shifts assigned to `person`, ordered by start, then end, then id, so adjacency
    /// never depends on input order.
    fn shifts_for(&self, person: &Person) -> Vec<TimedShift<'a>> {
        let mut out: Vec<TimedShift<'a>> = self
            .active_shifts
            .iter()
            .filter(|t| t.shift.is_assigned_to(&person.id))
            .copied()
            .collect();
        out.sort_by(|a, b| (a.start, a.end, &a.shift.id).cmp(&(b.start, b.end, &b.shift.id)));
        out
    }
}

/// Scan every active assignment in `snapshot` and report rule violations.
///
/// The result is a pure function of the snapshot and settings: identical inputs produce
/// identical violations (ids included). Output is grouped by person in input order; callers
/// sort via [`crate::query::apply_query`].
#[tracing::instrument(
    skip_all,
    fields(people = snapshot.people.len(), shifts = snapshot.shifts.len())
)]
pub fn detect_violations<'a>(
    snapshot: &'a RosterSnapshot,
    settings: &ComplianceSettings,
) -> Vec<Violation<'a>> {
    let index = RosterIndex::build(snapshot, settings.offset());
    let mut out = Vec::new();

    for person in &snapshot.people {
        let shifts = index.shifts_for(person);
        if shifts.is_empty() {
            continue;
        }
        check_rest_time(&index, person, &shifts, &mut out);
        check_role_composition(&index, person, &shifts, &mut out);
        check_conflicts(&index, person, &shifts, &mut out);
    }

    tracing::debug!(violations = out.len(), "compliance scan finished");
    out
}

fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.0}")
    } else {
        format!("{hours}")
    }
}

fn check_rest_time<'a>(
    index: &RosterIndex<'a>,
    person: &'a Person,
    shifts: &[TimedShift<'a>],
    out: &mut Vec<Violation<'a>>,
) {
    for pair in shifts.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let min_rest = min_rest_hours(current.shift, index.segment(current.shift));
        if min_rest <= 0.0 {
            continue;
        }
        let Some(rest_deadline) = add_hours(current.end, min_rest) else {
            tracing::warn!(shift_id = %current.shift.id, min_rest, "rest requirement out of range");
            continue;
        };
        if next.start >= rest_deadline {
            continue;
        }

        let actual_rest = hours_between(current.end, next.start);
        let severity = if actual_rest < min_rest / 2.0 {
            Severity::High
        } else {
            Severity::Medium
        };

        out.push(Violation {
            id: format!("rest-{}-{}-{}", current.shift.id, next.shift.id, person.id),
            kind: ViolationType::RestTime,
            person,
            shifts: vec![current.shift, next.shift],
            details: format!(
                "מנוחה של {actual_rest:.1} שעות בלבד (נדרשות {} שעות)",
                format_hours(min_rest)
            ),
            severity,
            timestamp: unix_millis(current.start),
        });
    }
}

fn check_role_composition<'a>(
    index: &RosterIndex<'a>,
    person: &'a Person,
    shifts: &[TimedShift<'a>],
    out: &mut Vec<Violation<'a>>,
) {
    let held = person.effective_role_ids();

    for timed in shifts {
        let required = required_roles(timed.shift, index.segment(timed.shift));
        if required.is_empty() {
            continue;
        }
        let satisfied = required
            .iter()
            .any(|req| held.contains(&req.role_id.as_str()));
        if satisfied {
            continue;
        }

        let names: Vec<&str> = required
            .iter()
            .filter_map(|req| index.role_names.get(req.role_id.as_str()).copied())
            .collect();
        let details = if names.is_empty() {
            "חסר תפקיד נדרש".to_string()
        } else {
            format!("חסר תפקיד נדרש: {}", names.join(ROLE_SEPARATOR))
        };

        out.push(Violation {
            id: format!("role-{}-{}", timed.shift.id, person.id),
            kind: ViolationType::RoleMismatch,
            person,
            shifts: vec![timed.shift],
            details,
            severity: Severity::High,
            timestamp: unix_millis(timed.start),
        });
    }
}

fn absence_window(
    absence: &Absence,
    offset: UtcOffset,
) -> Option<(OffsetDateTime, OffsetDateTime)> {
    let start_date = parse_date(&absence.start_date)?;
    let end_date = parse_date(&absence.end_date)?;
    let start_time = match absence.start_time.as_deref() {
        Some(raw) => parse_wall_time(raw)?,
        None => DAY_START,
    };
    let end_time = match absence.end_time.as_deref() {
        Some(raw) => parse_wall_time(raw)?,
        None => DAY_END,
    };
    Some((
        local_instant(start_date, start_time, offset),
        local_instant(end_date, end_time, offset),
    ))
}

fn blockage_window(
    blockage: &HourlyBlockage,
    offset: UtcOffset,
) -> Option<(time::Date, OffsetDateTime, OffsetDateTime)> {
    let date = parse_date(&blockage.date)?;
    let start = parse_wall_time(&blockage.start_time)?;
    let end = parse_wall_time(&blockage.end_time)?;
    Some((
        date,
        local_instant(date, start, offset),
        local_instant(date, end, offset),
    ))
}

fn reason_or<'r>(reason: Option<&'r str>, fallback: &'r str) -> &'r str {
    reason.map(str::trim).filter(|r| !r.is_empty()).unwrap_or(fallback)
}

fn check_conflicts<'a>(
    index: &RosterIndex<'a>,
    person: &'a Person,
    shifts: &[TimedShift<'a>],
    out: &mut Vec<Violation<'a>>,
) {
    let absences = index
        .absences
        .get(person.id.as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let blockages = index
        .blockages
        .get(person.id.as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for timed in shifts {
        // First matching record only; further overlaps for the same shift are not reported.
        let absence = absences
            .iter()
            .filter(|a| a.status == AbsenceStatus::Approved)
            .find(|a| {
                absence_window(a, index.offset)
                    .is_some_and(|(start, end)| windows_overlap(timed.start, timed.end, start, end))
            });
        if let Some(absence) = absence {
            out.push(Violation {
                id: format!("absence-{}-{}", timed.shift.id, person.id),
                kind: ViolationType::AbsenceConflict,
                person,
                shifts: vec![timed.shift],
                details: format!(
                    "שיבוץ בזמן היעדרות: {}",
                    reason_or(absence.reason.as_deref(), ABSENCE_FALLBACK)
                ),
                severity: Severity::High,
                timestamp: unix_millis(timed.start),
            });
        }

        let shift_date = local_date(timed.start, index.offset);
        let blockage = blockages.iter().find(|b| {
            blockage_window(b, index.offset).is_some_and(|(date, start, end)| {
                date == shift_date && windows_overlap(timed.start, timed.end, start, end)
            })
        });
        if let Some(blockage) = blockage {
            out.push(Violation {
                id: format!("blockage-{}-{}", timed.shift.id, person.id),
                kind: ViolationType::AbsenceConflict,
                person,
                shifts: vec![timed.shift],
                details: format!(
                    "שיבוץ בזמן חסימה: {}",
                    reason_or(blockage.reason.as_deref(), BLOCKAGE_FALLBACK)
                ),
                severity: Severity::High,
                timestamp: unix_millis(timed.start),
            });
        }
    }
}
