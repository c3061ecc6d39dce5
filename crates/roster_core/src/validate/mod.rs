use std::collections::HashSet;

use crate::domain::{RoleRequirement, RosterSnapshot, ValidationWarning};
use crate::normalize::clock::{parse_date, parse_instant, parse_wall_time, DAY_END, DAY_START};
use crate::settings::ComplianceSettings;

fn duplicate_ids<'a>(
    collection: &str,
    ids: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            warnings.push(
                ValidationWarning::new(
                    "VALIDATION_DUPLICATE_ID",
                    format!("Duplicate id in {collection}; first occurrence wins"),
                )
                .with_details(format!("id={id}")),
            );
        }
    }
}

fn unresolved_roles(
    owner: &str,
    required: Option<&[RoleRequirement]>,
    known_roles: &HashSet<&str>,
    warnings: &mut Vec<ValidationWarning>,
) {
    for req in required.unwrap_or(&[]) {
        if !known_roles.contains(req.role_id.as_str()) {
            warnings.push(
                ValidationWarning::new(
                    "VALIDATION_ROLE_UNRESOLVED",
                    "Required role id does not resolve to a role",
                )
                .with_details(format!("{owner}; role_id={}", req.role_id)),
            );
        }
    }
}

/// Surface input problems the detector deliberately tolerates.
///
/// The detector treats dangling references as "no constraint" and lets inverted windows produce
/// negative rest or non-matching overlaps. This pass reports those rows so they can be fixed at
/// the source; it never changes detection results.
pub fn validate_snapshot(
    snapshot: &RosterSnapshot,
    settings: &ComplianceSettings,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let offset = settings.offset();

    duplicate_ids("people", snapshot.people.iter().map(|p| p.id.as_str()), &mut warnings);
    duplicate_ids("shifts", snapshot.shifts.iter().map(|s| s.id.as_str()), &mut warnings);
    duplicate_ids("tasks", snapshot.tasks.iter().map(|t| t.id.as_str()), &mut warnings);
    duplicate_ids("roles", snapshot.roles.iter().map(|r| r.id.as_str()), &mut warnings);

    let known_people: HashSet<&str> = snapshot.people.iter().map(|p| p.id.as_str()).collect();
    let known_roles: HashSet<&str> = snapshot.roles.iter().map(|r| r.id.as_str()).collect();

    for person in &snapshot.people {
        for role_id in person.effective_role_ids() {
            if !known_roles.contains(role_id) {
                warnings.push(
                    ValidationWarning::new(
                        "VALIDATION_ROLE_UNRESOLVED",
                        "Person holds a role id that does not resolve to a role",
                    )
                    .with_details(format!("person_id={}; role_id={role_id}", person.id)),
                );
            }
        }
    }

    for task in &snapshot.tasks {
        for segment in &task.segments {
            let owner = format!("task_id={}; segment_id={}", task.id, segment.id);
            if segment.min_rest_hours_after.is_some_and(|h| h < 0.0) {
                warnings.push(
                    ValidationWarning::new(
                        "VALIDATION_REST_NEGATIVE",
                        "Negative minimum rest is treated as no requirement",
                    )
                    .with_details(owner.clone()),
                );
            }
            unresolved_roles(
                &owner,
                segment.role_composition.as_deref(),
                &known_roles,
                &mut warnings,
            );
        }
    }

    for shift in &snapshot.shifts {
        let start = parse_instant(&shift.start_time, offset);
        let end = parse_instant(&shift.end_time, offset);
        match (start, end) {
            (Some(start), Some(end)) if end < start => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_SHIFT_WINDOW_INVERTED",
                    "Shift ends before it starts",
                )
                .with_details(format!(
                    "shift_id={}; start={}; end={}",
                    shift.id, shift.start_time, shift.end_time
                )),
            ),
            (Some(_), Some(_)) => {}
            _ => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_SHIFT_TS_UNPARSEABLE",
                    "Shift window is unparseable; shift is skipped by detection",
                )
                .with_details(format!(
                    "shift_id={}; start={}; end={}",
                    shift.id, shift.start_time, shift.end_time
                )),
            ),
        }

        match snapshot.task(&shift.task_id) {
            None => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_SHIFT_TASK_UNRESOLVED",
                    "Shift task does not resolve; no task requirements apply",
                )
                .with_details(format!("shift_id={}; task_id={}", shift.id, shift.task_id)),
            ),
            Some(task) if task.segment(&shift.segment_id).is_none() => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_SHIFT_SEGMENT_UNRESOLVED",
                    "Shift segment does not resolve; no segment requirements apply",
                )
                .with_details(format!(
                    "shift_id={}; task_id={}; segment_id={}",
                    shift.id, shift.task_id, shift.segment_id
                )),
            ),
            Some(_) => {}
        }

        for person_id in &shift.assigned_person_ids {
            if !known_people.contains(person_id.as_str()) {
                warnings.push(
                    ValidationWarning::new(
                        "VALIDATION_SHIFT_PERSON_UNKNOWN",
                        "Shift is assigned to an unknown person",
                    )
                    .with_details(format!("shift_id={}; person_id={person_id}", shift.id)),
                );
            }
        }

        if let Some(req) = &shift.requirements {
            if req.min_rest.is_some_and(|h| h < 0.0) {
                warnings.push(
                    ValidationWarning::new(
                        "VALIDATION_REST_NEGATIVE",
                        "Negative minimum rest is treated as no requirement",
                    )
                    .with_details(format!("shift_id={}", shift.id)),
                );
            }
            unresolved_roles(
                &format!("shift_id={}", shift.id),
                req.role_composition.as_deref(),
                &known_roles,
                &mut warnings,
            );
        }
    }

    for (idx, absence) in snapshot.absences.iter().enumerate() {
        let label = absence
            .id
            .clone()
            .unwrap_or_else(|| format!("#{idx}"));
        let start_date = parse_date(&absence.start_date);
        let end_date = parse_date(&absence.end_date);
        let start_time = absence
            .start_time
            .as_deref()
            .map_or(Some(DAY_START), parse_wall_time);
        let end_time = absence
            .end_time
            .as_deref()
            .map_or(Some(DAY_END), parse_wall_time);

        match (start_date, end_date, start_time, end_time) {
            (Some(sd), Some(ed), Some(st), Some(et)) => {
                if (ed, et) < (sd, st) {
                    warnings.push(
                        ValidationWarning::new(
                            "VALIDATION_ABSENCE_RANGE_INVERTED",
                            "Absence ends before it starts; it can never conflict",
                        )
                        .with_details(format!(
                            "absence={label}; person_id={}; start={}; end={}",
                            absence.person_id, absence.start_date, absence.end_date
                        )),
                    );
                }
            }
            _ => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_ABSENCE_UNPARSEABLE",
                    "Absence dates or times are unparseable; it can never conflict",
                )
                .with_details(format!("absence={label}; person_id={}", absence.person_id)),
            ),
        }
    }

    for (idx, blockage) in snapshot.hourly_blockages.iter().enumerate() {
        let label = blockage
            .id
            .clone()
            .unwrap_or_else(|| format!("#{idx}"));
        let parsed = (
            parse_date(&blockage.date),
            parse_wall_time(&blockage.start_time),
            parse_wall_time(&blockage.end_time),
        );
        match parsed {
            (Some(_), Some(start), Some(end)) if end < start => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_BLOCKAGE_WINDOW_INVERTED",
                    "Hourly blockage ends before it starts; it can never conflict",
                )
                .with_details(format!(
                    "blockage={label}; person_id={}; start={}; end={}",
                    blockage.person_id, blockage.start_time, blockage.end_time
                )),
            ),
            (Some(_), Some(_), Some(_)) => {}
            _ => warnings.push(
                ValidationWarning::new(
                    "VALIDATION_BLOCKAGE_UNPARSEABLE",
                    "Hourly blockage date or times are unparseable; it can never conflict",
                )
                .with_details(format!("blockage={label}; person_id={}", blockage.person_id)),
            ),
        }
    }

    warnings
}
