#![allow(dead_code)]

use roster_core::domain::{
    Absence, AbsenceStatus, HourlyBlockage, Person, Role, RoleRequirement, RosterSnapshot,
    Segment, Shift, ShiftRequirements, TaskTemplate,
};
use roster_core::settings::ComplianceSettings;

pub fn utc() -> ComplianceSettings {
    ComplianceSettings::utc()
}

pub fn person(id: &str, name: &str, roles: &[&str]) -> Person {
    Person {
        id: id.to_string(),
        name: name.to_string(),
        role_id: None,
        role_ids: Some(roles.iter().map(|r| r.to_string()).collect()),
        team_id: None,
    }
}

pub fn legacy_person(id: &str, name: &str, role_id: &str) -> Person {
    Person {
        id: id.to_string(),
        name: name.to_string(),
        role_id: Some(role_id.to_string()),
        role_ids: None,
        team_id: None,
    }
}

pub fn role(id: &str, name: &str) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn roles_of(ids: &[&str]) -> Vec<RoleRequirement> {
    ids.iter()
        .map(|id| RoleRequirement {
            role_id: id.to_string(),
            count: None,
        })
        .collect()
}

pub fn segment(id: &str, min_rest: Option<f64>, roles: Option<&[&str]>) -> Segment {
    Segment {
        id: id.to_string(),
        name: None,
        min_rest_hours_after: min_rest,
        role_composition: roles.map(roles_of),
    }
}

pub fn task(id: &str, name: &str, segments: Vec<Segment>) -> TaskTemplate {
    TaskTemplate {
        id: id.to_string(),
        name: name.to_string(),
        segments,
    }
}

/// Shift on task `t1`, segment `seg`, assigned to `people`. Times are RFC3339.
pub fn shift(id: &str, start: &str, end: &str, people: &[&str]) -> Shift {
    Shift {
        id: id.to_string(),
        task_id: "t1".to_string(),
        segment_id: "seg".to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        assigned_person_ids: people.iter().map(|p| p.to_string()).collect(),
        is_cancelled: false,
        requirements: None,
    }
}

pub fn with_requirements(mut s: Shift, min_rest: Option<f64>, roles: Option<&[&str]>) -> Shift {
    s.requirements = Some(ShiftRequirements {
        min_rest,
        role_composition: roles.map(roles_of),
    });
    s
}

pub fn absence(
    person_id: &str,
    start_date: &str,
    end_date: &str,
    status: AbsenceStatus,
) -> Absence {
    Absence {
        id: None,
        person_id: person_id.to_string(),
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        start_time: None,
        end_time: None,
        status,
        reason: None,
    }
}

pub fn blockage(person_id: &str, date: &str, start: &str, end: &str) -> HourlyBlockage {
    HourlyBlockage {
        id: None,
        person_id: person_id.to_string(),
        date: date.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        reason: None,
    }
}

/// One person `p1`, one task `t1` with segment `seg` carrying the given defaults.
pub fn roster(people: Vec<Person>, seg: Segment, shifts: Vec<Shift>) -> RosterSnapshot {
    RosterSnapshot {
        people,
        shifts,
        tasks: vec![task("t1", "שמירה", vec![seg])],
        roles: vec![
            role("medic", "חובש"),
            role("driver", "נהג"),
            role("commander", "מפקד"),
        ],
        absences: vec![],
        hourly_blockages: vec![],
    }
}
