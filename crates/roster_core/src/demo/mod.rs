use rusqlite::Connection;
use time::macros::date;
use time::Duration;

use crate::domain::{
    Absence, AbsenceStatus, HourlyBlockage, Person, Role, RoleRequirement, RosterSnapshot,
    Segment, Shift, TaskTemplate,
};
use crate::error::AppError;
use crate::ingest::snapshot_json::{import_snapshot_json, SnapshotImportSummary};

fn role_req(role_id: &str) -> RoleRequirement {
    RoleRequirement {
        role_id: role_id.to_string(),
        count: Some(1),
    }
}

fn segment(id: &str, name: &str, rest: f64, roles: &[&str]) -> Segment {
    Segment {
        id: id.to_string(),
        name: Some(name.to_string()),
        min_rest_hours_after: Some(rest),
        role_composition: Some(roles.iter().map(|r| role_req(r)).collect()),
    }
}

/// Deterministic synthetic roster.
///
/// Each day has a guard morning (06-14), a guard night (22-06) and, every third day, a patrol
/// (16-20) handed to the morning guard, so rest, role and conflict rules all fire.
/// Timestamps carry a fixed `+02:00` offset.
pub fn demo_snapshot(people: usize, days: usize) -> RosterSnapshot {
    let people = people.max(2);
    let role_cycle = ["guard", "medic", "driver", "commander"];

    let roles = [
        ("guard", "שומר"),
        ("medic", "חובש"),
        ("driver", "נהג"),
        ("commander", "מפקד"),
    ]
    .into_iter()
    .map(|(id, name)| Role {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect::<Vec<_>>();

    let tasks = vec![
        TaskTemplate {
            id: "guard".to_string(),
            name: "שמירה".to_string(),
            segments: vec![
                segment("morning", "בוקר", 8.0, &["guard"]),
                segment("night", "לילה", 12.0, &["guard", "commander"]),
            ],
        },
        TaskTemplate {
            id: "patrol".to_string(),
            name: "סיור".to_string(),
            segments: vec![segment("patrol", "סיור", 8.0, &["driver", "commander"])],
        },
    ];

    let people_list = (0..people)
        .map(|i| {
            let primary = role_cycle[i % role_cycle.len()];
            let secondary = role_cycle[(i + 2) % role_cycle.len()];
            // Every other person still uses the legacy single-role field.
            let (role_id, role_ids) = if i % 2 == 0 {
                (None, Some(vec![primary.to_string(), secondary.to_string()]))
            } else {
                (Some(primary.to_string()), None)
            };
            Person {
                id: format!("p{:03}", i + 1),
                name: format!("Person {:03}", i + 1),
                role_id,
                role_ids,
                team_id: Some(format!("team-{}", i % 3 + 1)),
            }
        })
        .collect::<Vec<_>>();

    let base = date!(2024 - 01 - 01);
    let mut shifts = Vec::new();
    for d in 0..days {
        let day = base + Duration::days(d as i64);
        let next_day = day + Duration::days(1);
        let morning_guard = &people_list[d % people];
        let night_guard = &people_list[(d + 1) % people];

        shifts.push(Shift {
            id: format!("d{d:03}-morning"),
            task_id: "guard".to_string(),
            segment_id: "morning".to_string(),
            start_time: format!("{day}T06:00:00+02:00"),
            end_time: format!("{day}T14:00:00+02:00"),
            assigned_person_ids: vec![morning_guard.id.clone()],
            is_cancelled: false,
            requirements: None,
        });
        if d % 3 == 0 {
            shifts.push(Shift {
                id: format!("d{d:03}-patrol"),
                task_id: "patrol".to_string(),
                segment_id: "patrol".to_string(),
                start_time: format!("{day}T16:00:00+02:00"),
                end_time: format!("{day}T20:00:00+02:00"),
                assigned_person_ids: vec![morning_guard.id.clone()],
                is_cancelled: d % 6 == 3,
                requirements: None,
            });
        }
        shifts.push(Shift {
            id: format!("d{d:03}-night"),
            task_id: "guard".to_string(),
            segment_id: "night".to_string(),
            start_time: format!("{day}T22:00:00+02:00"),
            end_time: format!("{next_day}T06:00:00+02:00"),
            assigned_person_ids: vec![night_guard.id.clone()],
            is_cancelled: false,
            requirements: None,
        });
    }

    let mut absences = Vec::new();
    let mut hourly_blockages = Vec::new();
    for (i, p) in people_list.iter().enumerate().step_by(4) {
        let day = base + Duration::days(i as i64 % days.max(1) as i64);
        absences.push(Absence {
            id: Some(format!("abs-{}", p.id)),
            person_id: p.id.clone(),
            start_date: day.to_string(),
            end_date: day.to_string(),
            start_time: None,
            end_time: None,
            status: if i % 8 == 0 {
                AbsenceStatus::Approved
            } else {
                AbsenceStatus::Pending
            },
            reason: Some("חופשה".to_string()),
        });
        hourly_blockages.push(HourlyBlockage {
            id: Some(format!("blk-{}", p.id)),
            person_id: p.id.clone(),
            date: day.to_string(),
            start_time: "07:00".to_string(),
            end_time: "09:00".to_string(),
            reason: None,
        });
    }

    RosterSnapshot {
        people: people_list,
        shifts,
        tasks,
        roles,
        absences,
        hourly_blockages,
    }
}

/// Store a small demo roster through the regular JSON import path.
pub fn seed_demo_roster(conn: &mut Connection) -> Result<SnapshotImportSummary, AppError> {
    let text = serde_json::to_string(&demo_snapshot(12, 14)).map_err(|e| {
        AppError::new("DEMO_ENCODE_FAILED", "Failed to encode demo roster")
            .with_details(e.to_string())
    })?;
    import_snapshot_json(conn, &text)
}
