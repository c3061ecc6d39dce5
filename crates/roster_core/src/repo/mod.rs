use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{
    Absence, AbsenceStatus, HourlyBlockage, Person, Role, RosterSnapshot, Shift, TaskTemplate,
};
use crate::error::AppError;

fn query_err(message: &'static str) -> impl FnOnce(rusqlite::Error) -> AppError {
    move |e| AppError::new("DB_QUERY_FAILED", message).with_details(e.to_string())
}

fn write_err(message: &'static str) -> impl FnOnce(rusqlite::Error) -> AppError {
    move |e| AppError::new("DB_WRITE_FAILED", message).with_details(e.to_string())
}

fn encode_json<T: Serialize + ?Sized>(value: &T, column: &str) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| {
        AppError::new("DB_ENCODE_FAILED", format!("Failed to encode {column}"))
            .with_details(e.to_string())
    })
}

fn decode_json<T: DeserializeOwned>(raw: &str, column: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::new("DB_DECODE_FAILED", format!("Failed to decode {column}"))
            .with_details(e.to_string())
    })
}

fn status_to_str(status: AbsenceStatus) -> &'static str {
    match status {
        AbsenceStatus::Approved => "approved",
        AbsenceStatus::Pending => "pending",
        AbsenceStatus::Rejected => "rejected",
        AbsenceStatus::Other => "other",
    }
}

fn status_from_str(raw: &str) -> AbsenceStatus {
    match raw {
        "approved" => AbsenceStatus::Approved,
        "pending" => AbsenceStatus::Pending,
        "rejected" => AbsenceStatus::Rejected,
        _ => AbsenceStatus::Other,
    }
}

/// Replace the stored snapshot with `snapshot` in a single transaction.
///
/// Row order is preserved through the `position` column so [`load_snapshot`] returns the
/// collections exactly as they were handed in.
#[tracing::instrument(
    skip_all,
    fields(people = snapshot.people.len(), shifts = snapshot.shifts.len())
)]
pub fn replace_snapshot(conn: &mut Connection, snapshot: &RosterSnapshot) -> Result<(), AppError> {
    let tx = conn.transaction().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to start snapshot transaction")
            .with_details(e.to_string())
    })?;

    tx.execute_batch(
        r#"
      DELETE FROM people;
      DELETE FROM roles;
      DELETE FROM task_templates;
      DELETE FROM shifts;
      DELETE FROM absences;
      DELETE FROM hourly_blockages;
      "#,
    )
    .map_err(write_err("Failed to clear previous snapshot"))?;

    for (pos, p) in snapshot.people.iter().enumerate() {
        let role_ids_json = match &p.role_ids {
            Some(ids) => Some(encode_json(ids, "people.role_ids")?),
            None => None,
        };
        tx.execute(
            r#"
      INSERT INTO people(position, id, name, role_id, role_ids_json, team_id)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)
      "#,
            params![pos as i64, p.id, p.name, p.role_id, role_ids_json, p.team_id],
        )
        .map_err(write_err("Failed to insert person"))?;
    }

    for (pos, r) in snapshot.roles.iter().enumerate() {
        tx.execute(
            "INSERT INTO roles(position, id, name) VALUES (?1, ?2, ?3)",
            params![pos as i64, r.id, r.name],
        )
        .map_err(write_err("Failed to insert role"))?;
    }

    for (pos, t) in snapshot.tasks.iter().enumerate() {
        tx.execute(
            "INSERT INTO task_templates(position, id, name, segments_json) VALUES (?1, ?2, ?3, ?4)",
            params![
                pos as i64,
                t.id,
                t.name,
                encode_json(&t.segments, "task_templates.segments")?
            ],
        )
        .map_err(write_err("Failed to insert task template"))?;
    }

    for (pos, s) in snapshot.shifts.iter().enumerate() {
        let requirements_json = match &s.requirements {
            Some(req) => Some(encode_json(req, "shifts.requirements")?),
            None => None,
        };
        tx.execute(
            r#"
      INSERT INTO shifts(position, id, task_id, segment_id, start_time, end_time,
                         assigned_person_ids_json, is_cancelled, requirements_json)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      "#,
            params![
                pos as i64,
                s.id,
                s.task_id,
                s.segment_id,
                s.start_time,
                s.end_time,
                encode_json(&s.assigned_person_ids, "shifts.assigned_person_ids")?,
                s.is_cancelled,
                requirements_json
            ],
        )
        .map_err(write_err("Failed to insert shift"))?;
    }

    for (pos, a) in snapshot.absences.iter().enumerate() {
        tx.execute(
            r#"
      INSERT INTO absences(position, id, person_id, start_date, end_date,
                           start_time, end_time, status, reason)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      "#,
            params![
                pos as i64,
                a.id,
                a.person_id,
                a.start_date,
                a.end_date,
                a.start_time,
                a.end_time,
                status_to_str(a.status),
                a.reason
            ],
        )
        .map_err(write_err("Failed to insert absence"))?;
    }

    for (pos, b) in snapshot.hourly_blockages.iter().enumerate() {
        tx.execute(
            r#"
      INSERT INTO hourly_blockages(position, id, person_id, date, start_time, end_time, reason)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      "#,
            params![
                pos as i64,
                b.id,
                b.person_id,
                b.date,
                b.start_time,
                b.end_time,
                b.reason
            ],
        )
        .map_err(write_err("Failed to insert hourly blockage"))?;
    }

    tx.commit().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to commit snapshot transaction")
            .with_details(e.to_string())
    })?;

    tracing::info!("snapshot stored");
    Ok(())
}

fn list_people(conn: &Connection) -> Result<Vec<Person>, AppError> {
    let mut stmt = conn
        .prepare("SELECT id, name, role_id, role_ids_json, team_id FROM people ORDER BY position")
        .map_err(query_err("Failed to prepare people query"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .map_err(query_err("Failed to query people"))?;

    let mut out = Vec::new();
    for r in rows {
        let (id, name, role_id, role_ids_json, team_id) =
            r.map_err(query_err("Failed to decode person row"))?;
        let role_ids = match role_ids_json.as_deref() {
            Some(raw) => Some(decode_json(raw, "people.role_ids")?),
            None => None,
        };
        out.push(Person {
            id,
            name,
            role_id,
            role_ids,
            team_id,
        });
    }
    Ok(out)
}

fn list_roles(conn: &Connection) -> Result<Vec<Role>, AppError> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM roles ORDER BY position")
        .map_err(query_err("Failed to prepare roles query"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Role {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .map_err(query_err("Failed to query roles"))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(query_err("Failed to decode role row"))?);
    }
    Ok(out)
}

fn list_tasks(conn: &Connection) -> Result<Vec<TaskTemplate>, AppError> {
    let mut stmt = conn
        .prepare("SELECT id, name, segments_json FROM task_templates ORDER BY position")
        .map_err(query_err("Failed to prepare task templates query"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(query_err("Failed to query task templates"))?;

    let mut out = Vec::new();
    for r in rows {
        let (id, name, segments_json) = r.map_err(query_err("Failed to decode task template row"))?;
        out.push(TaskTemplate {
            id,
            name,
            segments: decode_json(&segments_json, "task_templates.segments")?,
        });
    }
    Ok(out)
}

fn list_shifts(conn: &Connection) -> Result<Vec<Shift>, AppError> {
    let mut stmt = conn
        .prepare(
            r#"
      SELECT id, task_id, segment_id, start_time, end_time,
             assigned_person_ids_json, is_cancelled, requirements_json
      FROM shifts
      ORDER BY position
      "#,
        )
        .map_err(query_err("Failed to prepare shifts query"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })
        .map_err(query_err("Failed to query shifts"))?;

    let mut out = Vec::new();
    for r in rows {
        let (id, task_id, segment_id, start_time, end_time, assigned_json, is_cancelled, req_json) =
            r.map_err(query_err("Failed to decode shift row"))?;
        let requirements = match req_json.as_deref() {
            Some(raw) => Some(decode_json(raw, "shifts.requirements")?),
            None => None,
        };
        out.push(Shift {
            id,
            task_id,
            segment_id,
            start_time,
            end_time,
            assigned_person_ids: decode_json(&assigned_json, "shifts.assigned_person_ids")?,
            is_cancelled,
            requirements,
        });
    }
    Ok(out)
}

fn list_absences(conn: &Connection) -> Result<Vec<Absence>, AppError> {
    let mut stmt = conn
        .prepare(
            r#"
      SELECT id, person_id, start_date, end_date, start_time, end_time, status, reason
      FROM absences
      ORDER BY position
      "#,
        )
        .map_err(query_err("Failed to prepare absences query"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Absence {
                id: row.get(0)?,
                person_id: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
                start_time: row.get(4)?,
                end_time: row.get(5)?,
                status: status_from_str(&row.get::<_, String>(6)?),
                reason: row.get(7)?,
            })
        })
        .map_err(query_err("Failed to query absences"))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(query_err("Failed to decode absence row"))?);
    }
    Ok(out)
}

fn list_hourly_blockages(conn: &Connection) -> Result<Vec<HourlyBlockage>, AppError> {
    let mut stmt = conn
        .prepare(
            r#"
      SELECT id, person_id, date, start_time, end_time, reason
      FROM hourly_blockages
      ORDER BY position
      "#,
        )
        .map_err(query_err("Failed to prepare hourly blockages query"))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(HourlyBlockage {
                id: row.get(0)?,
                person_id: row.get(1)?,
                date: row.get(2)?,
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                reason: row.get(5)?,
            })
        })
        .map_err(query_err("Failed to query hourly blockages"))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(query_err("Failed to decode hourly blockage row"))?);
    }
    Ok(out)
}

/// Load the stored snapshot, collections in their original delivery order.
pub fn load_snapshot(conn: &Connection) -> Result<RosterSnapshot, AppError> {
    let snapshot = RosterSnapshot {
        people: list_people(conn)?,
        shifts: list_shifts(conn)?,
        tasks: list_tasks(conn)?,
        roles: list_roles(conn)?,
        absences: list_absences(conn)?,
        hourly_blockages: list_hourly_blockages(conn)?,
    };
    tracing::debug!(
        people = snapshot.people.len(),
        shifts = snapshot.shifts.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

pub fn count_shifts(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("SELECT COUNT(*) FROM shifts", [], |row| row.get(0))
        .map_err(query_err("Failed to count shifts"))
}
