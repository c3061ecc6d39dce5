use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{RosterSnapshot, ValidationWarning};
use crate::error::AppError;
use crate::repo::replace_snapshot;

/// Collection names as exported by the hosted store, with accepted aliases.
const PEOPLE: &[&str] = &["people"];
const SHIFTS: &[&str] = &["shifts"];
const TASKS: &[&str] = &["tasks", "taskTemplates", "task_templates"];
const ROLES: &[&str] = &["roles"];
const ABSENCES: &[&str] = &["absences"];
const BLOCKAGES: &[&str] = &["hourlyBlockages", "hourly_blockages"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotPreview {
    pub people: usize,
    pub shifts: usize,
    pub tasks: usize,
    pub roles: usize,
    pub absences: usize,
    pub hourly_blockages: usize,
    /// Top-level keys that are not a known collection; ignored on import.
    pub unknown_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotIngest {
    pub snapshot: RosterSnapshot,
    pub skipped: usize,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotImportSummary {
    pub people: usize,
    pub shifts: usize,
    pub tasks: usize,
    pub roles: usize,
    pub absences: usize,
    pub hourly_blockages: usize,
    pub skipped: usize,
    pub warnings: Vec<ValidationWarning>,
}

fn parse_root(text: &str) -> Result<Map<String, Value>, AppError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        AppError::new("INGEST_SNAPSHOT_JSON_PARSE_FAILED", "Failed to parse snapshot JSON")
            .with_details(e.to_string())
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::new(
            "INGEST_SNAPSHOT_NOT_OBJECT",
            "Snapshot JSON must be an object keyed by collection name",
        )
        .with_details(format!("found={}", json_kind(&other)))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn collection<'v>(
    root: &'v Map<String, Value>,
    keys: &[&str],
) -> Result<Option<&'v Vec<Value>>, AppError> {
    let Some((key, value)) = keys.iter().find_map(|k| root.get(*k).map(|v| (*k, v))) else {
        return Ok(None);
    };
    match value {
        Value::Array(rows) => Ok(Some(rows)),
        other => Err(AppError::new(
            "INGEST_COLLECTION_NOT_ARRAY",
            format!("Snapshot collection {key} must be an array"),
        )
        .with_details(format!("found={}", json_kind(other)))),
    }
}

fn decode_rows<T: DeserializeOwned>(
    root: &Map<String, Value>,
    keys: &[&str],
    skipped: &mut usize,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<Vec<T>, AppError> {
    let Some(rows) = collection(root, keys)? else {
        warnings.push(
            ValidationWarning::new(
                "INGEST_COLLECTION_MISSING",
                format!("Snapshot has no {} collection; treated as empty", keys[0]),
            ),
        );
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate() {
        match T::deserialize(row) {
            Ok(v) => out.push(v),
            Err(e) => {
                warnings.push(
                    ValidationWarning::new(
                        "INGEST_ROW_DECODE_FAILED",
                        format!("Skipped malformed {} row", keys[0]),
                    )
                    .with_details(format!("row={row_idx}; err={e}")),
                );
                *skipped += 1;
            }
        }
    }
    Ok(out)
}

pub fn preview_snapshot_json(text: &str) -> Result<SnapshotPreview, AppError> {
    let root = parse_root(text)?;
    let count = |keys: &[&str]| -> Result<usize, AppError> {
        Ok(collection(&root, keys)?.map_or(0, Vec::len))
    };

    let known: Vec<&str> = [PEOPLE, SHIFTS, TASKS, ROLES, ABSENCES, BLOCKAGES]
        .iter()
        .flat_map(|keys| keys.iter().copied())
        .collect();
    let mut unknown_keys: Vec<String> = root
        .keys()
        .filter(|k| !known.contains(&k.as_str()))
        .cloned()
        .collect();
    unknown_keys.sort();

    Ok(SnapshotPreview {
        people: count(PEOPLE)?,
        shifts: count(SHIFTS)?,
        tasks: count(TASKS)?,
        roles: count(ROLES)?,
        absences: count(ABSENCES)?,
        hourly_blockages: count(BLOCKAGES)?,
        unknown_keys,
    })
}

/// Decode a JSON export of the six roster tables.
///
/// Rows that fail to decode are skipped with an `INGEST_ROW_DECODE_FAILED` warning rather than
/// failing the whole snapshot. A malformed document or a collection that is present but not an
/// array (`null` included) is an error; an absent collection is read as empty.
#[tracing::instrument(skip_all, fields(bytes = text.len()))]
pub fn parse_snapshot_json(text: &str) -> Result<SnapshotIngest, AppError> {
    let root = parse_root(text)?;
    let mut skipped = 0usize;
    let mut warnings = Vec::new();

    let snapshot = RosterSnapshot {
        people: decode_rows(&root, PEOPLE, &mut skipped, &mut warnings)?,
        shifts: decode_rows(&root, SHIFTS, &mut skipped, &mut warnings)?,
        tasks: decode_rows(&root, TASKS, &mut skipped, &mut warnings)?,
        roles: decode_rows(&root, ROLES, &mut skipped, &mut warnings)?,
        absences: decode_rows(&root, ABSENCES, &mut skipped, &mut warnings)?,
        hourly_blockages: decode_rows(&root, BLOCKAGES, &mut skipped, &mut warnings)?,
    };

    if skipped > 0 {
        tracing::warn!(skipped, "snapshot rows skipped during ingest");
    }

    Ok(SnapshotIngest {
        snapshot,
        skipped,
        warnings,
    })
}

/// Parse `text` and replace the stored snapshot with it.
pub fn import_snapshot_json(
    conn: &mut Connection,
    text: &str,
) -> Result<SnapshotImportSummary, AppError> {
    let ingest = parse_snapshot_json(text)?;
    replace_snapshot(conn, &ingest.snapshot)?;

    let s = &ingest.snapshot;
    Ok(SnapshotImportSummary {
        people: s.people.len(),
        shifts: s.shifts.len(),
        tasks: s.tasks.len(),
        roles: s.roles.len(),
        absences: s.absences.len(),
        hourly_blockages: s.hourly_blockages.len(),
        skipped: ingest.skipped,
        warnings: ingest.warnings,
    })
}
