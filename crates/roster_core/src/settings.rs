use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::error::AppError;

const SETTINGS_KEY: &str = "compliance";
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Organisation-level knobs for compliance evaluation and export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComplianceSettings {
    /// Fixed offset of the organisation's wall clock, in minutes east of UTC.
    pub utc_offset_minutes: i32,
    /// CSV task column value when a shift's task cannot be resolved.
    pub unknown_task_label: String,
    pub export_file_prefix: String,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 120,
            unknown_task_label: "לא ידוע".to_string(),
            export_file_prefix: "compliance_report".to_string(),
        }
    }
}

impl ComplianceSettings {
    /// UTC settings; handy for hosts that store everything in UTC wall time.
    pub fn utc() -> Self {
        Self {
            utc_offset_minutes: 0,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let settings: Self = serde_json::from_str(text).map_err(|e| {
            AppError::new("SETTINGS_DECODE_FAILED", "Failed to decode compliance settings")
                .with_details(e.to_string())
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.utc_offset_minutes) {
            return Err(AppError::new(
                "SETTINGS_INVALID_OFFSET",
                "utc_offset_minutes must be within +/-18h",
            )
            .with_details(format!("value={}", self.utc_offset_minutes)));
        }
        Ok(())
    }

    /// The configured offset. Out-of-range values (only reachable by skipping `validate`)
    /// collapse to UTC.
    pub fn offset(&self) -> UtcOffset {
        UtcOffset::from_whole_seconds(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or(UtcOffset::UTC)
    }
}

pub fn load_settings(conn: &Connection) -> Result<ComplianceSettings, AppError> {
    let json: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?1",
            [SETTINGS_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to query compliance settings")
                .with_details(e.to_string())
        })?;

    match json {
        Some(text) => ComplianceSettings::from_json(&text),
        None => Ok(ComplianceSettings::default()),
    }
}

pub fn save_settings(conn: &Connection, settings: &ComplianceSettings) -> Result<(), AppError> {
    settings.validate()?;
    let json = serde_json::to_string(settings).map_err(|e| {
        AppError::new("SETTINGS_ENCODE_FAILED", "Failed to encode compliance settings")
            .with_details(e.to_string())
    })?;

    conn.execute(
        r#"
      INSERT INTO settings(key, value_json) VALUES (?1, ?2)
      ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json
      "#,
        [SETTINGS_KEY, json.as_str()],
    )
    .map_err(|e| {
        AppError::new("DB_WRITE_FAILED", "Failed to save compliance settings")
            .with_details(e.to_string())
    })?;

    tracing::info!(
        utc_offset_minutes = settings.utc_offset_minutes,
        "saved compliance settings"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn partial_json_fills_defaults() {
        let s = ComplianceSettings::from_json(r#"{"utc_offset_minutes": 180}"#).expect("decode");
        assert_eq!(s.utc_offset_minutes, 180);
        assert_eq!(s.unknown_task_label, "לא ידוע");
        assert_eq!(s.offset().whole_hours(), 3);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let err = ComplianceSettings::from_json(r#"{"utc_offset_minutes": 5000}"#)
            .expect_err("should reject");
        assert_eq!(err.code, "SETTINGS_INVALID_OFFSET");
    }

    #[test]
    fn settings_round_trip_through_store() {
        let mut conn = db::open_in_memory().expect("open");
        db::migrate(&mut conn).expect("migrate");

        assert_eq!(load_settings(&conn).expect("load"), ComplianceSettings::default());

        let custom = ComplianceSettings {
            utc_offset_minutes: 180,
            unknown_task_label: "?".to_string(),
            export_file_prefix: "report".to_string(),
        };
        save_settings(&conn, &custom).expect("save");
        save_settings(&conn, &custom).expect("save twice");
        assert_eq!(load_settings(&conn).expect("load"), custom);
    }
}
