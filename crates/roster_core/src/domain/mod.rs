use serde::{Deserialize, Serialize};

/// A rostered person as exported by the hosted store.
///
/// Notes:
/// - Role assignment exists in two shapes: the legacy single `role_id` and the plural
///   `role_ids`. Rule code never reads either field directly; it goes through
///   [`Person::effective_role_ids`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl Person {
    /// `role_ids` when present and non-empty, else the legacy `role_id`, else nothing.
    pub fn effective_role_ids(&self) -> Vec<&str> {
        match &self.role_ids {
            Some(ids) if !ids.is_empty() => ids.iter().map(String::as_str).collect(),
            _ => self.role_id.as_deref().into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequirement {
    pub role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Per-shift override block. Each present field shadows the segment default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_composition: Option<Vec<RoleRequirement>>,
}

/// A scheduled assignment window.
///
/// `start_time`/`end_time` are RFC3339 strings as delivered by the store; they are parsed at the
/// point of use so a single malformed row cannot poison a whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub task_id: String,
    pub segment_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub assigned_person_ids: Vec<String>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<ShiftRequirements>,
}

impl Shift {
    pub fn is_assigned_to(&self, person_id: &str) -> bool {
        self.assigned_person_ids.iter().any(|id| id == person_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rest_hours_after: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_composition: Option<Vec<RoleRequirement>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl TaskTemplate {
    pub fn segment(&self, segment_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceStatus {
    Approved,
    Pending,
    Rejected,
    #[serde(other)]
    Other,
}

/// Full- or partial-day absence. Missing wall times mean the whole day (`00:00`..`23:59`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Absence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub person_id: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub status: AbsenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Sub-day unavailability window on a single calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlyBlockage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub person_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The six collections the detector reads, materialized in memory by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub tasks: Vec<TaskTemplate>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub absences: Vec<Absence>,
    #[serde(default)]
    pub hourly_blockages: Vec<HourlyBlockage>,
}

impl RosterSnapshot {
    pub fn task(&self, task_id: &str) -> Option<&TaskTemplate> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn role_name(&self, role_id: &str) -> Option<&str> {
        self.roles
            .iter()
            .find(|r| r.id == role_id)
            .map(|r| r.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    RestTime,
    RoleMismatch,
    AbsenceConflict,
}

impl ViolationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationType::RestTime => "rest_time",
            ViolationType::RoleMismatch => "role_mismatch",
            ViolationType::AbsenceConflict => "absence_conflict",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Fixed sort rank: high < medium < low.
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// A detected rule breach. Borrows the offending person and shifts from the snapshot it was
/// computed from; recomputed on every input change and never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Violation<'a> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub person: &'a Person,
    pub shifts: Vec<&'a Shift>,
    pub details: String,
    pub severity: Severity,
    /// Unix milliseconds of the relevant shift start; used for ordering only.
    pub timestamp: i64,
}

impl Violation<'_> {
    pub fn shift_ids(&self) -> Vec<&str> {
        self.shifts.iter().map(|s| s.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(role_id: Option<&str>, role_ids: Option<Vec<&str>>) -> Person {
        Person {
            id: "p1".to_string(),
            name: "דנה".to_string(),
            role_id: role_id.map(str::to_string),
            role_ids: role_ids.map(|ids| ids.into_iter().map(str::to_string).collect()),
            team_id: None,
        }
    }

    #[test]
    fn effective_roles_prefer_plural_list() {
        let p = person(Some("legacy"), Some(vec!["medic", "driver"]));
        assert_eq!(p.effective_role_ids(), vec!["medic", "driver"]);
    }

    #[test]
    fn effective_roles_fall_back_to_legacy_field() {
        assert_eq!(person(Some("legacy"), None).effective_role_ids(), vec!["legacy"]);
        assert_eq!(
            person(Some("legacy"), Some(vec![])).effective_role_ids(),
            vec!["legacy"]
        );
        assert!(person(None, None).effective_role_ids().is_empty());
    }

    #[test]
    fn unknown_absence_status_decodes_as_other() {
        let status: AbsenceStatus = serde_json::from_str("\"cancelled\"").expect("decode");
        assert_eq!(status, AbsenceStatus::Other);
        let status: AbsenceStatus = serde_json::from_str("\"approved\"").expect("decode");
        assert_eq!(status, AbsenceStatus::Approved);
    }

    #[test]
    fn shift_decodes_store_field_names() {
        let shift: Shift = serde_json::from_str(
            r#"{
              "id": "s1", "taskId": "t1", "segmentId": "seg1",
              "startTime": "2024-01-10T09:00:00Z", "endTime": "2024-01-10T17:00:00Z",
              "assignedPersonIds": ["p1"],
              "requirements": { "minRest": 8, "roleComposition": [{ "roleId": "medic" }] }
            }"#,
        )
        .expect("decode");
        assert!(!shift.is_cancelled);
        assert!(shift.is_assigned_to("p1"));
        let req = shift.requirements.expect("requirements");
        assert_eq!(req.min_rest, Some(8.0));
        assert_eq!(req.role_composition.expect("roles")[0].role_id, "medic");
    }
}
