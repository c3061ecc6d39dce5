use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Severity, Violation, ViolationType};
use crate::export::{severity_label, type_label};

pub const COMPLIANCE_SUMMARY_VERSION: u32 = 1;

const TOP_PEOPLE: usize = 10;
const OTHER_PEOPLE_KEY: &str = "person:OTHER";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeCount {
    pub kind: ViolationType,
    pub label: String,
    pub count: i64,
    pub violation_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCount {
    pub severity: Severity,
    pub label: String,
    pub count: i64,
    pub violation_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonBucket {
    pub key: String,
    pub label: String,
    pub count: i64,
    pub high_count: i64,
    pub violation_ids: Vec<String>,
}

/// Numbers behind the compliance screen's summary cards.
///
/// Every breakdown reconciles to `violation_count`: all types and severities are listed even
/// at zero, and people beyond the top list fold into a single OTHER bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceSummary {
    pub version: u32,
    pub violation_count: i64,
    pub people_affected: i64,
    pub shifts_affected: i64,
    pub by_type: Vec<TypeCount>,
    pub by_severity: Vec<SeverityCount>,
    pub top_people: Vec<PersonBucket>,
}

#[derive(Default)]
struct PersonAcc {
    name: String,
    count: i64,
    high_count: i64,
    violation_ids: Vec<String>,
}

pub fn build_compliance_summary(violations: &[Violation<'_>]) -> ComplianceSummary {
    let mut type_map: BTreeMap<ViolationType, Vec<String>> = BTreeMap::new();
    let mut severity_map: BTreeMap<u8, Vec<String>> = BTreeMap::new();
    let mut person_map: BTreeMap<String, PersonAcc> = BTreeMap::new();
    let mut shift_ids: BTreeSet<&str> = BTreeSet::new();

    for v in violations {
        type_map.entry(v.kind).or_default().push(v.id.clone());
        severity_map
            .entry(v.severity.rank())
            .or_default()
            .push(v.id.clone());
        shift_ids.extend(v.shift_ids());

        let acc = person_map
            .entry(v.person.id.clone())
            .or_insert_with(|| PersonAcc {
                name: v.person.name.clone(),
                ..PersonAcc::default()
            });
        acc.count += 1;
        if v.severity == Severity::High {
            acc.high_count += 1;
        }
        acc.violation_ids.push(v.id.clone());
    }

    let by_type = [
        ViolationType::RestTime,
        ViolationType::RoleMismatch,
        ViolationType::AbsenceConflict,
    ]
    .into_iter()
    .map(|kind| {
        let mut ids = type_map.remove(&kind).unwrap_or_default();
        ids.sort();
        TypeCount {
            kind,
            label: type_label(kind).to_string(),
            count: ids.len() as i64,
            violation_ids: ids,
        }
    })
    .collect::<Vec<_>>();

    let by_severity = [Severity::High, Severity::Medium, Severity::Low]
        .into_iter()
        .map(|severity| {
            let mut ids = severity_map.remove(&severity.rank()).unwrap_or_default();
            ids.sort();
            SeverityCount {
                severity,
                label: severity_label(severity).to_string(),
                count: ids.len() as i64,
                violation_ids: ids,
            }
        })
        .collect::<Vec<_>>();

    let people_affected = person_map.len() as i64;

    // Deterministic ordering: count desc, then name, then person id.
    let mut people = person_map.into_iter().collect::<Vec<_>>();
    people.sort_by(|(a_id, a), (b_id, b)| {
        (-(a.count), a.name.as_str(), a_id.as_str()).cmp(&(
            -(b.count),
            b.name.as_str(),
            b_id.as_str(),
        ))
    });

    let mut top_people = Vec::new();
    let mut other = PersonBucket {
        key: OTHER_PEOPLE_KEY.to_string(),
        label: "OTHER".to_string(),
        count: 0,
        high_count: 0,
        violation_ids: Vec::new(),
    };
    for (idx, (person_id, mut acc)) in people.into_iter().enumerate() {
        acc.violation_ids.sort();
        if idx < TOP_PEOPLE {
            top_people.push(PersonBucket {
                key: format!("person:{person_id}"),
                label: acc.name,
                count: acc.count,
                high_count: acc.high_count,
                violation_ids: acc.violation_ids,
            });
        } else {
            other.count += acc.count;
            other.high_count += acc.high_count;
            other.violation_ids.extend(acc.violation_ids);
        }
    }
    if other.count > 0 {
        other.violation_ids.sort();
        top_people.push(other);
    }

    ComplianceSummary {
        version: COMPLIANCE_SUMMARY_VERSION,
        violation_count: violations.len() as i64,
        people_affected,
        shifts_affected: shift_ids.len() as i64,
        by_type,
        by_severity,
        top_people,
    }
}
