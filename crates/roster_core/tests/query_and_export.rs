mod common;

use common::*;
use pretty_assertions::assert_eq;
use roster_core::domain::{Person, Severity, Shift, Violation, ViolationType};
use roster_core::export::{export_file_name, export_violations_csv, CSV_HEADERS};
use roster_core::query::{apply_query, SortDirection, SortKey, ViolationQuery};
use time::macros::{date, datetime};

fn violation<'a>(
    id: &str,
    kind: ViolationType,
    severity: Severity,
    person: &'a Person,
    shift: &'a Shift,
    millis: i64,
) -> Violation<'a> {
    Violation {
        id: id.to_string(),
        kind,
        person,
        shifts: vec![shift],
        details: "פרטים".to_string(),
        severity,
        timestamp: millis,
    }
}

fn ms(dt: time::OffsetDateTime) -> i64 {
    dt.unix_timestamp() * 1000
}

struct Fixture {
    people: Vec<Person>,
    shifts: Vec<Shift>,
}

fn fixture() -> Fixture {
    Fixture {
        people: vec![
            person("p1", "Dana Levi", &[]),
            person("p2", "avi cohen", &[]),
            person("p3", "Ben Mor", &[]),
        ],
        shifts: vec![
            shift("s1", "2024-01-10T08:00:00Z", "2024-01-10T12:00:00Z", &["p1"]),
            shift("s2", "2024-01-12T08:00:00Z", "2024-01-12T12:00:00Z", &["p2"]),
            shift("s3", "2024-01-15T08:00:00Z", "2024-01-15T12:00:00Z", &["p3"]),
        ],
    }
}

fn violations(f: &Fixture) -> Vec<Violation<'_>> {
    vec![
        violation(
            "c",
            ViolationType::RestTime,
            Severity::Medium,
            &f.people[0],
            &f.shifts[0],
            ms(datetime!(2024-01-10 08:00 UTC)),
        ),
        violation(
            "a",
            ViolationType::RoleMismatch,
            Severity::High,
            &f.people[1],
            &f.shifts[1],
            ms(datetime!(2024-01-12 08:00 UTC)),
        ),
        violation(
            "b",
            ViolationType::AbsenceConflict,
            Severity::High,
            &f.people[2],
            &f.shifts[2],
            ms(datetime!(2024-01-15 08:00 UTC)),
        ),
    ]
}

fn ids(vs: &[Violation<'_>]) -> Vec<String> {
    vs.iter().map(|v| v.id.clone()).collect()
}

#[test]
fn default_query_sorts_by_date_ascending() {
    let f = fixture();
    let out = apply_query(violations(&f), &ViolationQuery::default(), &utc());
    assert_eq!(ids(&out), vec!["c", "a", "b"]);
}

#[test]
fn search_is_case_insensitive_on_person_name() {
    let f = fixture();
    let query = ViolationQuery {
        search: Some("  AVI ".to_string()),
        ..ViolationQuery::default()
    };
    let out = apply_query(violations(&f), &query, &utc());
    assert_eq!(ids(&out), vec!["a"]);
}

#[test]
fn blank_search_matches_everything() {
    let f = fixture();
    let query = ViolationQuery {
        search: Some("   ".to_string()),
        ..ViolationQuery::default()
    };
    assert_eq!(apply_query(violations(&f), &query, &utc()).len(), 3);
}

#[test]
fn type_and_severity_filters_combine() {
    let f = fixture();
    let query = ViolationQuery {
        severity: Some(Severity::High),
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["a", "b"]);

    let query = ViolationQuery {
        severity: Some(Severity::High),
        kind: Some(ViolationType::AbsenceConflict),
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["b"]);
}

#[test]
fn date_window_is_inclusive() {
    let f = fixture();
    let query = ViolationQuery {
        from: Some(date!(2024 - 01 - 10)),
        to: Some(date!(2024 - 01 - 12)),
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["c", "a"]);

    let query = ViolationQuery {
        from: Some(date!(2024 - 01 - 13)),
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["b"]);
}

#[test]
fn sort_by_name_ignores_case() {
    let f = fixture();
    let query = ViolationQuery {
        sort: SortKey::Name,
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["a", "b", "c"]);

    let query = ViolationQuery {
        sort: SortKey::Name,
        direction: SortDirection::Desc,
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["c", "b", "a"]);
}

#[test]
fn severity_sort_breaks_ties_by_id() {
    let f = fixture();
    let query = ViolationQuery {
        sort: SortKey::Severity,
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["a", "b", "c"]);

    let query = ViolationQuery {
        sort: SortKey::Severity,
        direction: SortDirection::Desc,
        ..ViolationQuery::default()
    };
    assert_eq!(ids(&apply_query(violations(&f), &query, &utc())), vec!["c", "a", "b"]);
}

#[test]
fn query_decodes_from_screen_json() {
    let query: ViolationQuery = serde_json::from_str(
        r#"{"search":"dana","kind":"rest_time","severity":"medium","sort":"name","direction":"desc"}"#,
    )
    .expect("decode query");
    assert_eq!(query.kind, Some(ViolationType::RestTime));
    assert_eq!(query.severity, Some(Severity::Medium));
    assert_eq!(query.sort, SortKey::Name);
    assert_eq!(query.direction, SortDirection::Desc);
    assert_eq!(query.from, None);
}

fn csv_rows(bytes: &[u8]) -> Vec<Vec<String>> {
    let text = std::str::from_utf8(bytes).expect("utf8");
    let body = text.strip_prefix('\u{feff}').expect("bom");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body.as_bytes());
    rdr.records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn csv_export_has_bom_header_and_labels() {
    let f = fixture();
    let mut vs = violations(&f);
    vs[0].details = "מנוחה קצרה, לילה".to_string();
    let tasks = vec![task("t1", "שמירה", vec![segment("seg", None, None)])];

    let bytes = export_violations_csv(&vs, &tasks, &roster_core::ComplianceSettings::default())
        .expect("export");
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

    let rows = csv_rows(&bytes);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], CSV_HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    // 08:00Z renders as 10:00 at the default +02:00.
    assert_eq!(
        rows[1],
        vec!["Dana Levi", "מנוחה", "בינוני", "מנוחה קצרה  לילה", "10.1.2024", "10:00", "שמירה"]
    );
    assert_eq!(rows[2][1], "הסמכה");
    assert_eq!(rows[2][2], "קריטי");
    assert_eq!(rows[3][1], "התנגשות");
}

#[test]
fn csv_export_uses_unknown_task_label() {
    let f = fixture();
    let vs = violations(&f);
    let settings = utc();

    let bytes = export_violations_csv(&vs[..1], &[], &settings).expect("export");
    let rows = csv_rows(&bytes);
    assert_eq!(rows[1][6], settings.unknown_task_label);
    assert_eq!(rows[1][4], "10.1.2024");
    assert_eq!(rows[1][5], "08:00");
}

#[test]
fn csv_export_of_nothing_is_header_only() {
    let bytes = export_violations_csv(&[], &[], &utc()).expect("export");
    assert_eq!(csv_rows(&bytes).len(), 1);
}

#[test]
fn export_file_name_embeds_range() {
    assert_eq!(
        export_file_name(date!(2024 - 01 - 01), date!(2024 - 01 - 31), &utc()),
        "compliance_report_2024-01-01_2024-01-31.csv"
    );
}

#[test]
fn rest_violation_date_matches_csv_date() {
    // Rest spans midnight: the earlier shift is on the 10th, the next one on the 11th.
    let snapshot = roster(
        vec![person("p1", "Dana Levi", &[])],
        segment("seg", Some(8.0), None),
        vec![
            shift("s1", "2024-01-10T22:00:00Z", "2024-01-10T23:00:00Z", &["p1"]),
            shift("s2", "2024-01-11T01:00:00Z", "2024-01-11T03:00:00Z", &["p1"]),
        ],
    );
    let settings = utc();
    let found = roster_core::detect_violations(&snapshot, &settings);
    assert_eq!(ids(&found), vec!["rest-s1-s2-p1"]);

    let on_tenth = ViolationQuery {
        from: Some(date!(2024 - 01 - 10)),
        to: Some(date!(2024 - 01 - 10)),
        ..ViolationQuery::default()
    };
    let filtered = apply_query(found, &on_tenth, &settings);
    assert_eq!(filtered.len(), 1);

    let bytes = export_violations_csv(&filtered, &snapshot.tasks, &settings).expect("export");
    let rows = csv_rows(&bytes);
    assert_eq!(rows[1][4], "10.1.2024");
    assert_eq!(rows[1][5], "22:00");
}
