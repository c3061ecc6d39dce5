use pretty_assertions::assert_eq;
use roster_core::analytics::{build_compliance_summary, COMPLIANCE_SUMMARY_VERSION};
use roster_core::demo::demo_snapshot;
use roster_core::query::{apply_query, ViolationQuery};
use roster_core::report::generate_compliance_markdown;
use roster_core::{detect_violations, ComplianceSettings, Severity, ViolationType};

#[test]
fn summary_buckets_reconcile_with_violation_count() {
    let snapshot = demo_snapshot(24, 30);
    let violations = detect_violations(&snapshot, &ComplianceSettings::default());
    let summary = build_compliance_summary(&violations);

    assert_eq!(summary.version, COMPLIANCE_SUMMARY_VERSION);
    assert_eq!(summary.violation_count, violations.len() as i64);
    assert_eq!(
        summary.by_type.iter().map(|t| t.count).sum::<i64>(),
        summary.violation_count
    );
    assert_eq!(
        summary.by_severity.iter().map(|s| s.count).sum::<i64>(),
        summary.violation_count
    );
    assert_eq!(
        summary.top_people.iter().map(|p| p.count).sum::<i64>(),
        summary.violation_count
    );

    // Top ten named buckets plus the rollup.
    assert!(summary.top_people.len() <= 11);
    let counts: Vec<i64> = summary
        .top_people
        .iter()
        .filter(|p| p.key != "person:OTHER")
        .map(|p| p.count)
        .collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn empty_summary_lists_every_bucket() {
    let summary = build_compliance_summary(&[]);
    assert_eq!(summary.violation_count, 0);
    assert_eq!(
        summary.by_type.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![
            ViolationType::RestTime,
            ViolationType::RoleMismatch,
            ViolationType::AbsenceConflict
        ]
    );
    assert_eq!(
        summary.by_severity.iter().map(|s| s.severity).collect::<Vec<_>>(),
        vec![Severity::High, Severity::Medium, Severity::Low]
    );
    assert!(summary.top_people.is_empty());
}

#[test]
fn report_is_deterministic_and_lists_every_violation() {
    let snapshot = demo_snapshot(8, 10);
    let settings = ComplianceSettings::default();
    let violations = apply_query(
        detect_violations(&snapshot, &settings),
        &ViolationQuery::default(),
        &settings,
    );
    let summary = build_compliance_summary(&violations);

    let a = generate_compliance_markdown(&violations, &summary, &settings);
    let b = generate_compliance_markdown(&violations, &summary, &settings);
    assert_eq!(a, b);

    assert!(a.starts_with("# דוח חריגות שיבוץ\n"));
    assert!(a.contains(&format!("- Violations: **{}**", violations.len())));
    let table_rows = a
        .lines()
        .skip_while(|l| !l.starts_with("|---"))
        .skip(1)
        .filter(|l| l.starts_with('|'))
        .count();
    assert_eq!(table_rows, violations.len());
}

#[test]
fn empty_report_says_none() {
    let settings = ComplianceSettings::default();
    let summary = build_compliance_summary(&[]);
    let md = generate_compliance_markdown(&[], &summary, &settings);
    assert!(md.contains("## Violations\n\n- None.\n"));
    assert!(md.contains("- Violations: **0**"));
}
