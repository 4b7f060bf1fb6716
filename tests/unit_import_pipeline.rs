mod common;

use campusnest_import::{
    ImportOptions, ImportSession, InMemoryStudentStore, ParseLimits, SessionError, UploadedFile,
    convert_to_validated_students, import_student_batch, parse_student_csv,
};
use campusnest_models::imports::{BatchProgress, ImportResult, StudentColumn};
use campusnest_models::students::ValidatedStudent;
use common::{id_number, student_csv, valid_student_csv};
use std::collections::BTreeSet;

fn upload(contents: &str) -> UploadedFile {
    UploadedFile::new("students.csv", Some("text/csv".to_string()), contents.as_bytes())
}

fn validated(contents: &str) -> Vec<ValidatedStudent> {
    let parsed = parse_student_csv(&upload(contents), &ParseLimits::default()).unwrap();
    convert_to_validated_students(&parsed.data, &parsed.errors)
}

async fn import(store: &InMemoryStudentStore, students: &[ValidatedStudent]) -> ImportResult {
    import_student_batch(store, students, &ImportOptions::default(), |_| {})
        .await
        .unwrap()
}

#[test]
fn test_row_missing_every_required_field_reports_each() {
    let csv = "idNumber,firstNames,surname,email\n,,,naledi@example.com\n";
    let parsed = parse_student_csv(&upload(csv), &ParseLimits::default()).unwrap();

    let fields: BTreeSet<StudentColumn> = parsed.errors[&0].iter().map(|e| e.field).collect();
    assert_eq!(
        fields,
        BTreeSet::from([
            StudentColumn::IdNumber,
            StudentColumn::FirstNames,
            StudentColumn::Surname
        ])
    );
}

#[test]
fn test_every_row_is_either_valid_or_has_errors() {
    let csv = student_csv(&[
        (id_number(0).as_str(), "Naledi", "Khumalo"),
        ("123", "Sipho", "Nkosi"),
        (id_number(2).as_str(), "", "Dlamini"),
        (id_number(3).as_str(), "Thandi", "Mokoena"),
    ]);
    let parsed = parse_student_csv(&upload(&csv), &ParseLimits::default()).unwrap();

    assert_eq!(parsed.total_count(), 4);
    assert_eq!(parsed.valid_count(), 2);
    assert_eq!(parsed.data.len(), parsed.valid_count() + parsed.errors.len());
}

#[test]
fn test_converter_keeps_valid_rows_in_file_order() {
    let csv = student_csv(&[
        (id_number(0).as_str(), "Naledi", "Khumalo"),
        ("", "Sipho", "Nkosi"),
        (id_number(2).as_str(), "Lerato", "Dlamini"),
        (id_number(3).as_str(), "Thandi", ""),
        (id_number(4).as_str(), "Bongani", "Mokoena"),
    ]);
    let students = validated(&csv);

    let rows: Vec<usize> = students.iter().map(|s| s.row_index).collect();
    assert_eq!(rows, vec![0, 2, 4]);
    assert_eq!(students[1].id_number.as_str(), id_number(2));
}

#[tokio::test]
async fn test_outcome_counts_cover_every_record() {
    let store = InMemoryStudentStore::new();
    let mut students = validated(&valid_student_csv(6));
    store.seed([&students[1]]);
    store.reject(&students[4].id_number);
    store.fail_batch_writes();
    let repeat = students[2].clone();
    students.push(repeat);

    let result = import(&store, &students).await;

    assert_eq!(result.success_count, 4);
    assert_eq!(result.duplicate_count, 2);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.total(), students.len());
}

#[tokio::test]
async fn test_reimport_yields_only_duplicates() {
    let store = InMemoryStudentStore::new();
    let students = validated(&valid_student_csv(5));

    let first = import(&store, &students).await;
    assert_eq!(first.success_count, 5);

    let second = import(&store, &students).await;
    assert_eq!(second.success_count, 0);
    assert_eq!(second.duplicate_count, 5);
    assert_eq!(second.error_count, 0);
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn test_in_file_duplicate_credits_first_occurrence() {
    let store = InMemoryStudentStore::new();
    let shared = id_number(7);
    let students = validated(&student_csv(&[
        (shared.as_str(), "Naledi", "Khumalo"),
        (id_number(8).as_str(), "Sipho", "Nkosi"),
        (shared.as_str(), "Lerato", "Dlamini"),
    ]));

    let result = import(&store, &students).await;

    assert_eq!(result.success_count, 2);
    assert_eq!(result.duplicate_count, 1);
    assert_eq!(result.duplicate_students[0].row_index, 2);
    assert_eq!(result.duplicate_students[0].name, "Lerato Dlamini");
    let kept = store.get(&students[0].id_number).unwrap();
    assert_eq!(kept.row_index, 0);
    assert_eq!(kept.first_names, "Naledi");
}

#[tokio::test]
async fn test_progress_reaches_hundred_only_on_last_batch() {
    let store = InMemoryStudentStore::new();
    let students = validated(&valid_student_csv(1050));
    assert_eq!(students.len(), 1050);

    let mut snapshots: Vec<BatchProgress> = Vec::new();
    let result = import_student_batch(&store, &students, &ImportOptions::default(), |p| {
        snapshots.push(*p)
    })
    .await
    .unwrap();

    assert_eq!(result.success_count, 1050);
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().all(|p| p.total_batches == 3));
    assert_eq!(
        snapshots.iter().map(|p| p.imported_count).collect::<Vec<_>>(),
        vec![500, 1000, 1050]
    );
    assert!(snapshots[..2].iter().all(|p| p.percentage < 100));
    assert_eq!(snapshots[2].percentage, 100);
    assert!(snapshots[2].is_last());
}

#[test]
fn test_file_with_invalid_rows_cannot_be_imported() {
    let csv = student_csv(&[
        (id_number(0).as_str(), "Naledi", "Khumalo"),
        ("12345", "Sipho", "Nkosi"),
        (id_number(2).as_str(), "", "Dlamini"),
    ]);
    let mut session = ImportSession::new();
    session.upload(&upload(&csv), &ParseLimits::default()).unwrap();

    assert_eq!(
        session.begin_import().unwrap_err(),
        SessionError::ValidationPending { invalid_rows: 2 }
    );
    assert_eq!(session.parsed().unwrap().invalid_count(), 2);
}

#[tokio::test]
async fn test_valid_file_imports_every_student_then_all_are_duplicates() {
    let store = InMemoryStudentStore::new();
    let csv = valid_student_csv(3);

    for expected_success in [3, 0] {
        let mut session = ImportSession::new();
        session.upload(&upload(&csv), &ParseLimits::default()).unwrap();
        let ticket = session.begin_import().unwrap();

        let outcome =
            import_student_batch(&store, ticket.students(), &ImportOptions::default(), |_| {})
                .await;
        session.finish(ticket, outcome).unwrap();

        let result = session.result().unwrap();
        assert_eq!(result.success_count, expected_success);
        assert_eq!(result.duplicate_count, 3 - expected_success);
        assert_eq!(result.error_count, 0);
    }
    assert_eq!(store.len(), 3);
}
