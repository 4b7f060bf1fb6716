//! Duplicate-aware batch importer.
//!
//! Records are written in contiguous chunks, one chunk at a time. Within a
//! run the first occurrence of an ID number wins; later occurrences are
//! duplicates without another store lookup. A chunk is written atomically and,
//! if that fails, record by record so one bad record does not sink the rest.

use campusnest_models::imports::{BatchProgress, ImportAudit, ImportResult};
use campusnest_models::students::ValidatedStudent;
use campusnest_models::value_types::IdNumber;
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};

use crate::aggregator::{DuplicateSource, RecordOutcome, ResultAggregator};
use crate::error::{PipelineError, StoreError};
use crate::store::StudentStore;

pub use campusnest_config::import::{DEFAULT_CHUNK_SIZE, DEFAULT_DETAIL_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Upper bound on records per chunk; the store's own limit also applies.
    pub chunk_size: usize,
    /// Cap on the duplicate and error detail lists. `None` keeps all.
    pub detail_limit: Option<usize>,
    pub audit: ImportAudit,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            detail_limit: Some(DEFAULT_DETAIL_LIMIT),
            audit: ImportAudit::default(),
        }
    }
}

impl ImportOptions {
    /// Effective chunk size for `store`, never zero.
    pub fn chunk_size_for<S: StudentStore + ?Sized>(&self, store: &S) -> usize {
        self.chunk_size.min(store.max_batch_size()).max(1)
    }
}

/// Imports `students` into `store`, calling `on_progress` once per chunk.
///
/// Per-record failures are reported in the result. Only a fatal store error
/// aborts the run.
#[instrument(skip_all, fields(total = students.len()))]
pub async fn import_student_batch<S, F>(
    store: &S,
    students: &[ValidatedStudent],
    options: &ImportOptions,
    mut on_progress: F,
) -> Result<ImportResult, PipelineError>
where
    S: StudentStore + ?Sized,
    F: FnMut(&BatchProgress),
{
    if students.is_empty() {
        return Ok(ImportResult::default());
    }

    let total_count = students.len();
    let chunk_size = options.chunk_size_for(store);
    let total_batches = total_count.div_ceil(chunk_size);
    let aborted = |batch: usize, source: StoreError| {
        error!(batch, total_batches, error = %source, "Student import aborted");
        PipelineError::StoreUnavailable {
            batch,
            total_batches,
            source,
        }
    };

    let mut aggregator = ResultAggregator::new(options.detail_limit);
    let mut claimed: HashSet<&IdNumber> = HashSet::with_capacity(total_count);

    for (index, chunk) in students.chunks(chunk_size).enumerate() {
        let batch = index + 1;
        let mut pending: Vec<&ValidatedStudent> = Vec::with_capacity(chunk.len());

        for student in chunk {
            if !claimed.insert(&student.id_number) {
                aggregator.record(student, RecordOutcome::Duplicate(DuplicateSource::InFile));
                continue;
            }

            match store.exists_by_id_number(&student.id_number).await {
                Ok(true) => {
                    aggregator.record(student, RecordOutcome::Duplicate(DuplicateSource::Store))
                }
                Ok(false) => pending.push(student),
                Err(e) if e.is_fatal() => return Err(aborted(batch, e)),
                Err(e) => aggregator.record(student, RecordOutcome::Failed(e.to_string())),
            }
        }

        if !pending.is_empty() {
            match store.write_batch(&pending, &options.audit).await {
                Ok(()) => {
                    for student in &pending {
                        aggregator.record(student, RecordOutcome::Imported);
                    }
                }
                Err(e) if e.is_fatal() => return Err(aborted(batch, e)),
                Err(e) => {
                    warn!(batch, error = %e, "Batch write failed, writing records one by one");
                    for student in &pending {
                        let outcome = match store.write_one(student, &options.audit).await {
                            Ok(()) => RecordOutcome::Imported,
                            Err(StoreError::Conflict(_)) => {
                                RecordOutcome::Duplicate(DuplicateSource::Store)
                            }
                            Err(e) if e.is_fatal() => return Err(aborted(batch, e)),
                            Err(e) => RecordOutcome::Failed(e.to_string()),
                        };
                        aggregator.record(student, outcome);
                    }
                }
            }
        }

        let progress = BatchProgress::new(batch, total_batches, aggregator.processed(), total_count);
        on_progress(&progress);
    }

    let result = aggregator.finish();
    info!(
        success = result.success_count,
        duplicates = result.duplicate_count,
        errors = result.error_count,
        "Student import finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStudentStore;
    use campusnest_models::students::StudentStatus;

    #[test]
    fn test_default_options_follow_import_config() {
        let config = campusnest_config::ImportConfig::default();
        let options = ImportOptions::default();
        assert_eq!(options.chunk_size, config.chunk_size);
        assert_eq!(options.detail_limit, config.detail_limit);
        assert_eq!(
            crate::parser::ParseLimits::default().max_file_bytes,
            config.max_file_bytes
        );
    }

    fn student(row_index: usize, id: &str) -> ValidatedStudent {
        ValidatedStudent {
            row_index,
            id_number: IdNumber::new_unchecked(id),
            first_names: format!("Student{}", row_index),
            surname: "Mokoena".to_string(),
            email: None,
            phone_number: None,
            institution: None,
            student_number: None,
            program: None,
            year_of_study: None,
            funded: false,
            funded_amount: None,
            nsfas_number: None,
            status: StudentStatus::Pending,
        }
    }

    fn students(n: usize) -> Vec<ValidatedStudent> {
        (0..n)
            .map(|i| student(i, &format!("{:013}", 9_000_000_000_000u64 + i as u64)))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_input_returns_default_without_progress() {
        let store = InMemoryStudentStore::new();
        let mut calls = 0;
        let result = import_student_batch(&store, &[], &ImportOptions::default(), |_| calls += 1)
            .await
            .unwrap();
        assert_eq!(result, ImportResult::default());
        assert_eq!(calls, 0);
        assert_eq!(store.exists_calls(), 0);
    }

    #[tokio::test]
    async fn test_chunk_size_respects_store_limit() {
        let store = InMemoryStudentStore::with_max_batch_size(2);
        let options = ImportOptions {
            chunk_size: 10,
            ..Default::default()
        };
        let mut batches = Vec::new();
        let result = import_student_batch(&store, &students(5), &options, |p| {
            batches.push((p.current_batch, p.total_batches))
        })
        .await
        .unwrap();

        assert_eq!(result.success_count, 5);
        assert_eq!(batches, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(store.batch_writes(), 3);
    }

    #[tokio::test]
    async fn test_in_file_duplicate_skips_store_lookup() {
        let store = InMemoryStudentStore::new();
        let input = vec![
            student(0, "9001015009087"),
            student(1, "9202025009086"),
            student(2, "9001015009087"),
        ];
        let result = import_student_batch(&store, &input, &ImportOptions::default(), |_| {})
            .await
            .unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.duplicate_count, 1);
        assert_eq!(result.duplicate_students[0].row_index, 2);
        assert_eq!(store.exists_calls(), 2);
        assert_eq!(
            store
                .get(&IdNumber::new_unchecked("9001015009087"))
                .map(|s| s.row_index),
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_single_writes() {
        let store = InMemoryStudentStore::new();
        let input = students(4);
        store.fail_batch_writes();
        store.reject(&input[1].id_number);

        let result = import_student_batch(&store, &input, &ImportOptions::default(), |_| {})
            .await
            .unwrap();

        assert_eq!(result.success_count, 3);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.errors[0].row_index, Some(1));
        assert_eq!(store.single_writes(), 4);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_store_outage_aborts_run() {
        let store = InMemoryStudentStore::with_max_batch_size(2);
        // First chunk: two lookups and one write; the next call fails
        store.unavailable_after(3);
        let mut progress = Vec::new();

        let err = import_student_batch(&store, &students(4), &ImportOptions::default(), |p| {
            progress.push(*p)
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StoreUnavailable {
                batch: 2,
                total_batches: 2,
                ..
            }
        ));
        assert_eq!(progress.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_audit_is_stamped_on_records() {
        use campusnest_models::ids::{ImportSessionId, UserId};

        let store = InMemoryStudentStore::new();
        let audit = ImportAudit {
            imported_by: Some(UserId::new()),
            session_id: Some(ImportSessionId::new()),
        };
        let options = ImportOptions {
            audit,
            ..Default::default()
        };
        let input = students(1);
        import_student_batch(&store, &input, &options, |_| {})
            .await
            .unwrap();

        assert_eq!(store.audit_of(&input[0].id_number), Some(audit));
    }
}
