use campusnest_models::imports::{DuplicateStudent, ImportErrorDetail, ImportResult};
use campusnest_models::students::ValidatedStudent;
use tracing::debug;

/// Where a duplicate's natural key was already claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateSource {
    /// An earlier row of the same run.
    InFile,
    /// A student already persisted in the store.
    Store,
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Imported,
    Duplicate(DuplicateSource),
    Failed(String),
}

/// Folds record outcomes into an [`ImportResult`].
///
/// Counts are always exact. Detail lists keep the first `detail_limit`
/// entries only; `None` keeps all of them.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    detail_limit: Option<usize>,
    result: ImportResult,
}

impl ResultAggregator {
    pub fn new(detail_limit: Option<usize>) -> Self {
        Self {
            detail_limit,
            result: ImportResult::default(),
        }
    }

    fn has_room(&self, len: usize) -> bool {
        self.detail_limit.is_none_or(|limit| len < limit)
    }

    pub fn record(&mut self, student: &ValidatedStudent, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Imported => self.result.success_count += 1,
            RecordOutcome::Duplicate(source) => {
                debug!(
                    row_index = student.row_index,
                    id_number = %student.id_number,
                    ?source,
                    "Skipping duplicate student"
                );
                self.result.duplicate_count += 1;
                if self.has_room(self.result.duplicate_students.len()) {
                    self.result.duplicate_students.push(DuplicateStudent {
                        name: student.full_name(),
                        id_number: student.id_number.clone(),
                        row_index: student.row_index,
                    });
                }
            }
            RecordOutcome::Failed(error) => {
                self.result.error_count += 1;
                if self.has_room(self.result.errors.len()) {
                    self.result.errors.push(ImportErrorDetail {
                        name: Some(student.full_name()),
                        id_number: Some(student.id_number.clone()),
                        row_index: Some(student.row_index),
                        error,
                    });
                }
            }
        }
    }

    /// Number of records recorded so far.
    pub fn processed(&self) -> usize {
        self.result.total()
    }

    pub fn finish(self) -> ImportResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusnest_models::students::StudentStatus;
    use campusnest_models::value_types::IdNumber;

    fn student(row_index: usize) -> ValidatedStudent {
        ValidatedStudent {
            row_index,
            id_number: IdNumber::new_unchecked(format!("{:013}", row_index)),
            first_names: "Ayanda".to_string(),
            surname: "Zulu".to_string(),
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

    #[test]
    fn test_counts_are_exact_and_details_capped() {
        let mut aggregator = ResultAggregator::new(Some(2));
        for i in 0..5 {
            aggregator.record(&student(i), RecordOutcome::Duplicate(DuplicateSource::Store));
        }
        for i in 5..8 {
            aggregator.record(&student(i), RecordOutcome::Failed("rejected".to_string()));
        }
        aggregator.record(&student(8), RecordOutcome::Imported);
        assert_eq!(aggregator.processed(), 9);

        let result = aggregator.finish();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.duplicate_count, 5);
        assert_eq!(result.duplicate_students.len(), 2);
        assert_eq!(result.omitted_duplicates(), 3);
        assert_eq!(result.error_count, 3);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].row_index, Some(5));
        assert_eq!(result.errors[0].name.as_deref(), Some("Ayanda Zulu"));
    }

    #[test]
    fn test_unlimited_details() {
        let mut aggregator = ResultAggregator::new(None);
        for i in 0..300 {
            aggregator.record(&student(i), RecordOutcome::Duplicate(DuplicateSource::InFile));
        }
        let result = aggregator.finish();
        assert_eq!(result.duplicate_students.len(), 300);
        assert_eq!(result.omitted_duplicates(), 0);
    }

    #[test]
    fn test_zero_limit_keeps_counts_only() {
        let mut aggregator = ResultAggregator::new(Some(0));
        aggregator.record(&student(0), RecordOutcome::Failed("boom".to_string()));
        let result = aggregator.finish();
        assert_eq!(result.error_count, 1);
        assert!(result.errors.is_empty());
    }
}
