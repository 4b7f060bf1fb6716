//! Persistence abstraction consumed by the batch importer.
//!
//! The importer only needs three capabilities from a store: an existence check
//! by natural key, an atomic multi-record write and a disclosed limit on how
//! many records one write may carry.
//!
//! # Example
//!
//! ```ignore
//! use campusnest_import::{InMemoryStudentStore, StudentStore};
//!
//! let store = InMemoryStudentStore::new();
//! assert!(!store.exists_by_id_number(&id_number).await?);
//! store.write_batch(&[&student], &audit).await?;
//! ```

use campusnest_models::imports::ImportAudit;
use campusnest_models::students::ValidatedStudent;
use campusnest_models::value_types::IdNumber;
use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Backend that persists imported students.
///
/// Implementations can be swapped without changing the pipeline.
pub trait StudentStore: Send + Sync {
    /// Largest number of records one [`write_batch`](Self::write_batch) may carry.
    fn max_batch_size(&self) -> usize;

    /// Whether a student with this ID number is already persisted.
    fn exists_by_id_number<'a>(&'a self, id_number: &'a IdNumber) -> StoreFuture<'a, bool>;

    /// Writes all `students` or none of them.
    ///
    /// Fails with [`StoreError::Conflict`] when any ID number is taken.
    fn write_batch<'a>(
        &'a self,
        students: &'a [&'a ValidatedStudent],
        audit: &'a ImportAudit,
    ) -> StoreFuture<'a, ()>;

    /// Writes a single student.
    fn write_one<'a>(
        &'a self,
        student: &'a ValidatedStudent,
        audit: &'a ImportAudit,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.write_batch(std::slice::from_ref(&student), audit)
                .await
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryStudentStore;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    struct State {
        students: HashMap<IdNumber, (ValidatedStudent, ImportAudit)>,
        rejected: HashSet<IdNumber>,
        fail_batch_writes: bool,
        unavailable_after: Option<usize>,
        calls: usize,
        exists_calls: usize,
        batch_writes: usize,
        single_writes: usize,
    }

    impl State {
        fn enter(&mut self) -> Result<(), StoreError> {
            self.calls += 1;
            match self.unavailable_after {
                Some(limit) if self.calls > limit => {
                    Err(StoreError::Unavailable("connection refused".to_string()))
                }
                _ => Ok(()),
            }
        }

        fn check(&self, student: &ValidatedStudent) -> Result<(), StoreError> {
            if self.rejected.contains(&student.id_number) {
                return Err(StoreError::Rejected(format!(
                    "record {} was rejected by the store",
                    student.id_number
                )));
            }
            if self.students.contains_key(&student.id_number) {
                return Err(StoreError::Conflict(format!(
                    "A student with ID number {} already exists",
                    student.id_number
                )));
            }
            Ok(())
        }
    }

    /// Thread-safe in-memory store with failure injection, for tests.
    pub struct InMemoryStudentStore {
        max_batch_size: usize,
        state: Mutex<State>,
    }

    impl Default for InMemoryStudentStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InMemoryStudentStore {
        pub fn new() -> Self {
            Self::with_max_batch_size(500)
        }

        pub fn with_max_batch_size(max_batch_size: usize) -> Self {
            Self {
                max_batch_size,
                state: Mutex::new(State::default()),
            }
        }

        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        /// Pre-populates the store with already persisted students.
        pub fn seed<'a>(&self, students: impl IntoIterator<Item = &'a ValidatedStudent>) {
            let mut state = self.state();
            for student in students {
                state.students.insert(
                    student.id_number.clone(),
                    (student.clone(), ImportAudit::default()),
                );
            }
        }

        /// Every write carrying this ID number fails with [`StoreError::Rejected`].
        pub fn reject(&self, id_number: &IdNumber) {
            self.state().rejected.insert(id_number.clone());
        }

        /// Every multi-record batch write fails; single writes still work.
        pub fn fail_batch_writes(&self) {
            self.state().fail_batch_writes = true;
        }

        /// After `calls` more store calls every call fails with
        /// [`StoreError::Unavailable`].
        pub fn unavailable_after(&self, calls: usize) {
            let mut state = self.state();
            state.unavailable_after = Some(state.calls + calls);
        }

        pub fn len(&self) -> usize {
            self.state().students.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        pub fn contains(&self, id_number: &IdNumber) -> bool {
            self.state().students.contains_key(id_number)
        }

        pub fn get(&self, id_number: &IdNumber) -> Option<ValidatedStudent> {
            self.state()
                .students
                .get(id_number)
                .map(|(student, _)| student.clone())
        }

        pub fn audit_of(&self, id_number: &IdNumber) -> Option<ImportAudit> {
            self.state().students.get(id_number).map(|(_, audit)| *audit)
        }

        pub fn exists_calls(&self) -> usize {
            self.state().exists_calls
        }

        pub fn batch_writes(&self) -> usize {
            self.state().batch_writes
        }

        pub fn single_writes(&self) -> usize {
            self.state().single_writes
        }
    }

    impl StudentStore for InMemoryStudentStore {
        fn max_batch_size(&self) -> usize {
            self.max_batch_size
        }

        fn exists_by_id_number<'a>(&'a self, id_number: &'a IdNumber) -> StoreFuture<'a, bool> {
            Box::pin(async move {
                let mut state = self.state();
                state.enter()?;
                state.exists_calls += 1;
                Ok(state.students.contains_key(id_number))
            })
        }

        fn write_batch<'a>(
            &'a self,
            students: &'a [&'a ValidatedStudent],
            audit: &'a ImportAudit,
        ) -> StoreFuture<'a, ()> {
            Box::pin(async move {
                let mut state = self.state();
                state.enter()?;
                state.batch_writes += 1;

                if students.len() > self.max_batch_size {
                    return Err(StoreError::Rejected(format!(
                        "batch of {} exceeds the limit of {}",
                        students.len(),
                        self.max_batch_size
                    )));
                }
                if state.fail_batch_writes {
                    return Err(StoreError::Rejected("batch write failed".to_string()));
                }
                for student in students {
                    state.check(student)?;
                }
                for student in students {
                    state
                        .students
                        .insert(student.id_number.clone(), ((*student).clone(), *audit));
                }
                Ok(())
            })
        }

        fn write_one<'a>(
            &'a self,
            student: &'a ValidatedStudent,
            audit: &'a ImportAudit,
        ) -> StoreFuture<'a, ()> {
            Box::pin(async move {
                let mut state = self.state();
                state.enter()?;
                state.single_writes += 1;
                state.check(student)?;
                state
                    .students
                    .insert(student.id_number.clone(), (student.clone(), *audit));
                Ok(())
            })
        }
    }
}
