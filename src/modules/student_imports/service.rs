//! Import session registry.
//!
//! Sessions live in memory and belong to the user who created them. The
//! registry lock is never held across store calls: an import takes its ticket
//! under the lock, runs unlocked and re-locks to record the outcome. Progress
//! of a running import is published through a watch channel so snapshots can
//! be served while it runs.
//!
//! An import runs on its own task, so a caller that stops waiting does not
//! cancel it and the session always leaves Importing. Sessions idle for longer
//! than the configured TTL are discarded unless they are importing.

use anyhow::anyhow;
use campusnest_config::ImportConfig;
use campusnest_core::AppError;
use campusnest_import::{
    FileError, ImportOptions, ImportSession, ParseLimits, SessionError, StudentStore,
    UploadedFile, import_student_batch,
};
use campusnest_models::ids::{ImportSessionId, UserId};
use campusnest_models::imports::{BatchProgress, ImportAudit, ImportResult};
use campusnest_observability::{track_import_file, track_import_records, track_import_run};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{Instrument, debug, info, instrument, warn};

use super::model::ImportSessionView;

struct SessionEntry {
    owner: UserId,
    session: ImportSession,
    progress: Option<watch::Receiver<Option<BatchProgress>>>,
    last_touched: Instant,
}

impl SessionEntry {
    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        !self.session.is_importing() && self.last_touched.elapsed() >= ttl
    }

    fn latest_progress(&self) -> Option<BatchProgress> {
        self.progress.as_ref().and_then(|rx| *rx.borrow())
    }
}

#[derive(Clone)]
pub struct StudentImportService {
    sessions: Arc<RwLock<HashMap<ImportSessionId, SessionEntry>>>,
    store: Arc<dyn StudentStore>,
    config: ImportConfig,
}

impl fmt::Debug for StudentImportService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudentImportService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn session_not_found() -> AppError {
    AppError::not_found(anyhow!("Import session not found"))
}

pub fn file_error(err: FileError) -> AppError {
    match err {
        e @ FileError::UnsupportedType { .. } => AppError::unsupported_media_type(e),
        e @ FileError::TooLarge { .. } => AppError::payload_too_large(e),
        e => AppError::bad_request(e),
    }
}

pub fn session_error(err: SessionError) -> AppError {
    match err {
        SessionError::File(e) => file_error(e),
        e @ (SessionError::ValidationPending { .. } | SessionError::NothingToImport) => {
            AppError::unprocessable(e)
        }
        e @ (SessionError::InvalidTransition { .. } | SessionError::ImportInProgress) => {
            AppError::conflict(e)
        }
    }
}

impl StudentImportService {
    pub fn new(store: Arc<dyn StudentStore>, config: ImportConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            config,
        }
    }

    fn view(&self, id: ImportSessionId, entry: &SessionEntry) -> ImportSessionView {
        ImportSessionView::from_session(
            id,
            &entry.session,
            entry.latest_progress(),
            self.config.preview_rows,
        )
    }

    #[instrument(skip(self))]
    pub async fn create_session(&self, owner: UserId) -> ImportSessionView {
        let id = ImportSessionId::new();
        let entry = SessionEntry {
            owner,
            session: ImportSession::new(),
            progress: None,
            last_touched: Instant::now(),
        };
        let view = self.view(id, &entry);

        self.sessions.write().await.insert(id, entry);
        info!(session_id = %id, "Import session created");
        view
    }

    #[instrument(skip(self))]
    pub async fn get_session(
        &self,
        owner: UserId,
        id: ImportSessionId,
    ) -> Result<ImportSessionView, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .filter(|e| e.owner == owner)
            .ok_or_else(session_not_found)?;
        entry.touch();

        if let Some(progress) = entry.latest_progress() {
            entry
                .session
                .record_progress(progress)
                .map_err(session_error)?;
        }
        Ok(self.view(id, entry))
    }

    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    pub async fn upload_file(
        &self,
        owner: UserId,
        id: ImportSessionId,
        file: UploadedFile,
    ) -> Result<ImportSessionView, AppError> {
        let limits = ParseLimits {
            max_file_bytes: self.config.max_file_bytes,
        };

        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .filter(|e| e.owner == owner)
            .ok_or_else(session_not_found)?;
        entry.touch();

        match entry.session.upload(&file, &limits) {
            Ok(()) => track_import_file("accepted"),
            Err(e) => {
                if matches!(e, SessionError::File(_)) {
                    track_import_file("rejected");
                }
                warn!(error = %e, "Student file rejected");
                return Err(session_error(e));
            }
        }

        Ok(self.view(id, entry))
    }

    /// Runs the import of a previewed session to completion.
    ///
    /// The import itself runs on a spawned task that owns the ticket and
    /// always records the outcome, even when this future is dropped.
    #[instrument(skip(self))]
    pub async fn run_import(
        &self,
        owner: UserId,
        id: ImportSessionId,
    ) -> Result<ImportResult, AppError> {
        let (ticket, progress_tx) = {
            let mut sessions = self.sessions.write().await;

            let busy = sessions
                .iter()
                .any(|(sid, e)| *sid != id && e.owner == owner && e.session.is_importing());
            let entry = sessions
                .get_mut(&id)
                .filter(|e| e.owner == owner)
                .ok_or_else(session_not_found)?;
            if busy {
                return Err(AppError::conflict(anyhow!(
                    "Another import is already running for this user"
                )));
            }

            let ticket = entry.session.begin_import().map_err(session_error)?;
            let (tx, rx) = watch::channel(None);
            entry.progress = Some(rx);
            entry.touch();
            (ticket, tx)
        };

        let options = ImportOptions {
            chunk_size: self.config.chunk_size,
            detail_limit: self.config.detail_limit,
            audit: ImportAudit {
                imported_by: Some(owner),
                session_id: Some(id),
            },
        };
        let store = Arc::clone(&self.store);
        let sessions = Arc::clone(&self.sessions);

        let task = tokio::spawn(
            async move {
                let outcome = import_student_batch(
                    store.as_ref(),
                    ticket.students(),
                    &options,
                    |progress| {
                        progress_tx.send_replace(Some(*progress));
                    },
                )
                .await;

                let response = match &outcome {
                    Ok(result) => {
                        track_import_run("completed");
                        track_import_records(
                            result.success_count,
                            result.duplicate_count,
                            result.error_count,
                        );
                        Ok(result.clone())
                    }
                    Err(e) => {
                        track_import_run("failed");
                        Err(AppError::service_unavailable(e.clone()))
                    }
                };

                let mut sessions = sessions.write().await;
                match sessions.get_mut(&id) {
                    Some(entry) => {
                        entry.progress = None;
                        entry.touch();
                        if let Err(e) = entry.session.finish(ticket, outcome) {
                            return Err(session_error(e));
                        }
                    }
                    None => warn!(session_id = %id, "Import session vanished during import"),
                }

                response
            }
            .in_current_span(),
        );

        task.await?
    }

    /// Discards every session idle for at least the configured TTL. Sessions
    /// that are importing are kept.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.config.session_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(ttl));

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Idle import sessions discarded");
        }
        evicted
    }

    /// Starts a background task that calls [`evict_idle`](Self::evict_idle)
    /// periodically. Must be called from within a tokio runtime.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let service = self.clone();
        let period = self
            .config
            .session_ttl
            .clamp(Duration::from_secs(1), Duration::from_secs(60));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let evicted = service.evict_idle().await;
                debug!(evicted, "Import session sweep finished");
            }
        })
    }

    #[instrument(skip(self))]
    pub async fn reset_session(
        &self,
        owner: UserId,
        id: ImportSessionId,
    ) -> Result<ImportSessionView, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .filter(|e| e.owner == owner)
            .ok_or_else(session_not_found)?;

        entry.session.reset().map_err(session_error)?;
        entry.progress = None;
        entry.touch();
        Ok(self.view(id, entry))
    }

    #[instrument(skip(self))]
    pub async fn delete_session(&self, owner: UserId, id: ImportSessionId) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get(&id)
            .filter(|e| e.owner == owner)
            .ok_or_else(session_not_found)?;

        if entry.session.is_importing() {
            return Err(session_error(SessionError::ImportInProgress));
        }

        sessions.remove(&id);
        info!(session_id = %id, "Import session discarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use campusnest_import::{InMemoryStudentStore, SessionStage, StoreFuture};
    use campusnest_models::students::ValidatedStudent;
    use campusnest_models::value_types::IdNumber;
    use tokio::sync::Semaphore;

    /// Store whose lookups wait until [`GatedStore::open`] is called.
    struct GatedStore {
        inner: InMemoryStudentStore,
        gate: Semaphore,
    }

    impl GatedStore {
        fn new() -> Self {
            Self {
                inner: InMemoryStudentStore::new(),
                gate: Semaphore::new(0),
            }
        }

        fn open(&self) {
            self.gate.add_permits(1024);
        }
    }

    impl StudentStore for GatedStore {
        fn max_batch_size(&self) -> usize {
            self.inner.max_batch_size()
        }

        fn exists_by_id_number<'a>(&'a self, id_number: &'a IdNumber) -> StoreFuture<'a, bool> {
            Box::pin(async move {
                let _permit = self.gate.acquire().await;
                self.inner.exists_by_id_number(id_number).await
            })
        }

        fn write_batch<'a>(
            &'a self,
            students: &'a [&'a ValidatedStudent],
            audit: &'a ImportAudit,
        ) -> StoreFuture<'a, ()> {
            self.inner.write_batch(students, audit)
        }
    }

    const VALID: &str = "idNumber,firstNames,surname\n\
        9001015009086,Naledi,Khumalo\n\
        8001015009087,Sipho,Nkosi\n";

    fn service(store: Arc<InMemoryStudentStore>) -> StudentImportService {
        StudentImportService::new(store, ImportConfig::default())
    }

    fn csv(body: &str) -> UploadedFile {
        UploadedFile::new("students.csv", Some("text/csv".to_string()), body.as_bytes())
    }

    #[test]
    fn test_error_status_mapping() {
        let unsupported = FileError::UnsupportedType {
            file_name: "a.pdf".into(),
            content_type: None,
        };
        assert_eq!(
            file_error(unsupported).status,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            file_error(FileError::TooLarge { size: 2, max: 1 }).status,
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(file_error(FileError::Empty).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            session_error(SessionError::ValidationPending { invalid_rows: 1 }).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            session_error(SessionError::ImportInProgress).status,
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_sessions_are_private_to_their_owner() {
        let service = service(Arc::new(InMemoryStudentStore::new()));
        let owner = UserId::new();
        let view = service.create_session(owner).await;

        assert_eq!(view.stage, SessionStage::Upload);
        let err = service.get_session(UserId::new(), view.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(service.get_session(owner, view.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_import_stamps_owner_and_session() {
        let store = Arc::new(InMemoryStudentStore::new());
        let service = service(store.clone());
        let owner = UserId::new();
        let id = service.create_session(owner).await.id;

        service.upload_file(owner, id, csv(VALID)).await.unwrap();
        let result = service.run_import(owner, id).await.unwrap();

        assert_eq!(result.success_count, 2);
        let audit = store
            .audit_of(&"9001015009086".parse().unwrap())
            .unwrap();
        assert_eq!(audit.imported_by, Some(owner));
        assert_eq!(audit.session_id, Some(id));

        let view = service.get_session(owner, id).await.unwrap();
        assert_eq!(view.stage, SessionStage::Complete);
        assert_eq!(view.result, Some(result));
    }

    #[tokio::test]
    async fn test_store_outage_returns_session_to_preview() {
        let store = Arc::new(InMemoryStudentStore::new());
        store.unavailable_after(0);
        let service = service(store);
        let owner = UserId::new();
        let id = service.create_session(owner).await.id;
        service.upload_file(owner, id, csv(VALID)).await.unwrap();

        let err = service.run_import(owner, id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let view = service.get_session(owner, id).await.unwrap();
        assert_eq!(view.stage, SessionStage::Preview);
        assert!(view.error.unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_delete_removes_session() {
        let service = service(Arc::new(InMemoryStudentStore::new()));
        let owner = UserId::new();
        let id = service.create_session(owner).await.id;

        service.delete_session(owner, id).await.unwrap();
        let err = service.get_session(owner, id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_import_finishes_when_caller_stops_waiting() {
        let store = Arc::new(GatedStore::new());
        let config = ImportConfig {
            session_ttl: Duration::ZERO,
            ..ImportConfig::default()
        };
        let service = StudentImportService::new(store.clone(), config);
        let owner = UserId::new();
        let id = service.create_session(owner).await.id;
        service.upload_file(owner, id, csv(VALID)).await.unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), service.run_import(owner, id)).await;
        assert!(abandoned.is_err());
        assert_eq!(service.evict_idle().await, 0);

        store.open();
        let mut stage = SessionStage::Importing;
        for _ in 0..200 {
            stage = service.get_session(owner, id).await.unwrap().stage;
            if stage != SessionStage::Importing {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stage, SessionStage::Complete);
        assert_eq!(store.inner.len(), 2);

        service.reset_session(owner, id).await.unwrap();
        let next = service.create_session(owner).await.id;
        service.upload_file(owner, next, csv(VALID)).await.unwrap();
        let result = service.run_import(owner, next).await.unwrap();
        assert_eq!(result.duplicate_count, 2);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let config = ImportConfig {
            session_ttl: Duration::ZERO,
            ..ImportConfig::default()
        };
        let service = StudentImportService::new(Arc::new(InMemoryStudentStore::new()), config);
        let owner = UserId::new();
        let first = service.create_session(owner).await.id;
        let second = service.create_session(owner).await.id;
        service.upload_file(owner, second, csv(VALID)).await.unwrap();

        assert_eq!(service.evict_idle().await, 2);
        for id in [first, second] {
            let err = service.get_session(owner, id).await.unwrap_err();
            assert_eq!(err.status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_recent_sessions_survive_eviction() {
        let service = service(Arc::new(InMemoryStudentStore::new()));
        let owner = UserId::new();
        let id = service.create_session(owner).await.id;

        assert_eq!(service.evict_idle().await, 0);
        assert!(service.get_session(owner, id).await.is_ok());
    }
}
