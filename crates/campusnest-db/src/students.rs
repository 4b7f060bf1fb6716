use campusnest_import::{StoreError, StoreFuture, StudentStore};
use campusnest_models::imports::ImportAudit;
use campusnest_models::students::ValidatedStudent;
use campusnest_models::value_types::IdNumber;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Rows per INSERT. 15 parameters per row keeps this well under the
/// PostgreSQL limit of 65535 bind parameters.
pub const MAX_BATCH_SIZE: usize = 500;

const COLUMNS_PER_ROW: usize = 15;

const INSERT_PREFIX: &str = "INSERT INTO students (id_number, first_names, surname, email, \
    phone_number, institution, student_number, program, year_of_study, funded, funded_amount, \
    nsfas_number, status, created_by, import_session_id) VALUES ";

/// [`StudentStore`] backed by the `students` table.
#[derive(Clone)]
pub struct PgStudentStore {
    pool: PgPool,
}

impl PgStudentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds `INSERT ... VALUES ($1, ..., $15), ($16, ...)` for `rows` rows.
fn insert_query(rows: usize) -> String {
    let mut query = String::from(INSERT_PREFIX);
    for i in 0..rows {
        if i > 0 {
            query.push_str(", ");
        }
        let param_idx = i * COLUMNS_PER_ROW;
        let params: Vec<String> = (1..=COLUMNS_PER_ROW)
            .map(|n| format!("${}", param_idx + n))
            .collect();
        query.push('(');
        query.push_str(&params.join(", "));
        query.push(')');
    }
    query
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Rejected(err.to_string()),
    }
}

impl StudentStore for PgStudentStore {
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    fn exists_by_id_number<'a>(&'a self, id_number: &'a IdNumber) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM students WHERE id_number = $1)",
            )
            .bind(id_number)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
        })
    }

    fn write_batch<'a>(
        &'a self,
        students: &'a [&'a ValidatedStudent],
        audit: &'a ImportAudit,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if students.is_empty() {
                return Ok(());
            }
            if students.len() > MAX_BATCH_SIZE {
                return Err(StoreError::Rejected(format!(
                    "batch of {} exceeds the limit of {} rows",
                    students.len(),
                    MAX_BATCH_SIZE
                )));
            }

            let query = insert_query(students.len());
            let imported_by = audit.imported_by.map(Uuid::from);
            let session_id = audit.session_id.map(Uuid::from);

            let mut q = sqlx::query(&query);
            for student in students {
                q = q
                    .bind(&student.id_number)
                    .bind(&student.first_names)
                    .bind(&student.surname)
                    .bind(&student.email)
                    .bind(&student.phone_number)
                    .bind(&student.institution)
                    .bind(&student.student_number)
                    .bind(&student.program)
                    .bind(student.year_of_study.and_then(|y| i32::try_from(y).ok()))
                    .bind(student.funded)
                    .bind(student.funded_amount)
                    .bind(&student.nsfas_number)
                    .bind(student.status.as_str())
                    .bind(imported_by)
                    .bind(session_id);
            }

            // A single statement is atomic: either every row lands or none.
            let done = q.execute(&self.pool).await.map_err(map_sqlx_error)?;
            debug!(rows = done.rows_affected(), "Inserted student batch");
            Ok(())
        })
    }
}
