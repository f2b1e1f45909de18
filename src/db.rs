use crate::availability::{self, WorkerAvailability};
use crate::error::AppError;
use crate::models::{
    AvailabilityRow, JobPost, JobPostPatch, NewJobPost, NewWorkType, WorkType, WorkTypePatch,
    WorkTypeRow,
};
use crate::slots::TimeSlot;
use nanoid::nanoid;
use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS work_types (
            id TEXT PRIMARY KEY,
            employer_id TEXT NOT NULL,
            name TEXT NOT NULL,
            hourly_wage INTEGER NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            time_slots TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS job_posts (
            id TEXT PRIMARY KEY,
            employer_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            work_type_id TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS worker_availabilities (
            id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL,
            day INTEGER NOT NULL,
            hour INTEGER NOT NULL,
            priority INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS uq_worker_availabilities_hour
            ON worker_availabilities (worker_id, day, hour);",
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn slots_json(slots: &[TimeSlot]) -> Result<String, AppError> {
    serde_json::to_string(slots)
        .map_err(|e| AppError::BadRequest(format!("time slots could not be encoded: {e}")))
}

// work types

pub async fn create_work_type(
    pool: &SqlitePool,
    employer_id: &str,
    new: &NewWorkType,
) -> Result<WorkType, AppError> {
    let row: WorkTypeRow = sqlx::query_as(
        "INSERT INTO work_types (id, employer_id, name, hourly_wage, is_active, time_slots)
         VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(nanoid!(10))
    .bind(employer_id)
    .bind(new.name.trim())
    .bind(new.hourly_wage)
    .bind(new.is_active)
    .bind(slots_json(&new.time_slots)?)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub async fn get_work_type(pool: &SqlitePool, id: &str) -> Result<Option<WorkType>, AppError> {
    let row: Option<WorkTypeRow> = sqlx::query_as("SELECT * FROM work_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(WorkType::from))
}

pub async fn list_work_types_by_employer(
    pool: &SqlitePool,
    employer_id: &str,
) -> Result<Vec<WorkType>, AppError> {
    let rows: Vec<WorkTypeRow> =
        sqlx::query_as("SELECT * FROM work_types WHERE employer_id = ? ORDER BY created_at DESC")
            .bind(employer_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(WorkType::from).collect())
}

pub async fn update_work_type(
    pool: &SqlitePool,
    id: &str,
    patch: &WorkTypePatch,
) -> Result<Option<WorkType>, AppError> {
    let time_slots = patch.time_slots.as_deref().map(slots_json).transpose()?;
    let row: Option<WorkTypeRow> = sqlx::query_as(
        "UPDATE work_types SET
            name = COALESCE(?, name),
            hourly_wage = COALESCE(?, hourly_wage),
            is_active = COALESCE(?, is_active),
            time_slots = COALESCE(?, time_slots),
            updated_at = CURRENT_TIMESTAMP
         WHERE id = ? RETURNING *",
    )
    .bind(patch.name.as_deref().map(str::trim))
    .bind(patch.hourly_wage)
    .bind(patch.is_active)
    .bind(time_slots)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(WorkType::from))
}

/// Job posts pointing at the deleted work type keep their dangling id.
pub async fn delete_work_type(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM work_types WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// job posts

pub async fn create_job_post(
    pool: &SqlitePool,
    employer_id: &str,
    new: &NewJobPost,
) -> Result<JobPost, AppError> {
    let post = sqlx::query_as(
        "INSERT INTO job_posts (id, employer_id, title, description, work_type_id)
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(nanoid!(10))
    .bind(employer_id)
    .bind(new.title.trim())
    .bind(new.description.as_deref())
    .bind(new.work_type_id.as_deref())
    .fetch_one(pool)
    .await?;
    Ok(post)
}

pub async fn get_job_post(pool: &SqlitePool, id: &str) -> Result<Option<JobPost>, AppError> {
    sqlx::query_as("SELECT * FROM job_posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_job_posts_by_employer(
    pool: &SqlitePool,
    employer_id: &str,
) -> Result<Vec<JobPost>, AppError> {
    sqlx::query_as("SELECT * FROM job_posts WHERE employer_id = ? ORDER BY created_at DESC")
        .bind(employer_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_job_posts_by_work_type(
    pool: &SqlitePool,
    work_type_id: &str,
) -> Result<Vec<JobPost>, AppError> {
    sqlx::query_as("SELECT * FROM job_posts WHERE work_type_id = ? ORDER BY created_at DESC")
        .bind(work_type_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

/// Every job post whose work type exists and is active, with that work type.
pub async fn list_open_job_posts(pool: &SqlitePool) -> Result<Vec<(JobPost, WorkType)>, AppError> {
    let posts: Vec<JobPost> =
        sqlx::query_as("SELECT * FROM job_posts WHERE work_type_id IS NOT NULL")
            .fetch_all(pool)
            .await?;
    let rows: Vec<WorkTypeRow> = sqlx::query_as("SELECT * FROM work_types WHERE is_active = 1")
        .fetch_all(pool)
        .await?;
    let active: std::collections::HashMap<String, WorkType> = rows
        .into_iter()
        .map(|row| (row.id.clone(), WorkType::from(row)))
        .collect();

    Ok(posts
        .into_iter()
        .filter_map(|post| {
            let work_type = active.get(post.work_type_id.as_deref()?)?.clone();
            Some((post, work_type))
        })
        .collect())
}

pub async fn update_job_post(
    pool: &SqlitePool,
    id: &str,
    patch: &JobPostPatch,
) -> Result<Option<JobPost>, AppError> {
    sqlx::query_as(
        "UPDATE job_posts SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            work_type_id = COALESCE(?, work_type_id),
            updated_at = CURRENT_TIMESTAMP
         WHERE id = ? RETURNING *",
    )
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.description.as_deref())
    .bind(patch.work_type_id.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete_job_post(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM job_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// worker availability

pub async fn get_worker_availability(
    pool: &SqlitePool,
    worker_id: &str,
) -> Result<Vec<WorkerAvailability>, AppError> {
    let rows: Vec<AvailabilityRow> = sqlx::query_as(
        "SELECT id, worker_id, day, hour, priority FROM worker_availabilities
         WHERE worker_id = ? ORDER BY day, hour",
    )
    .bind(worker_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().filter_map(AvailabilityRow::to_record).collect())
}

/// Replaces everything the worker declared: delete all, then insert one
/// record per hour, in one transaction. Overlapping slots keep the stronger
/// preference.
pub async fn replace_worker_availability(
    pool: &SqlitePool,
    worker_id: &str,
    slots: &[TimeSlot],
) -> Result<Vec<WorkerAvailability>, AppError> {
    let records = availability::expand_unique(slots);
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM worker_availabilities WHERE worker_id = ?")
        .bind(worker_id)
        .execute(&mut *tx)
        .await?;
    for record in &records {
        sqlx::query(
            "INSERT INTO worker_availabilities (id, worker_id, day, hour, priority)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(nanoid!(10))
        .bind(worker_id)
        .bind(record.day.index() as i64)
        .bind(record.hour as i64)
        .bind(u8::from(record.priority) as i64)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(records)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrate(&pool).await.expect("schema");
    pool
}
