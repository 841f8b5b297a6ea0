// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::repository::{RepoResult, Repository};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{DateRange, StatusRecord, Task, TrackerError};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id BLOB PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NULL,
        created_at TIMESTAMP NOT NULL
    );
    CREATE TABLE IF NOT EXISTS task_history (
        id BLOB PRIMARY KEY NOT NULL,
        task_id BLOB NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL,
        date DATE NOT NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        UNIQUE (task_id, date)
    );
    CREATE INDEX IF NOT EXISTS task_history_date ON task_history (date);
"#;

const RECORD_COLUMNS: &str = "id, task_id, user_id, status, date, created_at, updated_at";

/// Establishes the database connection pool.
/// If the database does not exist, it creates it.
/// It also ensures the `tasks` and `task_history` tables exist.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        ensure_database_dir(database_url)?;
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Creates the tables if they are missing.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to create 'tasks' and 'task_history' tables")?;

    info!("'tasks' and 'task_history' tables are ready.");
    Ok(())
}

// `sqlite://database/sqlite.db` needs `database/` to exist before SQLite can create the file.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(':') {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

// SQLITE_CONSTRAINT_FOREIGNKEY
const FOREIGN_KEY_VIOLATION: &str = "787";

fn is_foreign_key_violation(err: &dyn sqlx::error::DatabaseError) -> bool {
    err.is_foreign_key_violation() || err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

/// Hosted backend: tasks and their status history in SQLite.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT id, user_id, title, description, created_at FROM tasks ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to retrieve tasks from DB")?;

        Ok(tasks)
    }

    async fn find_task(&self, id: Uuid) -> RepoResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, user_id, title, description, created_at FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to retrieve task with ID: {id}"))?;

        Ok(task)
    }

    async fn insert_task(&self, task: &Task) -> RepoResult<()> {
        debug!(
            "Insert values: id={}, user_id={}, title={}, description={:?}, created_at={}",
            task.id, task.user_id, task.title, task.description, task.created_at
        );

        sqlx::query(
            "INSERT INTO tasks (id, user_id, title, description, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(task.id)
        .bind(&task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert task into DB")?;

        Ok(())
    }

    async fn update_task(&self, task: &Task) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE tasks SET title = ?, description = ? WHERE id = ?")
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update task with ID: {}", task.id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_task(&self, id: Uuid) -> RepoResult<bool> {
        debug!("Attempting to delete task with ID: {}", id);
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        // Explicit so the cascade does not depend on PRAGMA foreign_keys.
        let history = sqlx::query("DELETE FROM task_history WHERE task_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete history of task with ID: {id}"))?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete task with ID: {id}"))?;

        tx.commit().await.context("Failed to commit task deletion")?;

        info!(
            "Deleted {} task rows and {} history rows for task ID: {}",
            result.rows_affected(),
            history.rows_affected(),
            id
        );
        Ok(result.rows_affected() > 0)
    }

    async fn find_record(
        &self,
        task_id: Uuid,
        date: NaiveDate,
    ) -> RepoResult<Option<StatusRecord>> {
        let record = sqlx::query_as::<_, StatusRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM task_history WHERE task_id = ? AND date = ?"
        ))
        .bind(task_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to retrieve status of task {task_id} on {date}"))?;

        Ok(record)
    }

    async fn upsert_record(&self, record: &StatusRecord) -> RepoResult<StatusRecord> {
        debug!(
            "Upsert values: task_id={}, date={}, status={}, user_id={}",
            record.task_id, record.date, record.status, record.user_id
        );

        let upserted = sqlx::query_as::<_, StatusRecord>(&format!(
            "INSERT INTO task_history ({RECORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (task_id, date) DO UPDATE SET \
                 status = excluded.status, \
                 user_id = excluded.user_id, \
                 updated_at = excluded.updated_at \
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(record.id)
        .bind(record.task_id)
        .bind(&record.user_id)
        .bind(record.status)
        .bind(record.date)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await;

        match upserted {
            Ok(stored) => Ok(stored),
            // The task went away after the caller looked it up.
            Err(sqlx::Error::Database(err)) if is_foreign_key_violation(&*err) => {
                Err(TrackerError::task_not_found(record.task_id))
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context("Failed to upsert status record into DB")
                .into()),
        }
    }

    async fn records_for_date(&self, date: NaiveDate) -> RepoResult<Vec<StatusRecord>> {
        let records = sqlx::query_as::<_, StatusRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM task_history WHERE date = ?"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to retrieve statuses for {date}"))?;

        Ok(records)
    }

    async fn records_for_task(
        &self,
        task_id: Uuid,
        range: DateRange,
    ) -> RepoResult<Vec<StatusRecord>> {
        // NULL bounds leave that side of the range open.
        let records = sqlx::query_as::<_, StatusRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM task_history \
             WHERE task_id = ? \
               AND (? IS NULL OR date >= ?) \
               AND (? IS NULL OR date <= ?) \
             ORDER BY date DESC"
        ))
        .bind(task_id)
        .bind(range.start)
        .bind(range.start)
        .bind(range.end)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to retrieve history of task {task_id}"))?;

        Ok(records)
    }

    async fn all_records(&self) -> RepoResult<Vec<StatusRecord>> {
        let records = sqlx::query_as::<_, StatusRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM task_history ORDER BY date DESC, updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to retrieve status history from DB")?;

        Ok(records)
    }

    async fn delete_record(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM task_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete status record with ID: {id}"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Utc};
    use common::TaskStatus;

    /// Helper function to set up an in-memory SQLite database for testing.
    /// This creates a fresh, empty database for each test, ensuring they are isolated.
    async fn setup_test_repo() -> SqliteRepository {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        SqliteRepository::new(pool)
    }

    fn new_task(title: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: title.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn new_record(task_id: Uuid, status: TaskStatus, date: NaiveDate) -> StatusRecord {
        let now = Utc::now();
        StatusRecord {
            id: Uuid::new_v4(),
            task_id,
            user_id: "user-1".to_string(),
            status,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_task() {
        let repo = setup_test_repo().await;
        let mut task = new_task("Morning Exercise");
        task.description = Some("30 minutes workout".to_string());

        repo.insert_task(&task).await.unwrap();

        let found = repo.find_task(task.id).await.unwrap().unwrap();
        assert_eq!(found.id, task.id);
        assert_eq!(found.title, "Morning Exercise");
        assert_eq!(found.description.as_deref(), Some("30 minutes workout"));
        assert!(repo.find_task(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_tasks_newest_first() {
        let repo = setup_test_repo().await;
        let mut older = new_task("Older");
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = new_task("Newer");
        repo.insert_task(&older).await.unwrap();
        repo.insert_task(&newer).await.unwrap();

        let tasks = repo.list_tasks().await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Newer");
        assert_eq!(tasks[1].title, "Older");
    }

    #[tokio::test]
    async fn test_update_task_reports_unknown_ids() {
        let repo = setup_test_repo().await;
        let mut task = new_task("Read Book");
        repo.insert_task(&task).await.unwrap();

        task.title = "Read two chapters".to_string();
        assert!(repo.update_task(&task).await.unwrap());
        assert_eq!(
            repo.find_task(task.id).await.unwrap().unwrap().title,
            "Read two chapters"
        );

        assert!(!repo.update_task(&new_task("Ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_record_per_task_and_date() {
        let repo = setup_test_repo().await;
        let task = new_task("Meditation");
        repo.insert_task(&task).await.unwrap();
        let date = ymd(2024, 1, 1);

        let first = repo
            .upsert_record(&new_record(task.id, TaskStatus::Success, date))
            .await
            .unwrap();
        let second = repo
            .upsert_record(&new_record(task.id, TaskStatus::Failed, date))
            .await
            .unwrap();

        // The existing row is updated in place.
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, TaskStatus::Failed);
        assert_eq!(second.created_at, first.created_at);

        let history = repo
            .records_for_task(task.id, DateRange::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            repo.find_record(task.id, date).await.unwrap().unwrap().status,
            TaskStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_records_for_task_within_range() {
        let repo = setup_test_repo().await;
        let task = new_task("Meditation");
        repo.insert_task(&task).await.unwrap();
        let start = ymd(2024, 1, 1);
        for offset in 0..5 {
            repo.upsert_record(&new_record(task.id, TaskStatus::Low, start + Days::new(offset)))
                .await
                .unwrap();
        }

        let range = DateRange {
            start: Some(ymd(2024, 1, 2)),
            end: Some(ymd(2024, 1, 4)),
        };
        let records = repo.records_for_task(task.id, range).await.unwrap();

        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 4), ymd(2024, 1, 3), ymd(2024, 1, 2)]);

        let open_start = DateRange {
            start: None,
            end: Some(ymd(2024, 1, 1)),
        };
        assert_eq!(repo.records_for_task(task.id, open_start).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_task_cascades_history() {
        let repo = setup_test_repo().await;
        let kept = new_task("Kept");
        let removed = new_task("Removed");
        repo.insert_task(&kept).await.unwrap();
        repo.insert_task(&removed).await.unwrap();
        let date = ymd(2024, 5, 1);
        repo.upsert_record(&new_record(kept.id, TaskStatus::High, date))
            .await
            .unwrap();
        repo.upsert_record(&new_record(removed.id, TaskStatus::High, date))
            .await
            .unwrap();

        assert!(repo.delete_task(removed.id).await.unwrap());
        // Second delete is a no-op.
        assert!(!repo.delete_task(removed.id).await.unwrap());

        let records = repo.records_for_date(date).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task_id, kept.id);
        assert!(repo.find_record(removed.id, date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_records_and_delete_record() {
        let repo = setup_test_repo().await;
        let task = new_task("Journal");
        repo.insert_task(&task).await.unwrap();
        let older = repo
            .upsert_record(&new_record(task.id, TaskStatus::Medium, ymd(2024, 1, 1)))
            .await
            .unwrap();
        repo.upsert_record(&new_record(task.id, TaskStatus::Success, ymd(2024, 2, 1)))
            .await
            .unwrap();

        let all = repo.all_records().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, ymd(2024, 2, 1));

        assert!(repo.delete_record(older.id).await.unwrap());
        assert!(!repo.delete_record(older.id).await.unwrap());
        assert_eq!(repo.all_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_for_deleted_task_is_not_found() {
        let repo = setup_test_repo().await;
        let task = new_task("Gone");
        repo.insert_task(&task).await.unwrap();
        assert!(repo.find_task(task.id).await.unwrap().is_some());
        repo.delete_task(task.id).await.unwrap();

        let result = repo
            .upsert_record(&new_record(task.id, TaskStatus::Success, ymd(2024, 1, 1)))
            .await;

        assert!(matches!(result, Err(TrackerError::NotFound(_))));
        assert!(repo.all_records().await.unwrap().is_empty());
    }

    #[test]
    fn test_ensure_database_dir_skips_memory_urls() {
        assert!(ensure_database_dir("sqlite::memory:").is_ok());
        assert!(ensure_database_dir("sqlite://:memory:").is_ok());
    }
}
