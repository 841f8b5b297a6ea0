// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{DateRange, StatusRecord, Task, TrackerError};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, TrackerError>;

/// Persistence collaborator behind the task registry and the status store.
///
/// Implementations only store and fetch; validation, identity checks and
/// timestamps are handled by the callers in `registry` and `status`.
#[async_trait]
pub trait Repository: Send + Sync {
    /// All tasks, newest first.
    async fn list_tasks(&self) -> RepoResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid) -> RepoResult<Option<Task>>;

    async fn insert_task(&self, task: &Task) -> RepoResult<()>;

    /// Overwrites title and description. Returns false if the task is unknown.
    async fn update_task(&self, task: &Task) -> RepoResult<bool>;

    /// Removes the task together with its whole status history.
    /// Returns false if the task was already absent.
    async fn delete_task(&self, id: Uuid) -> RepoResult<bool>;

    async fn find_record(&self, task_id: Uuid, date: NaiveDate)
    -> RepoResult<Option<StatusRecord>>;

    /// Atomically inserts `record`, or, when a record already exists for the
    /// same `(task_id, date)`, replaces its status, `user_id` and `updated_at`
    /// while keeping its id and `created_at`. Returns the stored record.
    async fn upsert_record(&self, record: &StatusRecord) -> RepoResult<StatusRecord>;

    async fn records_for_date(&self, date: NaiveDate) -> RepoResult<Vec<StatusRecord>>;

    /// History of one task within `range`, newest first.
    async fn records_for_task(
        &self,
        task_id: Uuid,
        range: DateRange,
    ) -> RepoResult<Vec<StatusRecord>>;

    /// Every record, newest first.
    async fn all_records(&self) -> RepoResult<Vec<StatusRecord>>;

    /// Returns false if the record was already absent.
    async fn delete_record(&self, id: Uuid) -> RepoResult<bool>;
}
