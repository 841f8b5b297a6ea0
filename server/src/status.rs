// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Status store: one status per task and calendar date.
use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use common::{DailyStatuses, DateRange, HistoryEntry, StatusRecord, TaskStatus, TrackerError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::identity::{self, Actor};
use crate::registry;
use crate::repository::Repository;

/// Records `status` for the task on `date`, replacing any status already
/// recorded for that day. The lookup and the write happen in a single
/// repository call, so concurrent writers cannot create a duplicate.
pub async fn set_status(
    repo: &dyn Repository,
    actor: Option<&Actor>,
    task_id: Uuid,
    date: NaiveDate,
    status: TaskStatus,
) -> Result<StatusRecord, TrackerError> {
    let actor = identity::require(actor)?;
    registry::get_task(repo, task_id).await?;

    let now = Utc::now();
    let candidate = StatusRecord {
        id: Uuid::new_v4(),
        task_id,
        user_id: actor.id().to_string(),
        status,
        date,
        created_at: now,
        updated_at: now,
    };
    let stored = repo.upsert_record(&candidate).await?;

    if stored.id == candidate.id {
        info!("Recorded status {} for task {} on {}.", status, task_id, date);
    } else {
        info!("Replaced status of task {} on {} with {}.", task_id, date, status);
    }
    Ok(stored)
}

/// The record of a task on `date`, if any.
pub async fn get_status_for_date(
    repo: &dyn Repository,
    task_id: Uuid,
    date: NaiveDate,
) -> Result<Option<StatusRecord>, TrackerError> {
    repo.find_record(task_id, date).await
}

/// For every known task, its record on `date` or `None`.
pub async fn get_statuses_for_date(
    repo: &dyn Repository,
    date: NaiveDate,
) -> Result<DailyStatuses, TrackerError> {
    let tasks = repo.list_tasks().await?;
    let mut records: HashMap<Uuid, StatusRecord> = repo
        .records_for_date(date)
        .await?
        .into_iter()
        .map(|record| (record.task_id, record))
        .collect();

    let statuses: DailyStatuses = tasks
        .into_iter()
        .map(|task| (task.id, records.remove(&task.id)))
        .collect();

    debug!("Resolved statuses of {} tasks for {}.", statuses.len(), date);
    Ok(statuses)
}

/// History of one task within `range`, newest first.
pub async fn task_history(
    repo: &dyn Repository,
    task_id: Uuid,
    range: DateRange,
) -> Result<Vec<StatusRecord>, TrackerError> {
    if let (Some(start), Some(end)) = (range.start, range.end) {
        if start > end {
            return Err(TrackerError::Validation(format!(
                "History start date {start} is after end date {end}."
            )));
        }
    }
    registry::get_task(repo, task_id).await?;
    repo.records_for_task(task_id, range).await
}

/// Every record joined with its task, newest first.
pub async fn all_history(repo: &dyn Repository) -> Result<Vec<HistoryEntry>, TrackerError> {
    let tasks: HashMap<Uuid, _> = repo
        .list_tasks()
        .await?
        .into_iter()
        .map(|task| (task.id, task))
        .collect();

    let entries = repo
        .all_records()
        .await?
        .into_iter()
        .filter_map(|record| {
            let task = tasks.get(&record.task_id)?.clone();
            Some(HistoryEntry { record, task })
        })
        .collect();

    Ok(entries)
}

/// Removes a single history record.
pub async fn delete_record(
    repo: &dyn Repository,
    actor: Option<&Actor>,
    id: Uuid,
) -> Result<(), TrackerError> {
    identity::require(actor)?;
    if !repo.delete_record(id).await? {
        return Err(TrackerError::record_not_found(id));
    }

    info!("Status record with ID {} deleted successfully.", id);
    Ok(())
}
