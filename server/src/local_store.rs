// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{DateRange, StatusKey, StatusRecord, Task, TrackerError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::{RepoResult, Repository};

// On-disk layout of the data file.
#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    tasks: Vec<Task>,
    history: Vec<StatusRecord>,
}

// In-memory state. Status records are indexed by their (task, date) slot,
// which is what keeps them unique.
#[derive(Clone, Default)]
struct LocalState {
    tasks: Vec<Task>,
    records: HashMap<StatusKey, StatusRecord>,
}

impl LocalState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut records = HashMap::with_capacity(snapshot.history.len());
        for record in snapshot.history {
            if let Some(previous) = records.insert(record.key(), record) {
                warn!(
                    "Duplicate status for task {} on {} in data file, keeping the last one.",
                    previous.task_id, previous.date
                );
            }
        }
        Self {
            tasks: snapshot.tasks,
            records,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut history: Vec<StatusRecord> = self.records.values().cloned().collect();
        history.sort_by_key(|record| (record.date, record.task_id));
        Snapshot {
            tasks: self.tasks.clone(),
            history,
        }
    }
}

/// Local backend: the whole store lives in memory behind a lock and is
/// rewritten to a JSON file after every successful write.
pub struct LocalRepository {
    path: PathBuf,
    state: RwLock<LocalState>,
}

impl LocalRepository {
    /// Loads the data file, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read data file {}", path.display()))?;
            let snapshot: Snapshot = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse data file {}", path.display()))?;
            LocalState::from_snapshot(snapshot)
        } else {
            info!("Data file {} not found, starting empty.", path.display());
            LocalState::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Applies `change` to a copy of the state and only swaps it in once the
    // copy has been written to disk. Checks and mutation share the write lock.
    // A rejected change leaves both the state and the file untouched.
    fn write<T>(&self, change: impl FnOnce(&mut LocalState) -> RepoResult<T>) -> RepoResult<T> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let outcome = change(&mut next)?;
        save_snapshot(&self.path, &next.to_snapshot())?;
        *state = next;
        Ok(outcome)
    }
}

fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let data = serde_json::to_string_pretty(snapshot).context("Failed to serialize data file")?;
    fs::write(path, data).with_context(|| format!("Failed to write data file {}", path.display()))?;
    debug!("Saved data file {}", path.display());
    Ok(())
}

fn newest_first(records: &mut [StatusRecord]) {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

#[async_trait]
impl Repository for LocalRepository {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let state = self.state.read();
        let mut tasks: Vec<Task> = state.tasks.iter().rev().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn find_task(&self, id: Uuid) -> RepoResult<Option<Task>> {
        let state = self.state.read();
        Ok(state.tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn insert_task(&self, task: &Task) -> RepoResult<()> {
        self.write(|state| {
            state.tasks.push(task.clone());
            Ok(())
        })
    }

    async fn update_task(&self, task: &Task) -> RepoResult<bool> {
        if self.find_task(task.id).await?.is_none() {
            return Ok(false);
        }

        self.write(|state| {
            let Some(existing) = state.tasks.iter_mut().find(|existing| existing.id == task.id)
            else {
                return Ok(false);
            };
            existing.title = task.title.clone();
            existing.description = task.description.clone();
            Ok(true)
        })
    }

    async fn delete_task(&self, id: Uuid) -> RepoResult<bool> {
        // The read is only a shortcut; presence is checked again under the write lock.
        if self.find_task(id).await?.is_none() {
            return Ok(false);
        }

        let removed_records = self.write(|state| {
            let before = state.tasks.len();
            state.tasks.retain(|task| task.id != id);
            if state.tasks.len() == before {
                return Ok(None);
            }
            let before = state.records.len();
            state.records.retain(|key, _| key.task_id != id);
            Ok(Some(before - state.records.len()))
        })?;

        let Some(removed_records) = removed_records else {
            return Ok(false);
        };
        info!(
            "Deleted task ID: {} and {} status records",
            id, removed_records
        );
        Ok(true)
    }

    async fn find_record(
        &self,
        task_id: Uuid,
        date: NaiveDate,
    ) -> RepoResult<Option<StatusRecord>> {
        let state = self.state.read();
        Ok(state.records.get(&StatusKey::new(task_id, date)).cloned())
    }

    async fn upsert_record(&self, record: &StatusRecord) -> RepoResult<StatusRecord> {
        self.write(|state| {
            if state.tasks.iter().all(|task| task.id != record.task_id) {
                return Err(TrackerError::task_not_found(record.task_id));
            }
            let stored = state
                .records
                .entry(record.key())
                .and_modify(|existing| {
                    existing.status = record.status;
                    existing.user_id = record.user_id.clone();
                    existing.updated_at = record.updated_at;
                })
                .or_insert_with(|| record.clone());
            Ok(stored.clone())
        })
    }

    async fn records_for_date(&self, date: NaiveDate) -> RepoResult<Vec<StatusRecord>> {
        let state = self.state.read();
        Ok(state
            .records
            .values()
            .filter(|record| record.date == date)
            .cloned()
            .collect())
    }

    async fn records_for_task(
        &self,
        task_id: Uuid,
        range: DateRange,
    ) -> RepoResult<Vec<StatusRecord>> {
        let mut records: Vec<StatusRecord> = {
            let state = self.state.read();
            state
                .records
                .values()
                .filter(|record| record.task_id == task_id && range.contains(record.date))
                .cloned()
                .collect()
        };
        newest_first(&mut records);
        Ok(records)
    }

    async fn all_records(&self) -> RepoResult<Vec<StatusRecord>> {
        let mut records: Vec<StatusRecord> = self.state.read().records.values().cloned().collect();
        newest_first(&mut records);
        Ok(records)
    }

    async fn delete_record(&self, id: Uuid) -> RepoResult<bool> {
        if !self.state.read().records.values().any(|record| record.id == id) {
            return Ok(false);
        }

        // Resolved again under the write lock: the slot may have been reused
        // by a newer record since the read above.
        self.write(|state| {
            let key = state
                .records
                .values()
                .find(|record| record.id == id)
                .map(StatusRecord::key);
            Ok(key.and_then(|key| state.records.remove(&key)).is_some())
        })
    }
}
