// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod date;
pub mod error;
pub mod stats;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::TrackerError;

/// Every status a task can be given for a day, in display order.
pub const STATUS_OPTIONS: [TaskStatus; 5] = [
    TaskStatus::Success,
    TaskStatus::High,
    TaskStatus::Medium,
    TaskStatus::Low,
    TaskStatus::Failed,
];

/// The outcome recorded for a task on one calendar day.
///
/// Stored as text in the database using the variant name, so the JSON and SQL
/// representations are identical (`"Success"`, `"High"`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
pub enum TaskStatus {
    Success,
    High,
    Medium,
    Low,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "Success",
            TaskStatus::High => "High",
            TaskStatus::Medium => "Medium",
            TaskStatus::Low => "Low",
            TaskStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined recurring item to track.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    // Actor that created the task.
    pub user_id: String,

    pub title: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// The recorded outcome for one task on one calendar date.
///
/// At most one record exists per `(task_id, date)`; writing a new status for
/// the same pair replaces `status` and `updated_at` and keeps `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StatusRecord {
    pub id: Uuid,

    pub task_id: Uuid,

    // Actor that last wrote this record.
    pub user_id: String,

    pub status: TaskStatus,

    // Day granularity only, no time-of-day and no timezone.
    pub date: NaiveDate,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn key(&self) -> StatusKey {
        StatusKey::new(self.task_id, self.date)
    }
}

/// Composite lookup key identifying the single status slot of a task on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusKey {
    pub task_id: Uuid,
    pub date: NaiveDate,
}

impl StatusKey {
    pub fn new(task_id: Uuid, date: NaiveDate) -> Self {
        Self { task_id, date }
    }
}

/// A status record joined with the task it belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: StatusRecord,
    pub task: Task,
}

/// Status of every known task on one date. `None` means nothing was recorded.
pub type DailyStatuses = HashMap<Uuid, Option<StatusRecord>>;

/// Inclusive date bounds used when reading the history of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Body of `POST /api/tasks`.
#[derive(Deserialize, Debug)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: Option<String>,
}

/// Body of `PATCH /api/tasks/{id}`. Absent fields are left untouched.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Body of `PUT /api/tasks/{id}/status`.
///
/// `date` is kept as text so that malformed values surface as validation
/// errors; it may carry a time-of-day suffix, which is dropped. When absent,
/// the server uses today's date.
#[derive(Deserialize, Debug)]
pub struct SetStatusPayload {
    pub status: TaskStatus,
    pub date: Option<String>,
}
