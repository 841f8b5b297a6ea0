// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Task registry: create, edit, list and delete task definitions.
use chrono::Utc;
use common::{CreateTaskPayload, Task, TrackerError, UpdateTaskPayload};
use tracing::{debug, info};
use uuid::Uuid;

use crate::identity::{self, Actor};
use crate::repository::Repository;

/// All tasks, newest first.
pub async fn list_tasks(repo: &dyn Repository) -> Result<Vec<Task>, TrackerError> {
    repo.list_tasks().await
}

pub async fn get_task(repo: &dyn Repository, id: Uuid) -> Result<Task, TrackerError> {
    repo.find_task(id)
        .await?
        .ok_or_else(|| TrackerError::task_not_found(id))
}

/// Creates a task owned by `actor`. The title is stored trimmed.
pub async fn create_task(
    repo: &dyn Repository,
    actor: Option<&Actor>,
    payload: CreateTaskPayload,
) -> Result<Task, TrackerError> {
    let actor = identity::require(actor)?;
    let title = validate_title(&payload.title)?;

    let task = Task {
        id: Uuid::new_v4(),
        user_id: actor.id().to_string(),
        title,
        description: normalize_description(payload.description),
        created_at: Utc::now(),
    };
    repo.insert_task(&task).await?;

    info!("Task created successfully with ID: {}", task.id);
    Ok(task)
}

/// Applies the fields present in `payload` and returns the updated task.
/// An empty description clears it.
pub async fn update_task(
    repo: &dyn Repository,
    actor: Option<&Actor>,
    id: Uuid,
    payload: UpdateTaskPayload,
) -> Result<Task, TrackerError> {
    identity::require(actor)?;
    let mut task = get_task(repo, id).await?;

    if let Some(title) = payload.title {
        task.title = validate_title(&title)?;
    }
    if let Some(description) = payload.description {
        task.description = normalize_description(Some(description));
    }

    if !repo.update_task(&task).await? {
        // Deleted between the lookup and the write.
        return Err(TrackerError::task_not_found(id));
    }

    info!("Task with ID {} updated successfully.", id);
    Ok(task)
}

/// Deletes a task and its whole status history.
/// Deleting an unknown id is a no-op; the return value tells whether anything was removed.
pub async fn delete_task(
    repo: &dyn Repository,
    actor: Option<&Actor>,
    id: Uuid,
) -> Result<bool, TrackerError> {
    identity::require(actor)?;
    debug!("Attempting to delete task with ID: {}", id);

    let deleted = repo.delete_task(id).await?;
    if deleted {
        info!("Task with ID {} deleted successfully.", id);
    } else {
        debug!("Task with ID {} was already absent.", id);
    }
    Ok(deleted)
}

fn validate_title(title: &str) -> Result<String, TrackerError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::Validation(
            "Task title cannot be empty.".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
