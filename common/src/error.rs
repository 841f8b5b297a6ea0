// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

/// Errors surfaced by the task registry and the status store.
///
/// Nothing is retried or swallowed; callers decide how to present them.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Empty title, malformed date or other rejected input.
    #[error("{0}")]
    Validation(String),

    /// Unknown task or record id.
    #[error("{0}")]
    NotFound(String),

    /// A write was attempted without an identified actor.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Failure of the underlying store, passed through as-is.
    #[error("Persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn task_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Task with ID {id} not found."))
    }

    pub fn record_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Status record with ID {id} not found."))
    }
}
