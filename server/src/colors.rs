// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{TaskStatus, STATUS_OPTIONS};
use serde::Serialize;

/// A status option together with the color used to draw it in charts and badges.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusColor {
    pub status: TaskStatus,
    pub color: &'static str,
}

/// Chart color of a status.
pub fn color_for(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Success => "#22c55e", // Green
        TaskStatus::High => "#eab308",    // Yellow
        TaskStatus::Medium => "#3b82f6",  // Blue
        TaskStatus::Low => "#6b7280",     // Grey
        TaskStatus::Failed => "#ef4444",  // Red
    }
}

/// Every status option in display order with its color.
pub fn status_palette() -> Vec<StatusColor> {
    STATUS_OPTIONS
        .into_iter()
        .map(|status| StatusColor {
            status,
            color: color_for(status),
        })
        .collect()
}
