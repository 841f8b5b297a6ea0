// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::colors::{self, StatusColor};
use crate::identity::MaybeActor;
use crate::routes::AppState;
use crate::{registry, status};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::date::{parse_calendar_date, parse_or_today};
use common::stats::{
    calculate_daily_stats, calculate_monthly_stats, summarize, DailyStats, MonthlyStats,
    StatsSummary,
};
use common::{
    CreateTaskPayload, DailyStatuses, DateRange, HistoryEntry, SetStatusPayload, StatusRecord,
    Task, TrackerError, UpdateTaskPayload,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

/// `?date=` query. Today when absent.
#[derive(Deserialize, Debug, Default)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// `?start=&end=` query, both inclusive and optional.
#[derive(Deserialize, Debug, Default)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    fn to_range(&self) -> Result<DateRange, TrackerError> {
        let parse = |value: &Option<String>| value.as_deref().map(parse_calendar_date).transpose();
        Ok(DateRange {
            start: parse(&self.start)?,
            end: parse(&self.end)?,
        })
    }
}

/// Handler for listing all tasks.
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = registry::list_tasks(state.repo()).await?;
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

/// Handler for creating a new task.
pub async fn create_task(
    State(state): State<AppState>,
    actor: MaybeActor,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    debug!("Received request to create task: {}", payload.title);

    let new_task = registry::create_task(state.repo(), actor.actor(), payload).await?;

    // Return a 201 Created status with the new task as JSON.
    Ok((StatusCode::CREATED, Json(new_task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(registry::get_task(state.repo(), task_id).await?))
}

/// Handler for editing the title and/or description of a task.
pub async fn update_task(
    State(state): State<AppState>,
    actor: MaybeActor,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<Json<Task>, AppError> {
    let task = registry::update_task(state.repo(), actor.actor(), task_id, payload).await?;
    Ok(Json(task))
}

/// Handler for deleting a task by ID. Deleting an absent task also answers 204.
pub async fn delete_task(
    State(state): State<AppState>,
    actor: MaybeActor,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    registry::delete_task(state.repo(), actor.actor(), task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for recording the status of a task on a day (today by default).
pub async fn set_status(
    State(state): State<AppState>,
    actor: MaybeActor,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<SetStatusPayload>,
) -> Result<Json<StatusRecord>, AppError> {
    let date = parse_or_today(payload.date.as_deref())?;
    debug!(
        "Received status {} for task {} on {}",
        payload.status, task_id, date
    );

    let record =
        status::set_status(state.repo(), actor.actor(), task_id, date, payload.status).await?;
    Ok(Json(record))
}

/// Handler returning the record of a task on a day, or `null`.
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Option<StatusRecord>>, AppError> {
    let date = parse_or_today(query.date.as_deref())?;
    let record = status::get_status_for_date(state.repo(), task_id, date).await?;
    Ok(Json(record))
}

pub async fn task_history(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<StatusRecord>>, AppError> {
    let range = query.to_range()?;
    let records = status::task_history(state.repo(), task_id, range).await?;
    Ok(Json(records))
}

/// Handler returning the status of every task on a day.
pub async fn list_statuses(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailyStatuses>, AppError> {
    let date = parse_or_today(query.date.as_deref())?;
    let statuses = status::get_statuses_for_date(state.repo(), date).await?;
    Ok(Json(statuses))
}

pub async fn status_palette() -> Json<Vec<StatusColor>> {
    Json(colors::status_palette())
}

pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let entries = status::all_history(state.repo()).await?;
    info!("Successfully retrieved {} history entries.", entries.len());
    Ok(Json(entries))
}

pub async fn delete_history_record(
    State(state): State<AppState>,
    actor: MaybeActor,
    Path(record_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    status::delete_record(state.repo(), actor.actor(), record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn daily_stats(State(state): State<AppState>) -> Result<Json<Vec<DailyStats>>, AppError> {
    let history = state.repo().all_records().await?;
    Ok(Json(calculate_daily_stats(&history)))
}

pub async fn monthly_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyStats>>, AppError> {
    let history = state.repo().all_records().await?;
    Ok(Json(calculate_monthly_stats(&history)))
}

pub async fn stats_summary(State(state): State<AppState>) -> Result<Json<StatsSummary>, AppError> {
    let history = state.repo().all_records().await?;
    let daily = calculate_daily_stats(&history);
    let monthly = calculate_monthly_stats(&history);
    Ok(Json(summarize(&daily, &monthly)))
}

// --- Custom Error Handling ---

/// Error returned by every handler, rendered as `{ "error": message }`.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Maps the domain errors onto HTTP statuses. Persistence details are
/// logged and replaced by a generic message.
impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, &message),
            TrackerError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, &message),
            TrackerError::NotAuthenticated => Self::new(
                StatusCode::UNAUTHORIZED,
                "Not authenticated: an x-user-id header is required.",
            ),
            TrackerError::Persistence(err) => {
                tracing::error!("Internal server error: {:?}", err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.",
                )
            }
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
