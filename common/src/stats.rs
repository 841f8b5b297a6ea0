// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Day and month rollups of status history, shaped for charting.
//!
//! Only dates (and months) that have at least one record produce an entry;
//! empty days are never synthesized.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::MonthKey;
use crate::{StatusRecord, TaskStatus};

/// Number of most recent days kept by [`calculate_daily_stats`].
pub const DAILY_WINDOW: usize = 14;

/// Number of most recent months kept by [`calculate_monthly_stats`].
pub const MONTHLY_WINDOW: usize = 6;

/// Count of records per status on one date.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyStats {
    pub date: NaiveDate,
    #[serde(rename = "Success")]
    pub success: u32,
    #[serde(rename = "High")]
    pub high: u32,
    #[serde(rename = "Medium")]
    pub medium: u32,
    #[serde(rename = "Low")]
    pub low: u32,
    #[serde(rename = "Failed")]
    pub failed: u32,
}

impl DailyStats {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            success: 0,
            high: 0,
            medium: 0,
            low: 0,
            failed: 0,
        }
    }

    fn count(&mut self, status: TaskStatus) {
        let slot = match status {
            TaskStatus::Success => &mut self.success,
            TaskStatus::High => &mut self.high,
            TaskStatus::Medium => &mut self.medium,
            TaskStatus::Low => &mut self.low,
            TaskStatus::Failed => &mut self.failed,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        self.success + self.high + self.medium + self.low + self.failed
    }
}

/// Completion figures for one year-month.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub month: MonthKey,
    pub total_tasks: u32,
    pub successful_tasks: u32,
    /// Percentage of `Success` records, in `[0, 100]`.
    pub completion_rate: f64,
}

/// Figures shown on the statistics summary cards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Records on the most recent day with data.
    pub latest_day_total: u32,
    /// Completion rate of the most recent month with data.
    pub success_rate: f64,
    pub monthly_tasks: u32,
    pub successful_tasks: u32,
}

/// Groups records by calendar date, ascending, keeping the last
/// [`DAILY_WINDOW`] dates.
pub fn calculate_daily_stats<'a, I>(history: I) -> Vec<DailyStats>
where
    I: IntoIterator<Item = &'a StatusRecord>,
{
    let mut days: BTreeMap<NaiveDate, DailyStats> = BTreeMap::new();
    for record in history {
        days.entry(record.date)
            .or_insert_with(|| DailyStats::empty(record.date))
            .count(record.status);
    }

    keep_last(days.into_values().collect(), DAILY_WINDOW)
}

/// Groups records by year-month, ascending, keeping the last
/// [`MONTHLY_WINDOW`] months.
pub fn calculate_monthly_stats<'a, I>(history: I) -> Vec<MonthlyStats>
where
    I: IntoIterator<Item = &'a StatusRecord>,
{
    let mut months: BTreeMap<MonthKey, (u32, u32)> = BTreeMap::new();
    for record in history {
        let (total, successful) = months.entry(MonthKey::of(record.date)).or_default();
        *total += 1;
        if record.status == TaskStatus::Success {
            *successful += 1;
        }
    }

    let stats = months
        .into_iter()
        .map(|(month, (total, successful))| MonthlyStats {
            month,
            total_tasks: total,
            successful_tasks: successful,
            completion_rate: completion_rate(successful, total),
        })
        .collect();

    keep_last(stats, MONTHLY_WINDOW)
}

/// Builds the summary cards from the latest daily and monthly entries.
/// Empty inputs yield zeros.
pub fn summarize(daily: &[DailyStats], monthly: &[MonthlyStats]) -> StatsSummary {
    let mut summary = StatsSummary::default();
    if let Some(day) = daily.last() {
        summary.latest_day_total = day.total();
    }
    if let Some(month) = monthly.last() {
        summary.success_rate = month.completion_rate;
        summary.monthly_tasks = month.total_tasks;
        summary.successful_tasks = month.successful_tasks;
    }
    summary
}

fn completion_rate(successful: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * f64::from(successful) / f64::from(total)
}

fn keep_last<T>(mut items: Vec<T>, window: usize) -> Vec<T> {
    let excess = items.len().saturating_sub(window);
    items.drain(..excess);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Utc};
    use uuid::Uuid;

    fn record(task_id: Uuid, status: TaskStatus, date: NaiveDate) -> StatusRecord {
        let now = Utc::now();
        StatusRecord {
            id: Uuid::new_v4(),
            task_id,
            user_id: "tester".to_string(),
            status,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_stats_counts_per_status_and_date() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // Given out of order on purpose.
        let history = vec![
            record(b, TaskStatus::Success, ymd(2024, 1, 2)),
            record(a, TaskStatus::Success, ymd(2024, 1, 1)),
            record(b, TaskStatus::Low, ymd(2024, 1, 1)),
        ];

        let daily = calculate_daily_stats(&history);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, ymd(2024, 1, 1));
        assert_eq!(daily[0].success, 1);
        assert_eq!(daily[0].low, 1);
        assert_eq!(daily[0].total(), 2);
        assert_eq!(daily[1].date, ymd(2024, 1, 2));
        assert_eq!(daily[1].success, 1);
        assert_eq!(daily[1].total(), 1);
    }

    #[test]
    fn test_daily_stats_does_not_fill_gaps() {
        let a = Uuid::new_v4();
        let history = vec![
            record(a, TaskStatus::High, ymd(2024, 1, 1)),
            record(a, TaskStatus::High, ymd(2024, 1, 10)),
        ];

        let dates: Vec<_> = calculate_daily_stats(&history)
            .iter()
            .map(|day| day.date)
            .collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 10)]);
    }

    #[test]
    fn test_daily_stats_keeps_most_recent_fourteen_days() {
        let a = Uuid::new_v4();
        let start = ymd(2024, 1, 1);
        let history: Vec<_> = (0..100)
            .map(|offset| record(a, TaskStatus::Success, start + Days::new(offset)))
            .collect();

        let daily = calculate_daily_stats(&history);

        assert_eq!(daily.len(), DAILY_WINDOW);
        assert_eq!(daily.first().unwrap().date, start + Days::new(86));
        assert_eq!(daily.last().unwrap().date, start + Days::new(99));
    }

    #[test]
    fn test_monthly_stats_empty_history() {
        assert!(calculate_monthly_stats(&[]).is_empty());
        assert!(calculate_daily_stats(&[]).is_empty());
    }

    #[test]
    fn test_monthly_stats_completion_rate() {
        let a = Uuid::new_v4();
        let history = vec![
            record(a, TaskStatus::Success, ymd(2024, 2, 1)),
            record(a, TaskStatus::Failed, ymd(2024, 2, 2)),
            record(a, TaskStatus::Success, ymd(2024, 2, 3)),
            record(a, TaskStatus::Medium, ymd(2024, 2, 4)),
            record(a, TaskStatus::Failed, ymd(2024, 1, 31)),
        ];

        let monthly = calculate_monthly_stats(&history);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month.to_string(), "2024-01");
        assert_eq!(monthly[0].total_tasks, 1);
        assert_eq!(monthly[0].successful_tasks, 0);
        assert_eq!(monthly[0].completion_rate, 0.0);
        assert_eq!(monthly[1].month.to_string(), "2024-02");
        assert_eq!(monthly[1].total_tasks, 4);
        assert_eq!(monthly[1].successful_tasks, 2);
        assert_eq!(monthly[1].completion_rate, 50.0);
    }

    #[test]
    fn test_monthly_stats_keeps_most_recent_six_months() {
        let a = Uuid::new_v4();
        let history: Vec<_> = (1..=12)
            .map(|month| record(a, TaskStatus::Success, ymd(2023, month, 15)))
            .chain(std::iter::once(record(a, TaskStatus::Low, ymd(2024, 1, 1))))
            .collect();

        let monthly = calculate_monthly_stats(&history);

        assert_eq!(monthly.len(), MONTHLY_WINDOW);
        assert_eq!(monthly[0].month.to_string(), "2023-08");
        assert_eq!(monthly[5].month.to_string(), "2024-01");
        assert!(
            monthly
                .iter()
                .all(|m| (0.0..=100.0).contains(&m.completion_rate))
        );
    }

    #[test]
    fn test_completion_rate_is_zero_without_records() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(3, 3), 100.0);
    }

    #[test]
    fn test_summarize_uses_latest_entries() {
        let a = Uuid::new_v4();
        let history = vec![
            record(a, TaskStatus::Success, ymd(2024, 1, 30)),
            record(a, TaskStatus::Success, ymd(2024, 2, 1)),
            record(Uuid::new_v4(), TaskStatus::Failed, ymd(2024, 2, 1)),
        ];
        let daily = calculate_daily_stats(&history);
        let monthly = calculate_monthly_stats(&history);

        let summary = summarize(&daily, &monthly);

        assert_eq!(summary.latest_day_total, 2);
        assert_eq!(summary.monthly_tasks, 2);
        assert_eq!(summary.successful_tasks, 1);
        assert_eq!(summary.success_rate, 50.0);
    }

    #[test]
    fn test_summarize_empty_is_all_zero() {
        assert_eq!(summarize(&[], &[]), StatsSummary::default());
    }

    #[test]
    fn test_stats_serialize_for_charts() {
        let a = Uuid::new_v4();
        let history = vec![record(a, TaskStatus::Success, ymd(2024, 1, 1))];

        let daily = serde_json::to_value(calculate_daily_stats(&history)).unwrap();
        assert_eq!(daily[0]["date"], "2024-01-01");
        assert_eq!(daily[0]["Success"], 1);
        assert_eq!(daily[0]["Failed"], 0);

        let monthly = serde_json::to_value(calculate_monthly_stats(&history)).unwrap();
        assert_eq!(monthly[0]["month"], "2024-01");
        assert_eq!(monthly[0]["completionRate"], 100.0);
        assert_eq!(monthly[0]["successfulTasks"], 1);
    }
}
