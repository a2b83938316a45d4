//! Offline deployment-frequency report over the ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::application::repos::{DeploymentsRepo, RepoError};
use crate::domain::entities::DeploymentRecord;

/// Longest window a report may cover.
pub const MAX_REPORT_DAYS: u32 = 3650;

/// Number of trailing days compared against the days before them.
const TREND_WEEK: usize = 7;
/// Relative change, in percent, beyond which a trend is no longer stable.
const TREND_THRESHOLD_PERCENT: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report window must span 1 to {MAX_REPORT_DAYS} days, got {days}")]
    InvalidWindow { days: u32 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Elite,
    High,
    Medium,
    Low,
}

impl PerformanceLevel {
    /// Elite deploys at least daily, high at least weekly, medium at least monthly.
    pub fn from_daily_average(daily_average: f64) -> Self {
        if daily_average >= 1.0 {
            PerformanceLevel::Elite
        } else if daily_average >= 1.0 / 7.0 {
            PerformanceLevel::High
        } else if daily_average >= 1.0 / 30.0 {
            PerformanceLevel::Medium
        } else {
            PerformanceLevel::Low
        }
    }
}

/// Direction of deployment frequency over the most recent week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
    NoData,
}

impl Trend {
    /// `daily_counts` holds one entry per day that saw a deployment, oldest first.
    ///
    /// The mean of the last seven entries is compared with the mean of up to
    /// seven entries before them.
    pub fn from_daily_counts(daily_counts: &[u64]) -> Self {
        if daily_counts.is_empty() {
            return Trend::NoData;
        }
        if daily_counts.len() < TREND_WEEK {
            return Trend::InsufficientData;
        }

        let split = daily_counts.len() - TREND_WEEK;
        let previous = &daily_counts[split.saturating_sub(TREND_WEEK)..split];
        if previous.is_empty() {
            return Trend::Stable;
        }
        let last_week = mean(&daily_counts[split..]);
        let previous_week = mean(previous);

        if previous_week == 0.0 {
            return if last_week > 0.0 {
                Trend::Increasing
            } else {
                Trend::Stable
            };
        }

        let change_percent = (last_week - previous_week) / previous_week * 100.0;
        if change_percent > TREND_THRESHOLD_PERCENT {
            Trend::Increasing
        } else if change_percent < -TREND_THRESHOLD_PERCENT {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

fn mean(values: &[u64]) -> f64 {
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyReport {
    #[serde(with = "time::serde::rfc3339")]
    pub period_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub period_end: OffsetDateTime,
    pub days: u32,
    pub environments: Vec<String>,
    pub total_deployments: u64,
    pub daily_average: f64,
    pub by_environment: BTreeMap<String, u64>,
    pub by_service: BTreeMap<String, u64>,
    pub performance_level: PerformanceLevel,
    pub trend: Trend,
    /// Deployments per UTC day (`YYYY-MM-DD`), days without deployments omitted.
    pub daily_breakdown: BTreeMap<String, u64>,
    pub mean_duration_seconds: Option<f64>,
}

/// First instant of the `days`-long window ending at `end`.
pub fn window_start(end: OffsetDateTime, days: u32) -> Result<OffsetDateTime, ReportError> {
    if days == 0 || days > MAX_REPORT_DAYS {
        return Err(ReportError::InvalidWindow { days });
    }
    end.checked_sub(Duration::days(i64::from(days)))
        .ok_or(ReportError::InvalidWindow { days })
}

/// Aggregate `records` that fall in `[end - days, end)`.
///
/// An empty `environments` slice keeps every environment.
pub fn summarize(
    records: &[DeploymentRecord],
    end: OffsetDateTime,
    days: u32,
    environments: &[String],
) -> Result<FrequencyReport, ReportError> {
    let start = window_start(end, days)?;
    let mut by_environment = BTreeMap::new();
    let mut by_service = BTreeMap::new();
    let mut daily_breakdown = BTreeMap::new();
    let mut total = 0u64;
    let mut durations = Vec::new();

    for record in records {
        let instant = record.completed_at.unwrap_or(record.recorded_at);
        if instant < start || instant >= end {
            continue;
        }
        if !environments.is_empty() && !environments.contains(&record.environment) {
            continue;
        }

        total += 1;
        *by_environment
            .entry(record.environment.clone())
            .or_insert(0u64) += 1;
        *by_service
            .entry(record.service_name.clone())
            .or_insert(0u64) += 1;
        *daily_breakdown
            .entry(instant.to_offset(UtcOffset::UTC).date().to_string())
            .or_insert(0u64) += 1;
        if let Some(duration) = record.duration_seconds {
            durations.push(duration);
        }
    }

    let daily_average = round_two(total as f64 / f64::from(days));
    let mean_duration_seconds = if durations.is_empty() {
        None
    } else {
        Some(round_two(
            durations.iter().sum::<f64>() / durations.len() as f64,
        ))
    };

    let daily_counts: Vec<u64> = daily_breakdown.values().copied().collect();

    Ok(FrequencyReport {
        period_start: start,
        period_end: end,
        days,
        environments: environments.to_vec(),
        total_deployments: total,
        daily_average,
        by_environment,
        by_service,
        performance_level: PerformanceLevel::from_daily_average(daily_average),
        trend: Trend::from_daily_counts(&daily_counts),
        daily_breakdown,
        mean_duration_seconds,
    })
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct ReportService {
    repo: Arc<dyn DeploymentsRepo>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn DeploymentsRepo>) -> Self {
        Self { repo }
    }

    pub async fn deployment_frequency(
        &self,
        end: OffsetDateTime,
        days: u32,
        environments: &[String],
    ) -> Result<FrequencyReport, ReportError> {
        let start = window_start(end, days)?;
        let records = self.repo.list_between(start, end).await?;
        summarize(&records, end, days, environments)
    }
}
