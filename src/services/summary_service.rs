use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{SummaryReport, TrainingSession};
use crate::services::training_session_service::{StoreError, TrainingSessionStore};

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Invalid month {month}/{year}")]
    InvalidMonth { month: u32, year: i32 },
    #[error("Failed to load training sessions: {0}")]
    Store(#[from] StoreError),
}

/// Sum duration, calories and distance over a set of sessions.
pub fn summarize(sessions: &[TrainingSession]) -> SummaryReport {
    let (total_duration_seconds, total_calories, total_distance_km) = sessions.iter().fold(
        (0_i64, 0_i64, 0.0_f64),
        |(duration, calories, distance), session| {
            (
                duration + i64::from(session.duration_seconds),
                calories + i64::from(session.calories_burned),
                distance + session.distance_km,
            )
        },
    );

    SummaryReport {
        total_duration_seconds,
        total_calories,
        total_distance_km,
        formatted_duration: format_duration(total_duration_seconds),
    }
}

/// Render seconds as `"H Std, M Min, S Sek"`.
pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{} Std, {} Min, {} Sek", hours, minutes, seconds)
}

/// Half-open UTC range `[first day 00:00, first day of next month 00:00)`,
/// covering every moment of the month's last calendar day.
pub fn month_range(month: u32, year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), SummaryError> {
    let invalid = || SummaryError::InvalidMonth { month, year };

    let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    let start = Utc.from_utc_datetime(&first_day.and_hms_opt(0, 0, 0).ok_or_else(invalid)?);
    let end = Utc.from_utc_datetime(&next_month.and_hms_opt(0, 0, 0).ok_or_else(invalid)?);

    Ok((start, end))
}

/// Load a user's sessions for the given month and summarize them.
#[tracing::instrument(skip(store))]
pub async fn monthly_summary(
    store: &dyn TrainingSessionStore,
    user_id: Uuid,
    month: u32,
    year: i32,
) -> Result<SummaryReport, SummaryError> {
    let (start, end) = month_range(month, year)?;
    let sessions = store
        .find_by_user_and_date_range(user_id, start, end)
        .await?;

    tracing::debug!("Summarizing {} sessions", sessions.len());
    Ok(summarize(&sessions))
}
