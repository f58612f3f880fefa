use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreateTrainingSession, DeviceType, HeartRate, TrainingSession};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unknown device type in stored session: {0}")]
    UnknownDevice(String),
}

/// Persistence for training sessions.
///
/// Date range lookups are half-open: `start <= date < end`.
#[async_trait]
pub trait TrainingSessionStore: Send + Sync {
    async fn save(&self, session: CreateTrainingSession) -> Result<TrainingSession, StoreError>;

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<TrainingSession>, StoreError>;

    /// Newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrainingSession>, StoreError>;

    async fn find_by_user_and_date_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TrainingSession>, StoreError>;

    /// Overwrite the mutable fields of an existing session.
    async fn update(&self, session: &TrainingSession) -> Result<Option<TrainingSession>, StoreError>;

    async fn delete(&self, session_id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Debug, FromRow)]
struct TrainingSessionRow {
    id: Uuid,
    user_id: Uuid,
    date: DateTime<Utc>,
    duration_seconds: i32,
    calories_burned: i32,
    distance_km: f64,
    avg_speed_kmh: f64,
    elevation: i32,
    power_watts: i32,
    max_heart_rate: i32,
    avg_heart_rate: i32,
    device: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TrainingSessionRow {
    fn into_session(self) -> Result<TrainingSession, StoreError> {
        let device = DeviceType::from_str(&self.device)
            .ok_or_else(|| StoreError::UnknownDevice(self.device.clone()))?;

        Ok(TrainingSession {
            id: self.id,
            user_id: self.user_id,
            date: self.date,
            duration_seconds: self.duration_seconds,
            calories_burned: self.calories_burned,
            distance_km: self.distance_km,
            avg_speed_kmh: self.avg_speed_kmh,
            elevation: self.elevation,
            power_watts: self.power_watts,
            heart_rate: HeartRate {
                max: self.max_heart_rate,
                avg: self.avg_heart_rate,
            },
            device,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SESSION_COLUMNS: &str = "id, user_id, date, duration_seconds, calories_burned, distance_km, \
     avg_speed_kmh, elevation, power_watts, max_heart_rate, avg_heart_rate, device, created_at, updated_at";

fn into_sessions(rows: Vec<TrainingSessionRow>) -> Result<Vec<TrainingSession>, StoreError> {
    rows.into_iter().map(TrainingSessionRow::into_session).collect()
}

/// Postgres backed session store
#[derive(Clone)]
pub struct TrainingSessionService {
    db: PgPool,
}

impl TrainingSessionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TrainingSessionStore for TrainingSessionService {
    async fn save(&self, session: CreateTrainingSession) -> Result<TrainingSession, StoreError> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO training_sessions ({SESSION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
             RETURNING {SESSION_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TrainingSessionRow>(&query)
            .bind(Uuid::new_v4())
            .bind(session.user_id)
            .bind(session.date)
            .bind(session.duration_seconds)
            .bind(session.calories_burned)
            .bind(session.distance_km)
            .bind(session.avg_speed_kmh)
            .bind(session.elevation)
            .bind(session.power_watts)
            .bind(session.heart_rate.max)
            .bind(session.heart_rate.avg)
            .bind(session.device.as_str())
            .bind(now)
            .fetch_one(&self.db)
            .await?;

        row.into_session()
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<TrainingSession>, StoreError> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM training_sessions WHERE id = $1");

        let row = sqlx::query_as::<_, TrainingSessionRow>(&query)
            .bind(session_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(TrainingSessionRow::into_session).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrainingSession>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM training_sessions
             WHERE user_id = $1 ORDER BY date DESC LIMIT $2 OFFSET $3"
        );

        let rows = sqlx::query_as::<_, TrainingSessionRow>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        into_sessions(rows)
    }

    async fn find_by_user_and_date_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TrainingSession>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM training_sessions
             WHERE user_id = $1 AND date >= $2 AND date < $3 ORDER BY date ASC"
        );

        let rows = sqlx::query_as::<_, TrainingSessionRow>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;

        into_sessions(rows)
    }

    async fn update(&self, session: &TrainingSession) -> Result<Option<TrainingSession>, StoreError> {
        let query = format!(
            "UPDATE training_sessions
             SET date = $2,
                 duration_seconds = $3,
                 calories_burned = $4,
                 distance_km = $5,
                 avg_speed_kmh = $6,
                 elevation = $7,
                 power_watts = $8,
                 max_heart_rate = $9,
                 avg_heart_rate = $10,
                 device = $11,
                 updated_at = $12
             WHERE id = $1
             RETURNING {SESSION_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TrainingSessionRow>(&query)
            .bind(session.id)
            .bind(session.date)
            .bind(session.duration_seconds)
            .bind(session.calories_burned)
            .bind(session.distance_km)
            .bind(session.avg_speed_kmh)
            .bind(session.elevation)
            .bind(session.power_watts)
            .bind(session.heart_rate.max)
            .bind(session.heart_rate.avg)
            .bind(session.device.as_str())
            .bind(Utc::now())
            .fetch_optional(&self.db)
            .await?;

        row.map(TrainingSessionRow::into_session).transpose()
    }

    async fn delete(&self, session_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM training_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
