use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Exercise machine a session was recorded on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Treadmill,
    Bike,
    Stepper,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Treadmill => "treadmill",
            DeviceType::Bike => "bike",
            DeviceType::Stepper => "stepper",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "treadmill" => Some(DeviceType::Treadmill),
            "bike" => Some(DeviceType::Bike),
            "stepper" => Some(DeviceType::Stepper),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HeartRate {
    #[validate(range(min = 0, message = "Heart rate must not be negative"))]
    pub max: i32,
    #[validate(range(min = 0, message = "Heart rate must not be negative"))]
    pub avg: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_seconds: i32,
    pub calories_burned: i32,
    pub distance_km: f64,
    pub avg_speed_kmh: f64,
    /// Floors climbed on a stepper
    pub elevation: i32,
    pub power_watts: i32,
    pub heart_rate: HeartRate,
    pub device: DeviceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A session that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTrainingSession {
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_seconds: i32,
    pub calories_burned: i32,
    pub distance_km: f64,
    pub avg_speed_kmh: f64,
    pub elevation: i32,
    pub power_watts: i32,
    pub heart_rate: HeartRate,
    pub device: DeviceType,
}

/// Manual entry payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTrainingSessionRequest {
    pub date: DateTime<Utc>,
    #[validate(range(min = 0, message = "Duration must not be negative"))]
    pub duration_seconds: i32,
    #[validate(range(min = 0, message = "Calories must not be negative"))]
    pub calories_burned: Option<i32>,
    #[validate(range(min = 0.0, message = "Distance must not be negative"))]
    pub distance_km: Option<f64>,
    #[validate(range(min = 0.0, message = "Average speed must not be negative"))]
    pub avg_speed_kmh: Option<f64>,
    #[validate(range(min = 0, message = "Elevation must not be negative"))]
    pub elevation: Option<i32>,
    #[validate(range(min = 0, message = "Power must not be negative"))]
    pub power_watts: Option<i32>,
    #[validate(nested)]
    pub heart_rate: Option<HeartRate>,
    pub device: DeviceType,
}

impl CreateTrainingSessionRequest {
    /// Fill defaults and derive the average speed when the caller left it out.
    pub fn into_new_session(self, user_id: Uuid) -> CreateTrainingSession {
        let distance_km = self.distance_km.unwrap_or(0.0);
        let avg_speed_kmh = self.avg_speed_kmh.unwrap_or_else(|| {
            crate::services::unit_conversion::speed_from_seconds(distance_km, self.duration_seconds)
        });

        CreateTrainingSession {
            user_id,
            date: self.date,
            duration_seconds: self.duration_seconds,
            calories_burned: self.calories_burned.unwrap_or(0),
            distance_km,
            avg_speed_kmh,
            elevation: self.elevation.unwrap_or(0),
            power_watts: self.power_watts.unwrap_or(0),
            heart_rate: self.heart_rate.unwrap_or_default(),
            device: self.device,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTrainingSession {
    pub date: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "Duration must not be negative"))]
    pub duration_seconds: Option<i32>,
    #[validate(range(min = 0, message = "Calories must not be negative"))]
    pub calories_burned: Option<i32>,
    #[validate(range(min = 0.0, message = "Distance must not be negative"))]
    pub distance_km: Option<f64>,
    #[validate(range(min = 0.0, message = "Average speed must not be negative"))]
    pub avg_speed_kmh: Option<f64>,
    #[validate(range(min = 0, message = "Elevation must not be negative"))]
    pub elevation: Option<i32>,
    #[validate(range(min = 0, message = "Power must not be negative"))]
    pub power_watts: Option<i32>,
    #[validate(nested)]
    pub heart_rate: Option<HeartRate>,
    pub device: Option<DeviceType>,
}

impl UpdateTrainingSession {
    /// Apply the provided fields on top of an existing session.
    pub fn apply_to(&self, session: &mut TrainingSession) {
        if let Some(date) = self.date {
            session.date = date;
        }
        if let Some(duration_seconds) = self.duration_seconds {
            session.duration_seconds = duration_seconds;
        }
        if let Some(calories_burned) = self.calories_burned {
            session.calories_burned = calories_burned;
        }
        if let Some(distance_km) = self.distance_km {
            session.distance_km = distance_km;
        }
        if let Some(avg_speed_kmh) = self.avg_speed_kmh {
            session.avg_speed_kmh = avg_speed_kmh;
        }
        if let Some(elevation) = self.elevation {
            session.elevation = elevation;
        }
        if let Some(power_watts) = self.power_watts {
            session.power_watts = power_watts;
        }
        if let Some(heart_rate) = self.heart_rate {
            session.heart_rate = heart_rate;
        }
        if let Some(device) = self.device {
            session.device = device;
        }
    }
}

/// Monthly totals for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_duration_seconds: i64,
    pub total_calories: i64,
    pub total_distance_km: f64,
    /// `"H Std, M Min, S Sek"`
    pub formatted_duration: String,
}
