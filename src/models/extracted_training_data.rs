use serde::{Deserialize, Serialize};

/// Metrics recognized on a machine console photo.
///
/// Every field is optional: `None` means the corresponding pattern did not
/// match the recognized text, not that the machine displayed zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTrainingData {
    /// Raw `minutes:seconds` text as displayed, e.g. `"26:41"`
    pub duration: Option<String>,
    pub calories: Option<i32>,
    pub distance_km: Option<f64>,
    pub floors: Option<i32>,
    pub max_heart_rate: Option<i32>,
    pub avg_heart_rate: Option<i32>,
    pub power_watts: Option<i32>,
}

impl ExtractedTrainingData {
    /// True when none of duration, calories or distance were recognized.
    pub fn lacks_core_metrics(&self) -> bool {
        self.duration.is_none() && self.calories.is_none() && self.distance_km.is_none()
    }
}
