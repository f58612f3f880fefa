use crate::models::{DeviceType, ExtractedTrainingData};

/// Infer the machine type from which distinctive metrics were recognized.
///
/// Floors only exist on steppers and power without floors points to a bike.
/// Treadmill is the fallback when neither signal is present, so it also
/// covers readings where no distinguishing label was found at all.
pub fn classify(data: &ExtractedTrainingData) -> DeviceType {
    if data.floors.is_some() {
        DeviceType::Stepper
    } else if data.power_watts.is_some() {
        DeviceType::Bike
    } else {
        DeviceType::Treadmill
    }
}
