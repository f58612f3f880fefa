use fitness_tracker::models::{DeviceType, ExtractedTrainingData};
use fitness_tracker::services::device_classifier::classify;
use fitness_tracker::services::training_data_extractor::extract;
use fitness_tracker::services::unit_conversion::{average_speed, duration_to_seconds};
use proptest::prelude::*;

proptest! {
    #[test]
    fn extract_never_panics_and_is_pure(text in any::<String>()) {
        prop_assert_eq!(extract(&text), extract(&text));
    }

    #[test]
    fn duration_to_seconds_never_negative(text in any::<String>()) {
        prop_assert!(duration_to_seconds(Some(&text)) >= 0);
    }

    #[test]
    fn well_formed_durations_convert_exactly(minutes in 0i32..600, seconds in 0i32..60) {
        let text = format!("{}:{:02}", minutes, seconds);
        prop_assert_eq!(duration_to_seconds(Some(&text)), minutes * 60 + seconds);
    }

    #[test]
    fn average_speed_is_finite_and_non_negative(
        distance in proptest::option::of(-100.0f64..100.0),
        duration in proptest::option::of("[0-9]{0,3}:[0-9]{0,2}"),
    ) {
        let speed = average_speed(distance, duration.as_deref());
        prop_assert!(speed.is_finite());
        prop_assert!(speed >= 0.0);
    }

    #[test]
    fn labelled_calories_survive_surrounding_noise(
        calories in 0i32..5000,
        prefix in "[a-zA-Z ]{0,30}",
        suffix in "[a-zA-Z ]{0,30}",
    ) {
        let text = format!("{}\nKalorien {}\n{}", prefix, calories, suffix);
        prop_assert_eq!(extract(&text).calories, Some(calories));
    }

    #[test]
    fn floors_always_win_classification(floors in 0i32..500, power in proptest::option::of(0i32..1000)) {
        let data = ExtractedTrainingData {
            floors: Some(floors),
            power_watts: power,
            ..Default::default()
        };
        prop_assert_eq!(classify(&data), DeviceType::Stepper);
    }
}
