//! Conversions from console display units to the canonical storage units.

/// Convert a displayed `minutes:seconds` duration to seconds.
///
/// Missing, empty or malformed text yields 0 instead of an error. Only the
/// first two colon separated components are read, so an hour component
/// (`"1:02:05"`) is not supported and is read as `1:02`.
pub fn duration_to_seconds(text: Option<&str>) -> i32 {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0;
    };

    let mut parts = text.split(':');
    let (Some(minutes), Some(seconds)) = (parts.next(), parts.next()) else {
        return 0;
    };

    match (minutes.trim().parse::<i32>(), seconds.trim().parse::<i32>()) {
        (Ok(minutes), Ok(seconds)) if minutes >= 0 && seconds >= 0 => minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Average speed in km/h from a distance and a displayed duration, rounded to
/// two decimals. Returns 0 when either input carries no information.
pub fn average_speed(distance_km: Option<f64>, duration: Option<&str>) -> f64 {
    speed_from_seconds(distance_km.unwrap_or(0.0), duration_to_seconds(duration))
}

/// Average speed in km/h from a distance and a duration already in seconds.
pub fn speed_from_seconds(distance_km: f64, duration_seconds: i32) -> f64 {
    if !distance_km.is_finite() || distance_km <= 0.0 || duration_seconds <= 0 {
        return 0.0;
    }

    let hours = f64::from(duration_seconds) / 3600.0;
    round_to_hundredths(distance_km / hours)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
