/// Text shown whenever an acquisition cycle fails, and before the first one completes.
pub const NOT_AVAILABLE: &str = "N/A";

/// Canonical observation, produced by either the report parser or the API decoder.
///
/// Text fields keep the source formatting (zero-padded dates, `HH:MM` hour).
/// Descriptive fields missing from a report hold a `<label not found!>` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRecord {
    pub station_place: String,
    pub station_state: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub wind: String,
    pub visibility: String,
    pub sky_condition: String,
    pub temp_c: i32,
    pub temp_f: i32,
    pub dew_point: String,
    pub humidity: u8,
    pub pressure: i32,
}

/// Converts a source temperature to the record's integer convention (floor, not round).
pub(crate) fn floor_to_i32(value: f64) -> Option<i32> {
    let floored = value.floor();
    if floored.is_finite() && floored >= i32::MIN as f64 && floored <= i32::MAX as f64 {
        Some(floored as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_goes_toward_negative_infinity() {
        assert_eq!(floor_to_i32(32.9), Some(32));
        assert_eq!(floor_to_i32(-0.5), Some(-1));
        assert_eq!(floor_to_i32(-7.0), Some(-7));
    }

    #[test]
    fn floor_rejects_non_finite() {
        assert_eq!(floor_to_i32(f64::NAN), None);
        assert_eq!(floor_to_i32(f64::INFINITY), None);
    }
}
