//! Strict decoder for the JSON conditions API.
//!
//! Unlike the report parser nothing here is optional: a missing key or a value
//! of the wrong JSON type rejects the whole payload.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::Deserialize;
use serde_json::error::Category;
use thiserror::Error;

use crate::model::{WeatherRecord, floor_to_i32};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("Missing key `{key}`")]
    Missing { key: String },

    #[error("Key `{key}` has the wrong type: {reason}")]
    Type { key: String, reason: String },

    #[error("Key `{key}` has an unusable value: {reason}")]
    Invalid { key: String, reason: String },
}

/// Location block of the payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisplayLocation {
    pub city: String,
    pub state: String,
}

/// The `current_observation` object, field types exactly as the API sends them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiPayload {
    pub display_location: DisplayLocation,
    pub observation_time: String,
    pub observation_time_rfc822: String,
    pub weather: String,
    pub temp_f: f64,
    pub temp_c: f64,
    pub relative_humidity: String,
    pub wind_string: String,
    pub wind_dir: String,
    pub wind_degrees: i64,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub dewpoint_string: String,
    pub pressure_mb: String,
    pub pressure_in: String,
    pub visibility_mi: String,
    pub visibility_km: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    current_observation: ApiPayload,
}

const ROOT: &str = "current_observation";

static MISSING_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^missing field `(\w+)`").unwrap());

/// Last `"key":` before a given offset; serde_json reports type errors just past the value.
static OBJECT_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""(\w+)"\s*:"#).unwrap());

/// Decode a conditions payload.
pub fn decode(json: &[u8]) -> Result<ApiPayload, DecodeError> {
    serde_json::from_slice::<Envelope>(json)
        .map(|envelope| envelope.current_observation)
        .map_err(|e| classify(json, e))
}

/// Decode a conditions payload straight into a record.
pub fn decode_record(json: &[u8]) -> Result<WeatherRecord, DecodeError> {
    decode(json)?.into_record()
}

fn classify(json: &[u8], err: serde_json::Error) -> DecodeError {
    if err.classify() != Category::Data {
        return DecodeError::Syntax(err);
    }

    // serde_json appends " at line L column C" to the message
    let message = err.to_string();
    let reason = message
        .rsplit_once(" at line ")
        .map_or(message.as_str(), |(reason, _)| reason)
        .to_string();

    if let Some(caps) = MISSING_FIELD.captures(&reason) {
        return DecodeError::Missing {
            key: key_path(&caps[1]),
        };
    }

    let text = String::from_utf8_lossy(json);
    let offset = byte_offset(&text, err.line(), err.column());
    let key = OBJECT_KEY
        .captures_iter(&text[..offset])
        .last()
        .map_or_else(|| "$".to_string(), |caps| key_path(&caps[1]));

    DecodeError::Type { key, reason }
}

/// Dotted path of a payload field; field names are unique across the nesting levels.
fn key_path(name: &str) -> String {
    match name {
        ROOT => ROOT.to_string(),
        "city" | "state" => format!("{ROOT}.display_location.{name}"),
        _ => format!("{ROOT}.{name}"),
    }
}

fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + column).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl ApiPayload {
    pub fn into_record(self) -> Result<WeatherRecord, DecodeError> {
        let observed = DateTime::parse_from_rfc2822(&self.observation_time_rfc822)
            .map_err(|e| invalid("observation_time_rfc822", e))?;

        let humidity = self
            .relative_humidity
            .trim()
            .trim_end_matches('%')
            .parse::<u8>()
            .map_err(|e| invalid("relative_humidity", e))?;

        let pressure = self
            .pressure_mb
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid("pressure_mb", e))
            .and_then(|v| floor_to_i32(v).ok_or_else(|| invalid("pressure_mb", "out of range")))?;

        let temp_f = floor_to_i32(self.temp_f).ok_or_else(|| invalid("temp_f", "out of range"))?;
        let temp_c = floor_to_i32(self.temp_c).ok_or_else(|| invalid("temp_c", "out of range"))?;

        Ok(WeatherRecord {
            station_place: self.display_location.city,
            station_state: self.display_location.state,
            year: observed.format("%Y").to_string(),
            month: observed.format("%m").to_string(),
            day: observed.format("%d").to_string(),
            hour: observed.format("%H:%M").to_string(),
            wind: self.wind_string,
            visibility: format!("{} mi ({} km)", self.visibility_mi, self.visibility_km),
            sky_condition: self.weather,
            temp_c,
            temp_f,
            dew_point: self.dewpoint_string,
            humidity,
            pressure,
        })
    }
}

fn invalid(key: &str, reason: impl ToString) -> DecodeError {
    DecodeError::Invalid {
        key: key_path(key),
        reason: reason.to_string(),
    }
}
