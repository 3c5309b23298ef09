//! Parsing of raw provider payloads into canonical readings.
//!
//! The extraction policy is deliberately permissive about *absence*: a
//! numeric field or whole section missing from the payload reads as zero
//! (empty for the condition list), so partial upstream payloads degrade
//! gracefully instead of rejecting the reading. A field that is present
//! with the wrong type is a schema error.

use chrono::{Local, NaiveDateTime, TimeZone};
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::WeatherReading;

/// Parse a raw OpenWeatherMap current-weather payload.
///
/// Fails with [`ParseError::Malformed`] when the input is not valid JSON and
/// with [`ParseError::UnexpectedSchema`] when it parses but a field has an
/// unusable shape.
pub fn parse_payload(raw: &str) -> Result<WeatherReading, ParseError> {
    let root: Value = serde_json::from_str(raw)?;
    let Value::Object(root) = root else {
        return Err(schema("payload root is not an object"));
    };

    let coord = section(&root, "coord")?;
    let latitude = f64_field(coord, "coord", "lat")?;
    let longitude = f64_field(coord, "coord", "lon")?;

    let (condition_ids, condition_descriptions) = conditions(&root)?;

    let main = section(&root, "main")?;
    let temperature_c = f64_field(main, "main", "temp")?;
    let humidity_pct = i32_field(main, "main", "humidity")?;

    let wind = section(&root, "wind")?;
    let wind_speed_mps = f64_field(wind, "wind", "speed")?;

    let clouds = section(&root, "clouds")?;
    let cloudiness_pct = i32_field(clouds, "clouds", "all")?;

    let sys = section(&root, "sys")?;
    let sunrise = local_wall_clock(i64_field(sys, "sys", "sunrise")?, "sunrise")?;
    let sunset = local_wall_clock(i64_field(sys, "sys", "sunset")?, "sunset")?;

    Ok(WeatherReading {
        latitude,
        longitude,
        condition_ids,
        condition_descriptions,
        temperature_c,
        humidity_pct,
        wind_speed_mps,
        cloudiness_pct,
        sunrise,
        sunset,
    })
}

fn schema(message: impl Into<String>) -> ParseError {
    ParseError::UnexpectedSchema(message.into())
}

/// A nested object section. Absent reads as `None`; present-but-not-an-object
/// is a schema error.
fn section<'a>(
    root: &'a Map<String, Value>,
    name: &str,
) -> Result<Option<&'a Map<String, Value>>, ParseError> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(schema(format!("'{name}' is not an object"))),
    }
}

fn f64_field(
    section: Option<&Map<String, Value>>,
    section_name: &str,
    field: &str,
) -> Result<f64, ParseError> {
    match section.and_then(|s| s.get(field)) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| schema(format!("'{section_name}.{field}' is not a number"))),
    }
}

fn i32_field(
    section: Option<&Map<String, Value>>,
    section_name: &str,
    field: &str,
) -> Result<i32, ParseError> {
    i64_field(section, section_name, field).and_then(|v| {
        i32::try_from(v)
            .map_err(|_| schema(format!("'{section_name}.{field}' is out of range")))
    })
}

fn i64_field(
    section: Option<&Map<String, Value>>,
    section_name: &str,
    field: &str,
) -> Result<i64, ParseError> {
    match section.and_then(|s| s.get(field)) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| schema(format!("'{section_name}.{field}' is not an integer"))),
    }
}

/// One (id, description) pair per condition entry, order preserved so the two
/// sequences stay index-aligned.
fn conditions(root: &Map<String, Value>) -> Result<(Vec<i32>, Vec<String>), ParseError> {
    let items = match root.get("weather") {
        None | Some(Value::Null) => return Ok((Vec::new(), Vec::new())),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(schema("'weather' is not an array")),
    };

    let mut ids = Vec::with_capacity(items.len());
    let mut descriptions = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Value::Object(entry) = item else {
            return Err(schema(format!("'weather[{i}]' is not an object")));
        };

        let id = match entry.get("id") {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| schema(format!("'weather[{i}].id' is not an integer")))?,
        };

        let description = match entry.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(schema(format!("'weather[{i}].description' is not a string"))),
        };

        ids.push(id);
        descriptions.push(description);
    }

    Ok((ids, descriptions))
}

/// Convert epoch seconds to local wall-clock time.
///
/// Uses the system time zone, not UTC: two deployments in different zones
/// will display different wall-clock sunrise/sunset for the identical
/// reading.
fn local_wall_clock(epoch_secs: i64, field: &str) -> Result<NaiveDateTime, ParseError> {
    match Local.timestamp_opt(epoch_secs, 0) {
        chrono::LocalResult::Single(dt) => Ok(dt.naive_local()),
        chrono::LocalResult::Ambiguous(dt, _) => Ok(dt.naive_local()),
        chrono::LocalResult::None => Err(schema(format!("'sys.{field}' is out of range"))),
    }
}
