use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A geographic coordinate pair.
///
/// Latitude is expected in [-90, 90] and longitude in [-180, 180];
/// enforcing those ranges is the job of whatever validates requests
/// upstream of this crate. Equality is plain value equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Cache key for a reading stored at this point, e.g. `weather:40.7128:-74.006`.
    ///
    /// Uses the decimal text form of the coordinates as supplied, so keys stay
    /// human-readable for anyone inspecting the cache directly.
    pub fn cache_key(&self) -> String {
        format!("weather:{}:{}", self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A single parsed weather observation for a point in time.
///
/// Produced only by [`crate::parse::parse_payload`]; immutable afterwards.
/// `condition_ids` and `condition_descriptions` are index-aligned: entry `i`
/// of each describes the same condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub latitude: f64,
    pub longitude: f64,
    pub condition_ids: Vec<i32>,
    pub condition_descriptions: Vec<String>,
    pub temperature_c: f64,
    pub humidity_pct: i32,
    pub wind_speed_mps: f64,
    pub cloudiness_pct: i32,
    /// Sunrise in local wall-clock time (system time zone, not UTC).
    pub sunrise: NaiveDateTime,
    /// Sunset in local wall-clock time (system time zone, not UTC).
    pub sunset: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_point_equality_by_value() {
        let a = Point::new(40.7128, -74.006);
        let b = Point::new(40.7128, -74.006);
        assert_eq!(a, b);
        assert_ne!(a, Point::new(40.7128, -74.0061));
    }

    #[test]
    fn test_cache_key_uses_supplied_decimal_form() {
        let p = Point::new(40.7128, -74.006);
        assert_eq!(p.cache_key(), "weather:40.7128:-74.006");
    }

    #[test]
    fn test_cache_key_integral_coordinates() {
        let p = Point::new(40.0, 50.0);
        assert_eq!(p.cache_key(), "weather:40:50");
    }
}
