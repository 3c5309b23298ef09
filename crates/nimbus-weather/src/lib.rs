//! Geospatially-cached weather lookups.
//!
//! A query point is first matched against a radius-searchable in-process
//! cache; on a miss the reading is fetched from the upstream provider,
//! parsed into a canonical [`WeatherReading`], and cached under the query
//! point with a TTL.

pub mod cache;
pub mod client;
pub mod error;
pub mod geo;
pub mod parse;
pub mod resolver;
pub mod types;

pub use cache::GeoCache;
pub use client::{OpenWeatherMapClient, UpstreamClient};
pub use error::{ParseError, WeatherError};
pub use geo::{GeoIndex, GeoMatch};
pub use parse::parse_payload;
pub use resolver::WeatherResolver;
pub use types::{Point, WeatherReading};
