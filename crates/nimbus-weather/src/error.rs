//! Weather-specific error types.

use thiserror::Error;

/// Errors surfaced by [`crate::resolver::WeatherResolver`].
///
/// Both variants are client-correctable conditions: the upstream had nothing
/// for the requested location, or returned a payload we could not accept.
/// Cache faults are never surfaced here; the cache degrades to a miss.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("No weather data found.")]
    NoDataAvailable,

    #[error("Invalid weather payload: {0}")]
    MalformedInput(#[from] ParseError),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoDataAvailable => {
                "No weather data is available for that location.".to_string()
            }
            Self::MalformedInput(_) => {
                "The weather provider returned data we could not read.".to_string()
            }
        }
    }

    /// Whether the error maps to a client-correctable condition
    /// (an HTTP 400-class response at a service boundary).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NoDataAvailable | Self::MalformedInput(_))
    }
}

/// Why a provider payload failed to parse.
///
/// Callers of the resolver only ever see the collapsed
/// [`WeatherError::MalformedInput`]; the distinction exists for logging and
/// for tests of the parser itself.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input was not syntactically valid JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The input parsed but a field had an unusable shape.
    #[error("unexpected payload shape: {0}")]
    UnexpectedSchema(String),
}
