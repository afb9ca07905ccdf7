//! Open-Meteo fetch collaborators: forecast and ensemble REST clients,
//! geocoding, and the TTL snapshot cache.
//!
//! This layer owns all wire concerns - endpoint URLs, column naming, response
//! shapes - and hands the core a validated [`crate::data::RawSeries`]. The
//! core never sees HTTP.

pub mod cache;
pub mod geocode;
pub mod rest;
pub mod types;

use crate::data::SeriesError;
use thiserror::Error;

pub use cache::{CacheKey, FetchCache};
pub use geocode::{GeocodingClient, Location};
pub use rest::{ForecastRequest, OpenMeteoClient};
pub use types::{FetchedForecast, ForecastResponse, HourlyBlock};

/// Errors from the fetch layer. A failed fetch fails the whole pipeline run
/// atomically - no partial bucket list is ever produced from a bad response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx HTTP response from the upstream API.
    #[error("HTTP status {0}")]
    Http(u16),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response parsed but carries no hourly block at all.
    #[error("source data unavailable: response carries no hourly series")]
    MissingSeries,

    #[error("malformed timestamp '{0}' in response")]
    MalformedTimestamp(String),

    #[error("invalid series data: {0}")]
    Series(#[from] SeriesError),

    #[error("location not found: '{0}'")]
    LocationNotFound(String),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}
