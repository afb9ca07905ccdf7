pub mod openmeteo;

pub use openmeteo::{
    CacheKey, FetchCache, FetchError, FetchedForecast, ForecastRequest, GeocodingClient, Location,
    OpenMeteoClient,
};
