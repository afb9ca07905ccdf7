use crate::data::{FieldKind, SourceDescriptor, SourceKind};
use crate::provider::openmeteo::types::{FetchedForecast, ForecastResponse};
use crate::provider::openmeteo::FetchError;
use crate::utils::config::FetchConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

/// One forecast fetch: the point, the localization, and the declared sources
/// whose columns the response must be matched against.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub forecast_days: u32,
    pub sources: Vec<SourceDescriptor>,
}

impl ForecastRequest {
    /// Whether this request targets the ensemble endpoint.
    ///
    /// Open-Meteo serves ensembles and deterministic models from different
    /// hosts, so a request is one or the other.
    pub fn is_ensemble(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s.kind, SourceKind::Ensemble { .. }))
    }

    /// Union of requested hourly variables, in the fixed field order.
    pub fn hourly_param(&self) -> String {
        FieldKind::ALL
            .iter()
            .filter(|field| self.sources.iter().any(|s| s.reports(**field)))
            .map(|field| field.wire_name())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Requested model ids, comma separated.
    pub fn models_param(&self) -> String {
        self.sources
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Open-Meteo REST client covering the forecast and ensemble endpoints.
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    ensemble_url: String,
}

impl OpenMeteoClient {
    /// Create new REST client
    pub fn new(forecast_url: String, ensemble_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            forecast_url,
            ensemble_url,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.forecast_endpoint.clone(),
            config.ensemble_endpoint.clone(),
        )
    }

    /// Fetch one dataset and validate it against the request's declared
    /// sources.
    ///
    /// Fails atomically: any HTTP, parse, or schema problem surfaces as a
    /// [`FetchError`] and no partial series escapes.
    pub async fn fetch(&self, request: &ForecastRequest) -> Result<FetchedForecast, FetchError> {
        let endpoint = if request.is_ensemble() {
            &self.ensemble_url
        } else {
            &self.forecast_url
        };

        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut()
            .append_pair("latitude", &request.latitude.to_string())
            .append_pair("longitude", &request.longitude.to_string())
            .append_pair("hourly", &request.hourly_param())
            .append_pair("models", &request.models_param())
            .append_pair("timezone", &request.timezone)
            .append_pair("forecast_days", &request.forecast_days.to_string());

        info!("Fetching forecast: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            error!("Forecast fetch failed with HTTP {}", status);
            return Err(FetchError::Http(status));
        }

        let payload = response.json::<ForecastResponse>().await?;
        let fetched = payload.into_series(request.sources.clone())?;
        info!(
            "Fetched {} hourly rows for {} source(s)",
            fetched.series.len(),
            fetched.series.sources().len()
        );
        Ok(fetched)
    }

    /// Cheap reachability probe against the forecast endpoint.
    pub async fn test_connectivity(&self) -> Result<(), FetchError> {
        let mut url = Url::parse(&self.forecast_url)?;
        url.query_pairs_mut()
            .append_pair("latitude", "0")
            .append_pair("longitude", "0")
            .append_pair("hourly", FieldKind::Temperature.wire_name())
            .append_pair("forecast_days", "1");

        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(FetchError::Http(response.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_model_request() -> ForecastRequest {
        ForecastRequest {
            latitude: -2.5757,
            longitude: 140.5185,
            timezone: "Asia/Jayapura".to_string(),
            forecast_days: 3,
            sources: vec![
                SourceDescriptor::deterministic(
                    "ecmwf_ifs",
                    vec![FieldKind::Temperature, FieldKind::WeatherCode],
                ),
                SourceDescriptor::deterministic(
                    "gfs_seamless",
                    vec![FieldKind::Temperature, FieldKind::Precipitation],
                ),
            ],
        }
    }

    #[test]
    fn test_request_routes_to_forecast_endpoint() {
        assert!(!multi_model_request().is_ensemble());
    }

    #[test]
    fn test_ensemble_request_routes_to_ensemble_endpoint() {
        let request = ForecastRequest {
            sources: vec![SourceDescriptor::ensemble(
                "ecmwf_ifs025_ensemble",
                51,
                vec![FieldKind::Temperature],
            )],
            ..multi_model_request()
        };
        assert!(request.is_ensemble());
    }

    #[test]
    fn test_hourly_param_is_union_in_fixed_order() {
        assert_eq!(
            multi_model_request().hourly_param(),
            "temperature_2m,precipitation,weather_code"
        );
    }

    #[test]
    fn test_models_param_joins_ids() {
        assert_eq!(multi_model_request().models_param(), "ecmwf_ifs,gfs_seamless");
    }

    // Note: fetch tests against a mocked server live in tests/pipeline_integration.rs
}
