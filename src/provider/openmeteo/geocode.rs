use crate::provider::openmeteo::FetchError;
use crate::utils::config::FetchConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;
use url::Url;

/// A resolved place: coordinates plus the timezone the forecast should be
/// localized to. Timezone may be absent for obscure hits; callers fall back
/// to their configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<GeocodeHit>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    name: String,
    latitude: f64,
    longitude: f64,
    timezone: Option<String>,
}

/// Open-Meteo geocoding client: place name in, best-match coordinates out.
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.geocoding_endpoint.clone())
    }

    /// Resolve a place name to its best match.
    ///
    /// An empty result set is a typed [`FetchError::LocationNotFound`], so
    /// the CLI can fall back to its default location instead of aborting.
    pub async fn resolve(&self, name: &str) -> Result<Location, FetchError> {
        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("count", "1")
            .append_pair("language", "en")
            .append_pair("format", "json");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        let payload = response.json::<GeocodeResponse>().await?;
        let hit = payload
            .results
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| FetchError::LocationNotFound(name.to_string()))?;

        info!(
            "Resolved '{}' to {} ({:.4}, {:.4})",
            name, hit.name, hit.latitude, hit.longitude
        );

        Ok(Location {
            name: hit.name,
            latitude: hit.latitude,
            longitude: hit.longitude,
            timezone: hit.timezone,
        })
    }
}
