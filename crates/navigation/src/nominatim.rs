//! OpenStreetMap Nominatim geocoder

use std::time::Duration;

use async_trait::async_trait;
use dwani_config::NavigationSettings;
use dwani_core::{Coordinates, Error, Geocoder, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::http_error;

pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(
        endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_settings(settings: &NavigationSettings) -> Result<Self> {
        Self::new(
            settings.geocoder_endpoint.clone(),
            &settings.geocoder_user_agent,
            Duration::from_secs(settings.geocoder_timeout_secs),
        )
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lon: String,
    lat: String,
}

/// First result of a search response, `None` when nothing matched
fn first_match(places: &[Place]) -> Result<Option<Coordinates>> {
    let Some(place) = places.first() else {
        return Ok(None);
    };

    let lon = place.lon.parse::<f64>();
    let lat = place.lat.parse::<f64>();
    match (lon, lat) {
        (Ok(lon), Ok(lat)) => Ok(Some(Coordinates::new(lon, lat))),
        _ => Err(Error::Geocoding(format!(
            "invalid coordinates lon={} lat={}",
            place.lon, place.lat
        ))),
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| http_error("geocoder", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unavailable("geocoder", format!("HTTP {}", status)));
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(e.to_string()))?;

        let result = first_match(&places)?;
        if result.is_none() {
            tracing::info!(address = %address, "Address not found");
        }
        Ok(result)
    }
}
