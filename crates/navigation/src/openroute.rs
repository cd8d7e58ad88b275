//! OpenRouteService directions

use std::time::Duration;

use async_trait::async_trait;
use dwani_config::NavigationSettings;
use dwani_core::{Coordinates, Error, Result, RouteProfile, Router};
use reqwest::Client;
use serde_json::{json, Value};

use crate::http_error;

pub struct OpenRouteServiceRouter {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenRouteServiceRouter {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_settings(settings: &NavigationSettings) -> Result<Self> {
        Self::new(
            settings.router_endpoint.clone(),
            settings.router_api_key.clone(),
            Duration::from_secs(settings.router_timeout_secs),
        )
    }

    fn directions_url(&self, profile: RouteProfile) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), profile.as_str())
    }
}

#[async_trait]
impl Router for OpenRouteServiceRouter {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: RouteProfile,
    ) -> Result<Option<Value>> {
        if self.api_key.is_empty() {
            return Err(Error::unavailable("router", "OpenRouteService API key not configured"));
        }

        let body = json!({ "coordinates": [origin.as_pair(), destination.as_pair()] });

        let response = self
            .client
            .post(self.directions_url(profile))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http_error("router", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Routing(format!("HTTP {}: {}", status, error_text)));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Routing(e.to_string()))?;

        let has_routes = data
            .get("routes")
            .and_then(Value::as_array)
            .map(|r| !r.is_empty())
            .unwrap_or(false);

        Ok(has_routes.then_some(data))
    }
}
