//! Geocoding and routing traits

use async_trait::async_trait;

use crate::navigation::{Coordinates, RouteProfile};
use crate::Result;

/// Address to coordinates lookup
#[async_trait]
pub trait Geocoder: Send + Sync + 'static {
    /// `Ok(None)` when the address matched nothing
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;
}

/// Route computation between two points
#[async_trait]
pub trait Router: Send + Sync + 'static {
    /// Raw route document as returned by the routing service, `Ok(None)`
    /// when no route exists
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: RouteProfile,
    ) -> Result<Option<serde_json::Value>>;
}
