//! Evacuation planning for Dwani
//!
//! - `NominatimGeocoder`: OpenStreetMap address lookup
//! - `OpenRouteServiceRouter`: walking/driving directions
//! - `EvacuationPlanner`: safe-place selection, routing, static fallback
//! - `route`: OpenRouteService response parsing

pub mod fallback;
pub mod nominatim;
pub mod openroute;
pub mod planner;
pub mod route;

pub use fallback::{static_travel_options, FallbackGuidance};
pub use nominatim::NominatimGeocoder;
pub use openroute::OpenRouteServiceRouter;
pub use planner::{EvacuationPlan, EvacuationPlanner};
pub use route::{parse_route, ParsedRoute};

/// Map a transport failure onto the shared error taxonomy
pub(crate) fn http_error(capability: &str, err: reqwest::Error) -> dwani_core::Error {
    if err.is_timeout() {
        dwani_core::Error::CapabilityTimeout(capability.to_string())
    } else {
        dwani_core::Error::unavailable(capability, err.to_string())
    }
}
