//! Canned guidance used when live geocoding or routing is unavailable

use dwani_core::{EmergencyType, SafePlace, TravelOption};
use serde::{Deserialize, Serialize};

pub const PUBLIC_TRANSPORT: &str = "Public Transport";
pub const WALKING: &str = "Walking";
pub const TAXI: &str = "Taxi/Uber";

/// Public transport, walking and taxi options between two places
pub fn static_travel_options(start: &str, end: &str) -> Vec<TravelOption> {
    vec![
        TravelOption::new(
            PUBLIC_TRANSPORT,
            format!(
                "From {start}, find the nearest tram or bus stop using the Rheinbahn app. \
                 Common lines to Düsseldorf HBF include trams 706, 709, or buses 723, 732. \
                 Travel time: ~10-20 minutes. Check real-time schedules via www.rheinbahn.de."
            ),
            "General knowledge of Düsseldorf public transport (Rheinbahn)",
        ),
        TravelOption::new(
            WALKING,
            format!(
                "Walk from {start} to {end}. Use a navigation app to estimate distance and time \
                 (typically 15-30 minutes for 1-2 km). Follow major roads like Königsallee or \
                 Berliner Allee if in central Düsseldorf."
            ),
            "General navigation advice",
        ),
        TravelOption::new(
            TAXI,
            format!(
                "Book a taxi or Uber from {start} to {end}. Travel time: ~10-15 minutes \
                 depending on traffic. Estimated cost: €10-15."
            ),
            "Estimated based on typical taxi fares in Düsseldorf",
        ),
    ]
}

/// Evacuation guidance without a live route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackGuidance {
    pub emergency_type: EmergencyType,
    /// `None` only when the catalog is empty
    pub destination: Option<SafePlace>,
    /// Why the live route could not be produced
    pub reason: String,
    pub options: Vec<TravelOption>,
}

impl FallbackGuidance {
    pub fn new(
        emergency_type: EmergencyType,
        origin: &str,
        destination: Option<SafePlace>,
        reason: impl Into<String>,
    ) -> Self {
        let end = destination
            .as_ref()
            .map(|p| p.address.clone())
            .unwrap_or_else(|| "the nearest emergency shelter".to_string());

        Self {
            emergency_type,
            options: static_travel_options(origin, &end),
            destination,
            reason: reason.into(),
        }
    }

    pub fn voice_instructions(&self) -> String {
        let mut lines = Vec::new();
        match &self.destination {
            Some(place) => {
                lines.push(format!("Live directions are unavailable. Head to {}.", place.name));
                lines.push(format!("Address: {}", place.address));
            }
            None => lines.push(
                "Live directions are unavailable. Move away from the danger and head to the nearest emergency shelter."
                    .to_string(),
            ),
        }

        lines.push(String::new());
        lines.push("Ways to get there:".to_string());
        for option in &self.options {
            lines.push(format!("- {}: {}", option.mode, option.details));
        }

        lines.push(String::new());
        lines.push("If you are in immediate danger, call 112.".to_string());
        lines.join("\n")
    }
}
