//! Navigation value types shared by the planner, tools and agent

use serde::{Deserialize, Serialize};

/// WGS84 position, longitude first as the routing service expects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `[lon, lat]` pair
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Routing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteProfile {
    #[default]
    FootWalking,
    DrivingCar,
    CyclingRegular,
}

impl RouteProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FootWalking => "foot-walking",
            Self::DrivingCar => "driving-car",
            Self::CyclingRegular => "cycling-regular",
        }
    }
}

/// A curated evacuation destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafePlace {
    /// Catalog key, e.g. `fire_station`
    pub key: String,
    pub name: String,
    pub address: String,
    /// Kind of facility, e.g. `hospital`, `open_space`
    pub category: String,
    /// Rough capacity, e.g. `large`
    pub capacity: String,
    #[serde(default)]
    pub services: Vec<String>,
}

/// One instruction of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// 1-based position in the route
    pub index: usize,
    pub instruction: String,
    /// Metres, rounded
    pub distance_m: u32,
    /// Minutes, one decimal
    pub duration_min: f64,
}

/// A planned route to a safe place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationRoute {
    pub destination: SafePlace,
    pub origin_address: String,
    pub destination_address: String,
    pub steps: Vec<RouteStep>,
    pub total_distance_m: u32,
    pub total_duration_min: f64,
    pub profile: RouteProfile,
}

impl EvacuationRoute {
    /// Route read out as an evacuation alert, listing at most `max_steps`
    /// instructions
    pub fn voice_instructions(&self, max_steps: usize) -> String {
        let mut lines = vec![
            "EMERGENCY EVACUATION ROUTE".to_string(),
            format!("Destination: {}", self.destination.name),
            format!("Address: {}", self.destination_address),
            format!("Type: {}", title_case(&self.destination.category)),
            format!("Total Distance: {} meters", self.total_distance_m),
            format!("Estimated Time: {} minutes", self.total_duration_min),
            String::new(),
            "Step-by-step instructions:".to_string(),
        ];

        for step in self.steps.iter().take(max_steps) {
            lines.push(format!(
                "{}. {} ({} m, ~{} min)",
                step.index, step.instruction, step.distance_m, step.duration_min
            ));
        }

        if self.steps.len() > max_steps {
            lines.push(format!("... and {} more steps", self.steps.len() - max_steps));
        }

        lines.push(String::new());
        lines.push("Follow these directions carefully and stay calm.".to_string());
        lines.join("\n")
    }
}

/// `open_space` -> `Open Space`
fn title_case(value: &str) -> String {
    value
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One way of getting somewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelOption {
    pub mode: String,
    pub details: String,
    pub source: String,
}

impl TravelOption {
    pub fn new(
        mode: impl Into<String>,
        details: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            mode: mode.into(),
            details: details.into(),
            source: source.into(),
        }
    }
}

/// Travel options between two places
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelInformation {
    pub start_location: String,
    pub end_location: String,
    pub options: Vec<TravelOption>,
}
