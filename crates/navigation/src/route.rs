//! OpenRouteService response parsing

use dwani_core::{Error, Result, RouteStep};
use serde::Deserialize;
use serde_json::Value;

/// Steps and totals of the first route in a directions response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoute {
    pub steps: Vec<RouteStep>,
    pub total_distance_m: u32,
    pub total_duration_min: f64,
}

#[derive(Debug, Deserialize)]
struct Directions {
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    summary: Summary,
    #[serde(default)]
    segments: Vec<Segment>,
}

/// ORS omits zero-valued fields
#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

fn meters(value: f64) -> u32 {
    value.max(0.0).round() as u32
}

/// Seconds to minutes, one decimal
fn minutes(seconds: f64) -> f64 {
    (seconds.max(0.0) / 60.0 * 10.0).round() / 10.0
}

/// Parse a directions response into ordered, rounded steps
pub fn parse_route(data: &Value) -> Result<ParsedRoute> {
    let directions = Directions::deserialize(data)
        .map_err(|e| Error::Routing(format!("unexpected directions payload: {}", e)))?;

    let route = directions
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| Error::Routing("no route returned".to_string()))?;

    let steps = route
        .segments
        .into_iter()
        .next()
        .map(|segment| segment.steps)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, step)| RouteStep {
            index: i + 1,
            instruction: step.instruction,
            distance_m: meters(step.distance),
            duration_min: minutes(step.duration),
        })
        .collect();

    Ok(ParsedRoute {
        steps,
        total_distance_m: meters(route.summary.distance),
        total_duration_min: minutes(route.summary.duration),
    })
}
