//! Evacuation planner
//!
//! Picks a safe place for the emergency type, geocodes both ends and asks
//! the router for a walking route. [`EvacuationPlanner::plan`] never fails:
//! any geocoding or routing problem degrades to [`FallbackGuidance`].

use std::sync::Arc;
use std::time::Duration;

use dwani_config::constants::timeouts;
use dwani_config::SafePlaceCatalog;
use dwani_core::capability::guard;
use dwani_core::{
    Coordinates, EmergencyType, Error, EvacuationRoute, Geocoder, Result, RouteProfile, Router,
    SafePlace, TravelInformation, TravelOption,
};
use serde::{Deserialize, Serialize};

use crate::fallback::{self, FallbackGuidance};
use crate::route::{parse_route, ParsedRoute};

/// Outcome of evacuation planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvacuationPlan {
    Route(EvacuationRoute),
    Fallback(FallbackGuidance),
}

impl EvacuationPlan {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Route(_))
    }

    pub fn destination(&self) -> Option<&SafePlace> {
        match self {
            Self::Route(route) => Some(&route.destination),
            Self::Fallback(guidance) => guidance.destination.as_ref(),
        }
    }

    /// Metres to the destination when a live route exists
    pub fn total_distance_m(&self) -> Option<u32> {
        match self {
            Self::Route(route) => Some(route.total_distance_m),
            Self::Fallback(_) => None,
        }
    }

    pub fn voice_instructions(&self, max_steps: usize) -> String {
        match self {
            Self::Route(route) => route.voice_instructions(max_steps),
            Self::Fallback(guidance) => guidance.voice_instructions(),
        }
    }
}

pub struct EvacuationPlanner {
    catalog: Arc<SafePlaceCatalog>,
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn Router>,
    geocoder_timeout: Duration,
    router_timeout: Duration,
    profile: RouteProfile,
}

impl EvacuationPlanner {
    pub fn new(
        catalog: Arc<SafePlaceCatalog>,
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn Router>,
    ) -> Self {
        Self {
            catalog,
            geocoder,
            router,
            geocoder_timeout: Duration::from_secs(timeouts::GEOCODER_SECS),
            router_timeout: Duration::from_secs(timeouts::ROUTER_SECS),
            profile: RouteProfile::FootWalking,
        }
    }

    pub fn with_timeouts(mut self, geocoder: Duration, router: Duration) -> Self {
        self.geocoder_timeout = geocoder;
        self.router_timeout = router;
        self
    }

    pub fn with_profile(mut self, profile: RouteProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn catalog(&self) -> &SafePlaceCatalog {
        &self.catalog
    }

    /// First catalog entry on the priority list for `emergency`
    pub fn select_safe_place(&self, emergency: EmergencyType) -> Result<&SafePlace> {
        self.catalog
            .first_available(emergency)
            .or_else(|| self.catalog.places.values().next())
            .ok_or_else(|| Error::NoSafePlace(emergency.to_string()))
    }

    async fn locate(&self, address: &str) -> Result<Coordinates> {
        let result = guard(
            "geocoder",
            self.geocoder_timeout,
            self.geocoder.geocode(address),
        )
        .await;

        match result {
            Ok(Some(coords)) => Ok(coords),
            Ok(None) => Err(Error::Geocoding(format!("no result for '{}'", address))),
            Err(Error::Geocoding(message)) => Err(Error::Geocoding(message)),
            Err(e) => Err(Error::Geocoding(format!("'{}': {}", address, e))),
        }
    }

    async fn route_between(&self, origin: Coordinates, destination: Coordinates) -> Result<ParsedRoute> {
        let result = guard(
            "router",
            self.router_timeout,
            self.router.route(origin, destination, self.profile),
        )
        .await;

        match result {
            Ok(Some(data)) => parse_route(&data),
            Ok(None) => Err(Error::Routing("no route between the two points".to_string())),
            Err(Error::Routing(message)) => Err(Error::Routing(message)),
            Err(e) => Err(Error::Routing(e.to_string())),
        }
    }

    /// Live route to the safe place for `emergency`
    pub async fn try_plan(&self, current_location: &str, emergency: EmergencyType) -> Result<EvacuationRoute> {
        let place = self.select_safe_place(emergency)?;

        let origin = self.locate(current_location).await?;
        let destination = self.locate(&place.address).await?;
        let route = self.route_between(origin, destination).await?;

        tracing::info!(
            emergency_type = %emergency,
            destination = %place.name,
            distance_m = route.total_distance_m,
            steps = route.steps.len(),
            "Evacuation route planned"
        );

        Ok(EvacuationRoute {
            destination: place.clone(),
            origin_address: current_location.to_string(),
            destination_address: place.address.clone(),
            steps: route.steps,
            total_distance_m: route.total_distance_m,
            total_duration_min: route.total_duration_min,
            profile: self.profile,
        })
    }

    /// Live route, or static guidance when any lookup fails
    pub async fn plan(&self, current_location: &str, emergency: EmergencyType) -> EvacuationPlan {
        match self.try_plan(current_location, emergency).await {
            Ok(route) => EvacuationPlan::Route(route),
            Err(e) => {
                tracing::warn!(
                    emergency_type = %emergency,
                    error = %e,
                    "Live evacuation route unavailable, using static guidance"
                );
                let destination = self.select_safe_place(emergency).ok().cloned();
                EvacuationPlan::Fallback(FallbackGuidance::new(
                    emergency,
                    current_location,
                    destination,
                    e.to_string(),
                ))
            }
        }
    }

    /// Ways to get from `start` to `end`; live walking figures when the
    /// route can be computed, the static table otherwise
    pub async fn travel_information(&self, start: &str, end: &str) -> TravelInformation {
        let options = match self.live_walking(start, end).await {
            Ok(walking) => {
                let mut options = vec![walking];
                options.extend(
                    fallback::static_travel_options(start, end)
                        .into_iter()
                        .filter(|o| o.mode != fallback::WALKING),
                );
                options
            }
            Err(e) => {
                tracing::info!(start = %start, end = %end, error = %e, "Using static travel options");
                fallback::static_travel_options(start, end)
            }
        };

        TravelInformation {
            start_location: start.to_string(),
            end_location: end.to_string(),
            options,
        }
    }

    async fn live_walking(&self, start: &str, end: &str) -> Result<TravelOption> {
        let origin = self.locate(start).await?;
        let destination = self.locate(end).await?;
        let route = self.route_between(origin, destination).await?;

        let mut details = format!(
            "Walk from {} to {}: about {} meters, roughly {} minutes.",
            start, end, route.total_distance_m, route.total_duration_min
        );
        if let Some(first) = route.steps.first() {
            details.push_str(&format!(" First: {}.", first.instruction.trim_end_matches('.')));
        }

        Ok(TravelOption::new(
            fallback::WALKING,
            details,
            format!("OpenRouteService ({})", self.profile.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockGeocoder {
        known: HashMap<String, Coordinates>,
    }

    impl MockGeocoder {
        fn knowing(addresses: &[&str]) -> Self {
            let known = addresses
                .iter()
                .enumerate()
                .map(|(i, a)| (a.to_string(), Coordinates::new(6.77 + i as f64 * 0.01, 51.22)))
                .collect();
            Self { known }
        }
    }

    #[async_trait]
    impl Geocoder for MockGeocoder {
        async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
            Ok(self.known.get(address).copied())
        }
    }

    enum RouterBehaviour {
        Route(Value),
        NoRoute,
        Fail,
        Hang,
    }

    struct MockRouter {
        behaviour: RouterBehaviour,
        calls: AtomicUsize,
    }

    impl MockRouter {
        fn new(behaviour: RouterBehaviour) -> Self {
            Self {
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Router for MockRouter {
        async fn route(&self, _: Coordinates, _: Coordinates, profile: RouteProfile) -> Result<Option<Value>> {
            assert_eq!(profile, RouteProfile::FootWalking);
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                RouterBehaviour::Route(v) => Ok(Some(v.clone())),
                RouterBehaviour::NoRoute => Ok(None),
                RouterBehaviour::Fail => Err(Error::unavailable("router", "HTTP 503")),
                RouterBehaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(None)
                }
            }
        }
    }

    const HERE: &str = "Heinrich-Heine-Allee, Düsseldorf";
    const FIRE_STATION: &str = "Berger Allee 25, 40213 Düsseldorf";

    fn directions() -> Value {
        json!({
            "routes": [{
                "summary": {"distance": 812.3, "duration": 584.0},
                "segments": [{"steps": [
                    {"instruction": "Head south on Heinrich-Heine-Allee", "distance": 400.2, "duration": 288.0},
                    {"instruction": "Arrive at Berger Allee", "distance": 412.1, "duration": 296.0}
                ]}]
            }]
        })
    }

    fn planner(geocoder: MockGeocoder, router: Arc<MockRouter>) -> EvacuationPlanner {
        EvacuationPlanner::new(Arc::new(SafePlaceCatalog::default()), Arc::new(geocoder), router)
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_fire_routes_to_fire_station() {
        let router = Arc::new(MockRouter::new(RouterBehaviour::Route(directions())));
        let planner = planner(MockGeocoder::knowing(&[HERE, FIRE_STATION]), router.clone());

        let route = planner.try_plan(HERE, EmergencyType::Fire).await.unwrap();
        assert_eq!(route.destination.key, "fire_station");
        assert_eq!(route.origin_address, HERE);
        assert_eq!(route.destination_address, FIRE_STATION);
        assert_eq!(route.total_distance_m, 812);
        assert_eq!(route.total_duration_min, 9.7);
        assert_eq!(route.steps.len(), 2);
        assert_eq!(router.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_origin_falls_back_with_three_modes() {
        let router = Arc::new(MockRouter::new(RouterBehaviour::Route(directions())));
        let planner = planner(MockGeocoder::knowing(&[FIRE_STATION]), router.clone());

        let err = planner.try_plan(HERE, EmergencyType::Fire).await.unwrap_err();
        assert!(matches!(err, Error::Geocoding(_)));

        let plan = planner.plan(HERE, EmergencyType::Fire).await;
        assert!(!plan.is_live());
        let text = plan.voice_instructions(10);
        for mode in ["Public Transport", "Walking", "Taxi/Uber"] {
            assert!(text.contains(mode), "missing {mode}");
        }
        assert_eq!(plan.destination().unwrap().key, "fire_station");
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_router_failures_become_routing_errors() {
        for behaviour in [RouterBehaviour::NoRoute, RouterBehaviour::Fail, RouterBehaviour::Hang] {
            let router = Arc::new(MockRouter::new(behaviour));
            let planner = planner(MockGeocoder::knowing(&[HERE, FIRE_STATION]), router);

            let err = planner.try_plan(HERE, EmergencyType::Fire).await.unwrap_err();
            assert!(matches!(err, Error::Routing(_)), "got {err:?}");

            let plan = planner.plan(HERE, EmergencyType::Fire).await;
            assert!(matches!(plan, EvacuationPlan::Fallback(_)));
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_has_no_safe_place() {
        let catalog = SafePlaceCatalog::new(Vec::new(), HashMap::new()).unwrap();
        let planner = EvacuationPlanner::new(
            Arc::new(catalog),
            Arc::new(MockGeocoder::knowing(&[HERE])),
            Arc::new(MockRouter::new(RouterBehaviour::NoRoute)),
        );

        assert!(matches!(
            planner.select_safe_place(EmergencyType::Medical),
            Err(Error::NoSafePlace(_))
        ));
        let plan = planner.plan(HERE, EmergencyType::Medical).await;
        assert!(plan.destination().is_none());
        assert!(plan.voice_instructions(10).contains("Taxi/Uber"));
    }

    #[tokio::test]
    async fn test_travel_information_live_walking() {
        let router = Arc::new(MockRouter::new(RouterBehaviour::Route(directions())));
        let planner = planner(MockGeocoder::knowing(&[HERE, FIRE_STATION]), router);

        let info = planner.travel_information(HERE, FIRE_STATION).await;
        assert_eq!(info.options.len(), 3);
        assert_eq!(info.options[0].mode, "Walking");
        assert!(info.options[0].details.contains("about 812 meters"));
        assert!(info.options[0].source.contains("foot-walking"));
        assert!(info.options.iter().any(|o| o.mode == "Taxi/Uber"));
    }

    #[tokio::test]
    async fn test_travel_information_static_when_unknown() {
        let router = Arc::new(MockRouter::new(RouterBehaviour::Fail));
        let planner = planner(MockGeocoder::knowing(&[]), router);

        let info = planner.travel_information("Altstadt", "Hauptbahnhof").await;
        let modes: Vec<&str> = info.options.iter().map(|o| o.mode.as_str()).collect();
        assert_eq!(modes, vec!["Public Transport", "Walking", "Taxi/Uber"]);
        assert_eq!(info.start_location, "Altstadt");
    }
}
