//! Safe-place catalog and per-emergency priorities
//!
//! The catalog is immutable once loaded and shared by the planner and
//! the HTTP API.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use dwani_core::{EmergencyType, SafePlace};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Curated destinations plus the order to try them in for each
/// emergency type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafePlaceCatalog {
    /// Keyed by catalog key (`hospital`, `fire_station`, ...)
    pub places: BTreeMap<String, SafePlace>,
    /// Ordered catalog keys per emergency type
    #[serde(default)]
    pub priorities: HashMap<EmergencyType, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    places: Vec<PlaceEntry>,
    #[serde(default)]
    priorities: HashMap<EmergencyType, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PlaceEntry {
    key: String,
    name: String,
    address: String,
    category: String,
    capacity: String,
    #[serde(default)]
    services: Vec<String>,
}

impl SafePlaceCatalog {
    /// Build from places and priorities, checking that every priority
    /// refers to a known place
    pub fn new(
        places: Vec<SafePlace>,
        priorities: HashMap<EmergencyType, Vec<String>>,
    ) -> Result<Self, ConfigError> {
        let places: BTreeMap<String, SafePlace> =
            places.into_iter().map(|p| (p.key.clone(), p)).collect();

        for (emergency, keys) in &priorities {
            if let Some(missing) = keys.iter().find(|k| !places.contains_key(*k)) {
                return Err(ConfigError::invalid(
                    "safe_places.priorities",
                    format!("'{}' lists unknown place '{}'", emergency, missing),
                ));
            }
        }

        Ok(Self { places, priorities })
    }

    /// Load a catalog from YAML
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let places = file
            .places
            .into_iter()
            .map(|p| SafePlace {
                key: p.key,
                name: p.name,
                address: p.address,
                category: p.category,
                capacity: p.capacity,
                services: p.services,
            })
            .collect();

        let catalog = Self::new(places, file.priorities)?;
        tracing::info!(places = catalog.places.len(), "Loaded safe-place catalog");
        Ok(catalog)
    }

    pub fn get(&self, key: &str) -> Option<&SafePlace> {
        self.places.get(key)
    }

    /// Priority list for `emergency`, falling back to the general list
    pub fn priority_for(&self, emergency: EmergencyType) -> &[String] {
        self.priorities
            .get(&emergency)
            .or_else(|| self.priorities.get(&EmergencyType::General))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First place on the priority list that exists in the catalog
    pub fn first_available(&self, emergency: EmergencyType) -> Option<&SafePlace> {
        self.priority_for(emergency)
            .iter()
            .find_map(|key| self.places.get(key))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn place(
    key: &str,
    name: &str,
    address: &str,
    category: &str,
    capacity: &str,
    services: &[&str],
) -> SafePlace {
    SafePlace {
        key: key.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        category: category.to_string(),
        capacity: capacity.to_string(),
        services: services.iter().map(|s| s.to_string()).collect(),
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SafePlaceCatalog {
    /// Düsseldorf city-centre catalog
    fn default() -> Self {
        let places = vec![
            place(
                "hospital",
                "University Hospital Düsseldorf",
                "Moorenstraße 5, 40225 Düsseldorf",
                "hospital",
                "large",
                &["emergency", "trauma", "burn_unit"],
            ),
            place(
                "fire_station",
                "Fire Station Düsseldorf Central",
                "Berger Allee 25, 40213 Düsseldorf",
                "fire_station",
                "medium",
                &["fire_emergency", "rescue"],
            ),
            place(
                "police_station",
                "Police Station Düsseldorf",
                "Jürgensplatz 1, 40219 Düsseldorf",
                "police",
                "medium",
                &["security", "emergency_response"],
            ),
            place(
                "shelter",
                "Emergency Shelter Düsseldorf",
                "Königsallee 92, 40212 Düsseldorf",
                "shelter",
                "large",
                &["temporary_housing", "basic_needs"],
            ),
            place(
                "train_station",
                "Düsseldorf Hauptbahnhof",
                "Konrad-Adenauer-Platz 14, 40210 Düsseldorf",
                "transportation",
                "large",
                &["evacuation", "transport"],
            ),
            place(
                "park",
                "Hofgarten Park",
                "Hofgarten, 40213 Düsseldorf",
                "open_space",
                "very_large",
                &["safe_assembly", "fresh_air"],
            ),
        ];

        let mut priorities = HashMap::new();
        priorities.insert(EmergencyType::Fire, keys(&["fire_station", "park", "shelter"]));
        priorities.insert(EmergencyType::Medical, keys(&["hospital", "fire_station", "shelter"]));
        priorities.insert(EmergencyType::Structural, keys(&["park", "shelter", "train_station"]));
        priorities.insert(EmergencyType::Chemical, keys(&["hospital", "fire_station", "park"]));
        priorities.insert(EmergencyType::General, keys(&["shelter", "park", "train_station"]));

        Self {
            places: places.into_iter().map(|p| (p.key.clone(), p)).collect(),
            priorities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_catalog() {
        let catalog = SafePlaceCatalog::default();
        assert_eq!(catalog.len(), 6);
        assert_eq!(
            catalog.first_available(EmergencyType::Fire).unwrap().name,
            "Fire Station Düsseldorf Central"
        );
        assert_eq!(
            catalog.first_available(EmergencyType::Medical).unwrap().key,
            "hospital"
        );
    }

    #[test]
    fn test_unlisted_types_use_general() {
        let catalog = SafePlaceCatalog::default();
        assert_eq!(
            catalog.priority_for(EmergencyType::Flood),
            catalog.priority_for(EmergencyType::General)
        );
        assert_eq!(
            catalog.first_available(EmergencyType::GasLeak).unwrap().key,
            "shelter"
        );
    }

    #[test]
    fn test_unknown_priority_key_rejected() {
        let mut priorities = HashMap::new();
        priorities.insert(EmergencyType::Fire, vec!["bunker".to_string()]);
        assert!(SafePlaceCatalog::new(Vec::new(), priorities).is_err());
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
places:
  - key: gym
    name: Sports Hall North
    address: Nordstraße 1, 40477 Düsseldorf
    category: shelter
    capacity: medium
    services: [basic_needs]
priorities:
  general: [gym]
  fire: [gym]
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let catalog = SafePlaceCatalog::from_yaml_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.first_available(EmergencyType::Flood).unwrap().name,
            "Sports Hall North"
        );
    }

    #[test]
    fn test_missing_file() {
        let result = SafePlaceCatalog::from_yaml_file("/nonexistent/places.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
