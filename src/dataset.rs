// Loads the static mock collections (vehicles, dealerships, saved searches) from JSON files

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::models::{Dealership, SavedSearch, Vehicle};

pub const VEHICLES_FILE: &str = "vehicles.json";
pub const DEALERSHIPS_FILE: &str = "dealerships.json";
pub const SAVED_SEARCHES_FILE: &str = "savedSearches.json";

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub vehicles: Vec<Vehicle>,
    pub dealerships: Vec<Dealership>,
    pub saved_searches: Vec<SavedSearch>,
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

impl Dataset {
    // Vehicles are required; the other two collections default to empty when absent
    pub fn load(data_dir: &Path) -> Result<Self> {
        let vehicles = read_collection(&data_dir.join(VEHICLES_FILE))?;

        let dealerships_path = data_dir.join(DEALERSHIPS_FILE);
        let dealerships = if dealerships_path.exists() {
            read_collection(&dealerships_path)?
        } else {
            tracing::warn!("{} not found, starting with no dealerships.", dealerships_path.display());
            Vec::new()
        };

        let saved_path = data_dir.join(SAVED_SEARCHES_FILE);
        let saved_searches = if saved_path.exists() {
            read_collection(&saved_path)?
        } else {
            tracing::info!("{} not found, starting with no saved searches.", saved_path.display());
            Vec::new()
        };

        let dataset = Self {
            vehicles,
            dealerships,
            saved_searches,
        };
        tracing::info!(
            vehicles = dataset.vehicles.len(),
            dealerships = dataset.dealerships.len(),
            saved_searches = dataset.saved_searches.len(),
            "Mock dataset loaded from {}",
            data_dir.display()
        );
        Ok(dataset)
    }
}
