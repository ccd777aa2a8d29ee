// Data structures shared by the repositories, the HTTP layer and the mock dataset

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::filter::VehicleFilter;

pub type VehicleId = u32;
pub type DealershipId = u32;
pub type SavedSearchId = u32;

// A single marketplace listing. Loaded once from the dataset and never mutated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "Id")]
    pub id: VehicleId,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub price: f64, // USD
    pub mileage: u32,
    pub color: String,
    pub body_type: String,
    pub fuel_type: String,
    pub transmission: String,
    // New / Used / Certified; older records may not carry it
    #[serde(default)]
    pub condition: Option<String>,
    pub vin: String,
    pub dealership_id: DealershipId,
    pub date_added: NaiveDate,
    pub listing_url: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Vehicle {
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dealership {
    #[serde(rename = "Id")]
    pub id: DealershipId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub vehicle_count: u32,
}

// A named filter snapshot the user can re-run later
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    #[serde(rename = "Id")]
    pub id: SavedSearchId,
    pub name: String,
    #[serde(default)]
    pub filters: VehicleFilter,
    pub result_count: usize,
    pub created_at: NaiveDate,
    pub last_run: NaiveDate,
}

// Payload for creating a saved search
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedSearch {
    pub name: String,
    #[serde(default)]
    pub filters: VehicleFilter,
    #[serde(default)]
    pub result_count: usize,
}

// Inclusive bounds used to seed range controls
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}
