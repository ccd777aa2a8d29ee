// Vehicle marketplace search service: repository, query codec, selections and comparisons

use axum::extract::FromRef;
use std::sync::Arc;

pub mod comparison;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod latency;
pub mod models;
pub mod query;
pub mod repository;
pub mod routes;
pub mod saved_searches;
pub mod selection;
pub mod store;

use crate::config::Settings;
use crate::dataset::Dataset;
use crate::latency::Latency;
use crate::repository::{DealershipRepository, VehicleRepository};
use crate::saved_searches::SavedSearchRepository;
use crate::selection::SelectionManager;
use crate::store::KeyValueStore;

// Application-scoped state, built once at startup and shared with every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub vehicles: Arc<VehicleRepository>,
    pub dealerships: Arc<DealershipRepository>,
    pub saved_searches: Arc<SavedSearchRepository>,
    pub selections: Arc<SelectionManager>,
}

impl AppState {
    pub fn new(dataset: Dataset, store: Arc<dyn KeyValueStore>, latency: Latency) -> Self {
        Self {
            vehicles: Arc::new(VehicleRepository::new(dataset.vehicles, latency)),
            dealerships: Arc::new(DealershipRepository::new(dataset.dealerships, latency)),
            saved_searches: Arc::new(SavedSearchRepository::new(dataset.saved_searches, latency)),
            selections: Arc::new(SelectionManager::new(store)),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        dataset: Dataset,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::new(dataset, store, settings.latency())
    }
}
