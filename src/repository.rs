// Read-only repositories over the in-memory mock collections.
//
// The repositories own their collections; every record handed out is a clone,
// so callers can mutate what they get back without affecting later queries.
// Lookups that would hit a backend in production await a `Latency` pause.

use std::collections::BTreeSet;

use crate::error::MarketError;
use crate::filter::VehicleFilter;
use crate::latency::Latency;
use crate::models::{Dealership, DealershipId, ValueRange, Vehicle, VehicleId};

pub struct VehicleRepository {
    vehicles: Vec<Vehicle>,
    latency: Latency,
}

impl VehicleRepository {
    pub fn new(vehicles: Vec<Vehicle>, latency: Latency) -> Self {
        Self { vehicles, latency }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub async fn get_all(&self) -> Vec<Vehicle> {
        self.latency.pause().await;
        self.vehicles.clone()
    }

    pub async fn get_by_id(&self, id: VehicleId) -> Result<Vehicle, MarketError> {
        self.latency.pause().await;
        self.vehicles
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| MarketError::vehicle_not_found(id))
    }

    // Vehicles whose id is in `ids`, in repository order. Unknown ids are
    // skipped.
    pub async fn get_by_ids(&self, ids: &[VehicleId]) -> Vec<Vehicle> {
        self.latency.pause().await;
        self.vehicles
            .iter()
            .filter(|v| ids.contains(&v.id))
            .cloned()
            .collect()
    }

    pub async fn search(&self, filter: &VehicleFilter) -> Vec<Vehicle> {
        self.latency.pause().await;
        let results: Vec<Vehicle> = self
            .vehicles
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        tracing::debug!(filter = ?filter, matched = results.len(), "Vehicle search complete");
        results
    }

    // Up to `limit` other vehicles sharing the target's make or body type.
    pub async fn similar_to(&self, id: VehicleId, limit: usize) -> Result<Vec<Vehicle>, MarketError> {
        let target = self.get_by_id(id).await?;
        Ok(self
            .vehicles
            .iter()
            .filter(|v| v.id != target.id)
            .filter(|v| v.make == target.make || v.body_type == target.body_type)
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn makes(&self) -> Vec<String> {
        self.vehicles
            .iter()
            .map(|v| v.make.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn models_for_make(&self, make: &str) -> Vec<String> {
        self.vehicles
            .iter()
            .filter(|v| v.make == make)
            .map(|v| v.model.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn year_range(&self) -> Result<ValueRange<i32>, MarketError> {
        let min = self.vehicles.iter().map(|v| v.year).min();
        let max = self.vehicles.iter().map(|v| v.year).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(ValueRange { min, max }),
            _ => Err(MarketError::EmptyCollection),
        }
    }

    pub fn price_range(&self) -> Result<ValueRange<f64>, MarketError> {
        if self.vehicles.is_empty() {
            return Err(MarketError::EmptyCollection);
        }
        let prices = self.vehicles.iter().map(|v| v.price);
        let min = prices.clone().fold(f64::INFINITY, f64::min);
        let max = prices.fold(f64::NEG_INFINITY, f64::max);
        Ok(ValueRange { min, max })
    }
}

pub struct DealershipRepository {
    dealerships: Vec<Dealership>,
    latency: Latency,
}

impl DealershipRepository {
    pub fn new(dealerships: Vec<Dealership>, latency: Latency) -> Self {
        Self {
            dealerships,
            latency,
        }
    }

    pub async fn get_all(&self) -> Vec<Dealership> {
        self.latency.pause().await;
        self.dealerships.clone()
    }

    pub async fn get_by_id(&self, id: DealershipId) -> Result<Dealership, MarketError> {
        self.latency.pause().await;
        self.dealerships
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(MarketError::NotFound {
                entity: "Dealership",
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn vehicle(id: VehicleId, year: i32, make: &str, model: &str, price: f64, body: &str) -> Vehicle {
        Vehicle {
            id,
            year,
            make: make.into(),
            model: model.into(),
            price,
            mileage: 10_000 * id,
            color: "Black".into(),
            body_type: body.into(),
            fuel_type: "Gasoline".into(),
            transmission: "Automatic".into(),
            condition: Some("Used".into()),
            vin: format!("VIN{id}"),
            dealership_id: 1,
            date_added: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            listing_url: format!("https://example.com/{id}"),
            images: vec![format!("https://example.com/{id}.jpg")],
            features: vec![],
        }
    }

    fn repo() -> VehicleRepository {
        VehicleRepository::new(
            vec![
                vehicle(3, 2018, "Toyota", "RAV4", 24000.0, "SUV"),
                vehicle(1, 2021, "Honda", "Civic", 22000.0, "Sedan"),
                vehicle(2, 2015, "Honda", "Accord", 14000.0, "Sedan"),
                vehicle(4, 2019, "Ford", "F-150", 31000.0, "Truck"),
            ],
            Latency::none(),
        )
    }

    #[tokio::test]
    async fn get_all_preserves_repository_order() {
        let ids: Vec<VehicleId> = repo().get_all().await.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
    }

    #[tokio::test]
    async fn returned_records_are_copies() {
        let repo = repo();
        let mut first = repo.get_by_id(1).await.unwrap();
        first.model = "Tampered".into();
        assert_eq!(repo.get_by_id(1).await.unwrap().model, "Civic");
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        assert!(matches!(
            repo().get_by_id(99).await,
            Err(MarketError::NotFound { id: 99, .. })
        ));
    }

    #[tokio::test]
    async fn get_by_ids_uses_repository_order_and_skips_unknown() {
        let ids: Vec<VehicleId> = repo()
            .get_by_ids(&[4, 99, 3, 4])
            .await
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn empty_search_equals_get_all() {
        let repo = repo();
        assert_eq!(repo.search(&VehicleFilter::default()).await, repo.get_all().await);
    }

    #[tokio::test]
    async fn search_model_substring() {
        let filter = VehicleFilter {
            model: Some("civ".into()),
            ..Default::default()
        };
        let results = repo().search(&filter).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model, "Civic");
    }

    #[tokio::test]
    async fn similar_shares_make_or_body() {
        let ids: Vec<VehicleId> = repo()
            .similar_to(1, 3)
            .await
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn facets_are_sorted_and_distinct() {
        let repo = repo();
        assert_eq!(repo.makes(), vec!["Ford", "Honda", "Toyota"]);
        assert_eq!(repo.models_for_make("Honda"), vec!["Accord", "Civic"]);
        assert!(repo.models_for_make("Tesla").is_empty());
    }

    #[test]
    fn ranges_cover_full_collection() {
        let repo = repo();
        assert_eq!(repo.year_range().unwrap(), ValueRange { min: 2015, max: 2021 });
        assert_eq!(
            repo.price_range().unwrap(),
            ValueRange { min: 14000.0, max: 31000.0 }
        );
    }

    #[test]
    fn ranges_fail_on_empty_collection() {
        let repo = VehicleRepository::new(Vec::new(), Latency::none());
        assert!(matches!(repo.year_range(), Err(MarketError::EmptyCollection)));
        assert!(matches!(repo.price_range(), Err(MarketError::EmptyCollection)));
    }

    #[tokio::test]
    async fn dealership_lookup() {
        let dealerships = DealershipRepository::new(
            vec![Dealership {
                id: 7,
                name: "Metro Motors".into(),
                address: "1 Main St".into(),
                phone: "555-0100".into(),
                website: "https://metro.example.com".into(),
                vehicle_count: 12,
            }],
            Latency::none(),
        );
        assert_eq!(dealerships.get_by_id(7).await.unwrap().name, "Metro Motors");
        assert!(matches!(
            dealerships.get_by_id(8).await,
            Err(MarketError::NotFound { entity: "Dealership", id: 8 })
        ));
    }
}
