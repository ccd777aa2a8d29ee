// In-memory saved searches, seeded from the mock dataset

use chrono::{Local, NaiveDate};
use tokio::sync::RwLock;

use crate::error::MarketError;
use crate::latency::Latency;
use crate::models::{NewSavedSearch, SavedSearch, SavedSearchId};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn validated_name(name: &str) -> Result<String, MarketError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MarketError::validation("Saved search name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn not_found(id: SavedSearchId) -> MarketError {
    MarketError::NotFound {
        entity: "Saved search",
        id,
    }
}

pub struct SavedSearchRepository {
    searches: RwLock<Vec<SavedSearch>>,
    latency: Latency,
}

impl SavedSearchRepository {
    pub fn new(searches: Vec<SavedSearch>, latency: Latency) -> Self {
        Self {
            searches: RwLock::new(searches),
            latency,
        }
    }

    pub async fn get_all(&self) -> Vec<SavedSearch> {
        self.latency.pause().await;
        self.searches.read().await.clone()
    }

    pub async fn get_by_id(&self, id: SavedSearchId) -> Result<SavedSearch, MarketError> {
        self.latency.pause().await;
        self.searches
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, new_search: NewSavedSearch) -> Result<SavedSearch, MarketError> {
        let name = validated_name(&new_search.name)?;
        self.latency.pause().await;

        let mut searches = self.searches.write().await;
        let id = searches.iter().map(|s| s.id).max().map_or(1, |max| max + 1);
        let created = SavedSearch {
            id,
            name,
            filters: new_search.filters,
            result_count: new_search.result_count,
            created_at: today(),
            last_run: today(),
        };
        searches.push(created.clone());
        tracing::info!(id, name = %created.name, "Saved search created");
        Ok(created)
    }

    // Stamp `last_run` with today's date.
    pub async fn mark_run(&self, id: SavedSearchId) -> Result<SavedSearch, MarketError> {
        self.update(id, |search| search.last_run = today()).await
    }

    pub async fn rename(&self, id: SavedSearchId, name: &str) -> Result<SavedSearch, MarketError> {
        let name = validated_name(name)?;
        self.update(id, move |search| search.name = name).await
    }

    async fn update<F>(&self, id: SavedSearchId, apply: F) -> Result<SavedSearch, MarketError>
    where
        F: FnOnce(&mut SavedSearch),
    {
        self.latency.pause().await;
        let mut searches = self.searches.write().await;
        let search = searches
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(id))?;
        apply(search);
        Ok(search.clone())
    }

    pub async fn delete(&self, id: SavedSearchId) -> Result<(), MarketError> {
        self.latency.pause().await;
        let mut searches = self.searches.write().await;
        let index = searches
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found(id))?;
        searches.remove(index);
        tracing::info!(id, "Saved search deleted");
        Ok(())
    }
}
