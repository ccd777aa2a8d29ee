// Saved and compared vehicle sets.
//
// Both sets are ordered id lists persisted in the client store. Membership
// changes are pure functions over the current list (`toggle_id`,
// `remove_id`); `SelectionManager` wraps them in a read-modify-write that
// holds a lock across the store write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::error::MarketError;
use crate::models::VehicleId;
use crate::store::{KeyValueStore, Scoped, ScopedWatch, StoreError};

pub const COMPARE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSet {
    Saved,
    Compared,
}

impl SelectionSet {
    pub fn namespace(self) -> &'static str {
        match self {
            SelectionSet::Saved => "savedVehicles",
            SelectionSet::Compared => "comparedVehicles",
        }
    }

    pub fn capacity(self) -> Option<usize> {
        match self {
            SelectionSet::Saved => None,
            SelectionSet::Compared => Some(COMPARE_LIMIT),
        }
    }
}

impl fmt::Display for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionSet::Saved => write!(f, "saved"),
            SelectionSet::Compared => write!(f, "compared"),
        }
    }
}

impl FromStr for SelectionSet {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saved" => Ok(SelectionSet::Saved),
            "compared" => Ok(SelectionSet::Compared),
            other => Err(MarketError::validation(format!(
                "unknown selection set '{other}', expected 'saved' or 'compared'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

// Toggle `id` in `ids`. Present ids are removed; absent ids are appended
// unless the list is already at `capacity`.
pub fn toggle_id(
    ids: &[VehicleId],
    id: VehicleId,
    capacity: Option<usize>,
) -> Result<(Vec<VehicleId>, ToggleOutcome), MarketError> {
    if ids.contains(&id) {
        return Ok((remove_id(ids, id), ToggleOutcome::Removed));
    }
    if let Some(limit) = capacity {
        if ids.len() >= limit {
            return Err(MarketError::CapacityExceeded { limit });
        }
    }
    let mut next = ids.to_vec();
    next.push(id);
    Ok((next, ToggleOutcome::Added))
}

pub fn remove_id(ids: &[VehicleId], id: VehicleId) -> Vec<VehicleId> {
    ids.iter().copied().filter(|&existing| existing != id).collect()
}

pub struct SelectionManager {
    saved: Scoped<Vec<VehicleId>>,
    compared: Scoped<Vec<VehicleId>>,
    write_lock: Mutex<()>,
}

impl SelectionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            saved: Scoped::new(store.clone(), SelectionSet::Saved.namespace()),
            compared: Scoped::new(store, SelectionSet::Compared.namespace()),
            write_lock: Mutex::new(()),
        }
    }

    fn scoped(&self, set: SelectionSet) -> &Scoped<Vec<VehicleId>> {
        match set {
            SelectionSet::Saved => &self.saved,
            SelectionSet::Compared => &self.compared,
        }
    }

    pub fn ids(&self, set: SelectionSet) -> Result<Vec<VehicleId>, MarketError> {
        Ok(self.scoped(set).get()?)
    }

    pub fn contains(&self, set: SelectionSet, id: VehicleId) -> Result<bool, MarketError> {
        Ok(self.ids(set)?.contains(&id))
    }

    pub fn toggle(&self, set: SelectionSet, id: VehicleId) -> Result<ToggleOutcome, MarketError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let scoped = self.scoped(set);
        let current = scoped.get()?;
        let (next, outcome) = toggle_id(&current, id, set.capacity())?;
        scoped.set(&next)?;
        tracing::info!(set = %set, id, ?outcome, size = next.len(), "Selection toggled");
        Ok(outcome)
    }

    // Removing an id that is not present is a no-op.
    pub fn remove(&self, set: SelectionSet, id: VehicleId) -> Result<(), MarketError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let scoped = self.scoped(set);
        let current = scoped.get()?;
        if !current.contains(&id) {
            return Ok(());
        }
        scoped.set(&remove_id(&current, id))?;
        tracing::info!(set = %set, id, "Selection entry removed");
        Ok(())
    }

    pub fn clear(&self, set: SelectionSet) -> Result<(), MarketError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.scoped(set).set(&Vec::new())?;
        Ok(())
    }

    pub fn watch(&self, set: SelectionSet) -> ScopedWatch<Vec<VehicleId>> {
        self.scoped(set).watch()
    }
}
