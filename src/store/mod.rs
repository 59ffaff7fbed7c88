use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::fleet::Fleet;

pub const DRIVERS_KEY: &str = "conductores";
pub const TRIPS_KEY: &str = "viajes";
pub const REQUESTS_KEY: &str = "solicitudes";
pub const QUOTES_KEY: &str = "cotizaciones";
pub const CALENDAR_KEY: &str = "eventosCalendario";

/// Key/value persistence for whole collections.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, AppError>;
    fn set(&self, key: &str, value: Value) -> Result<(), AppError>;
}

/// In-process store holding serialized JSON, with a total size quota.
pub struct MemoryStore {
    entries: DashMap<String, String>,
    max_bytes: usize,
}

impl MemoryStore {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_bytes,
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let Some(raw) = self.entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(raw.value())
            .map(Some)
            .map_err(|e| AppError::Storage(format!("corrupt entry {key}: {e}")))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        let serialized = value.to_string();
        let others: usize = self
            .entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.value().len())
            .sum();

        if others + serialized.len() > self.max_bytes {
            return Err(AppError::Storage(format!(
                "storage quota exceeded writing {key} ({} bytes)",
                serialized.len()
            )));
        }

        debug!(key, bytes = serialized.len(), "stored collection");
        self.entries.insert(key.to_string(), serialized);
        Ok(())
    }
}

fn load_collection<T: DeserializeOwned>(store: &dyn Storage, key: &str) -> Vec<T> {
    match store.get(key) {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(key, error = %e, "unreadable collection, starting empty");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(key, error = %e, "failed to read collection, starting empty");
            Vec::new()
        }
    }
}

fn to_value<T: Serialize>(key: &str, items: &[T]) -> Result<Value, AppError> {
    serde_json::to_value(items)
        .map_err(|e| AppError::Internal(format!("failed to serialize {key}: {e}")))
}

/// Reads every collection. Missing or corrupt collections load as empty.
pub fn load_fleet(store: &dyn Storage) -> Fleet {
    Fleet {
        drivers: load_collection(store, DRIVERS_KEY),
        trips: load_collection(store, TRIPS_KEY),
        requests: load_collection(store, REQUESTS_KEY),
        quotes: load_collection(store, QUOTES_KEY),
        calendar_events: load_collection(store, CALENDAR_KEY),
    }
}

/// Writes every collection. Stops at the first failure.
pub fn save_fleet(store: &dyn Storage, fleet: &Fleet) -> Result<(), AppError> {
    store.set(DRIVERS_KEY, to_value(DRIVERS_KEY, &fleet.drivers)?)?;
    store.set(TRIPS_KEY, to_value(TRIPS_KEY, &fleet.trips)?)?;
    store.set(REQUESTS_KEY, to_value(REQUESTS_KEY, &fleet.requests)?)?;
    store.set(QUOTES_KEY, to_value(QUOTES_KEY, &fleet.quotes)?)?;
    store.set(CALENDAR_KEY, to_value(CALENDAR_KEY, &fleet.calendar_events)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::driver::{Driver, DriverState, LicenseClass};
    use crate::models::truck::TruckClass;

    fn fleet() -> Fleet {
        Fleet {
            drivers: vec![Driver {
                id: 1,
                name: "Juan Pérez".to_string(),
                license: LicenseClass::A5,
                phone: "+56 9 8100 0001".to_string(),
                origin_base: "Santiago".to_string(),
                truck_class: TruckClass::Gc,
                state: DriverState::Available,
                blocks: Vec::new(),
            }],
            ..Fleet::default()
        }
    }

    #[test]
    fn saved_fleet_loads_back() {
        let store = MemoryStore::new(1 << 20);
        save_fleet(&store, &fleet()).unwrap();
        assert_eq!(load_fleet(&store), fleet());
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let store = MemoryStore::new(16);
        let err = store.set(DRIVERS_KEY, json!(["a very long value that will not fit"])).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn overwriting_a_key_does_not_count_twice() {
        let store = MemoryStore::new(12);
        store.set(TRIPS_KEY, json!([1, 2, 3])).unwrap();
        store.set(TRIPS_KEY, json!([4, 5, 6])).unwrap();
        assert_eq!(store.used_bytes(), 7);
    }

    #[test]
    fn corrupt_collection_loads_empty() {
        let store = MemoryStore::new(1 << 20);
        store.set(DRIVERS_KEY, json!({"not": "a list"})).unwrap();
        store.set(TRIPS_KEY, json!([])).unwrap();
        let loaded = load_fleet(&store);
        assert!(loaded.drivers.is_empty());
        assert!(loaded.trips.is_empty());
    }
}
