use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::approval::ApprovalGuard;
use crate::error::AppError;
use crate::models::fleet::Fleet;
use crate::observability::metrics::Metrics;
use crate::routing::{OsrmRouteResolver, RouteResolver};
use crate::seed::demo_fleet;
use crate::store::{load_fleet, save_fleet, MemoryStore, Storage};

/// Change notification pushed to websocket subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct FleetEvent {
    pub id: Uuid,
    pub kind: &'static str,
    pub at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Result of a committed mutation. `warning` is set when the in-memory
/// change succeeded but could not be persisted.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub warning: Option<String>,
}

pub struct AppState {
    pub config: Config,
    fleet: RwLock<Fleet>,
    pub store: Arc<dyn Storage>,
    pub routes: Option<Arc<dyn RouteResolver>>,
    pub approvals: ApprovalGuard,
    pub events_tx: broadcast::Sender<FleetEvent>,
    pub metrics: Metrics,
}

impl AppState {
    /// Builds the state from configuration: in-memory store, optional
    /// online router, and the persisted (or demo) fleet.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let store: Arc<dyn Storage> = Arc::new(MemoryStore::new(config.storage_max_bytes));
        let routes: Option<Arc<dyn RouteResolver>> = if config.routing.enabled {
            Some(Arc::new(OsrmRouteResolver::new(&config.routing)?))
        } else {
            None
        };
        Ok(Self::with_parts(config, store, routes))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn Storage>,
        routes: Option<Arc<dyn RouteResolver>>,
    ) -> Self {
        let mut fleet = load_fleet(store.as_ref());
        if config.seed_demo_data && fleet.drivers.is_empty() {
            fleet = demo_fleet(Utc::now());
            if let Err(err) = save_fleet(store.as_ref(), &fleet) {
                warn!(error = %err, "failed to persist demo fleet");
            }
            info!(drivers = fleet.drivers.len(), "demo fleet seeded");
        }

        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);
        let metrics = Metrics::new();
        metrics.observe_fleet(&fleet);

        Self {
            approvals: ApprovalGuard::new(Duration::from_millis(config.approval_cooldown_ms)),
            config,
            fleet: RwLock::new(fleet),
            store,
            routes,
            events_tx,
            metrics,
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Fleet> {
        self.fleet.read().await
    }

    pub async fn snapshot(&self) -> Fleet {
        self.fleet.read().await.clone()
    }

    /// Applies `apply` to a copy of the fleet and swaps the copy in only
    /// when it succeeds. Persistence runs after the swap; a failed write
    /// is reported as a warning and does not undo the change.
    pub async fn commit<T, F>(&self, operation: &'static str, apply: F) -> Result<Committed<T>, AppError>
    where
        F: FnOnce(&mut Fleet) -> Result<T, AppError>,
    {
        let started = Instant::now();
        let mut fleet = self.fleet.write().await;

        let mut working = fleet.clone();
        let value = apply(&mut working)?;
        *fleet = working;

        let warning = match save_fleet(self.store.as_ref(), &fleet) {
            Ok(()) => None,
            Err(err) => {
                self.metrics.storage_failures_total.inc();
                warn!(operation, error = %err, "change kept in memory but not persisted");
                Some(err.to_string())
            }
        };

        self.metrics.observe_fleet(&fleet);
        self.metrics
            .operation_latency_seconds
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());

        Ok(Committed { value, warning })
    }

    pub fn publish<T: Serialize>(&self, kind: &'static str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                warn!(kind, error = %err, "failed to serialize fleet event");
                return;
            }
        };
        let _ = self.events_tx.send(FleetEvent {
            id: Uuid::new_v4(),
            kind,
            at: Utc::now(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::models::driver::DriverState;

    struct FullDisk;

    impl Storage for FullDisk {
        fn get(&self, _key: &str) -> Result<Option<Value>, AppError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: Value) -> Result<(), AppError> {
            Err(AppError::Storage(format!("no space for {key}")))
        }
    }

    fn state(store: Arc<dyn Storage>) -> AppState {
        let config = Config {
            seed_demo_data: true,
            ..Config::default()
        };
        AppState::with_parts(config, store, None)
    }

    #[tokio::test]
    async fn failed_operation_leaves_fleet_untouched() {
        let state = state(Arc::new(MemoryStore::new(1 << 20)));
        let before = state.snapshot().await;

        let result = state
            .commit("test", |fleet| {
                fleet.drivers.clear();
                Err::<(), _>(AppError::Conflict("abort".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(state.snapshot().await, before);
    }

    #[tokio::test]
    async fn storage_failure_keeps_change_and_warns() {
        let state = state(Arc::new(FullDisk));
        let committed = state
            .commit("test", |fleet| {
                fleet.driver_mut(2)?.state = DriverState::Inactive;
                Ok(())
            })
            .await
            .unwrap();

        assert!(committed.warning.unwrap().contains("no space"));
        assert_eq!(state.read().await.driver(2).unwrap().state, DriverState::Inactive);
        assert_eq!(state.metrics.storage_failures_total.get(), 1);
    }

    #[tokio::test]
    async fn committed_fleet_is_persisted() {
        let store = Arc::new(MemoryStore::new(1 << 20));
        let state = state(store.clone());
        state
            .commit("test", |fleet| {
                fleet.requests.clear();
                Ok(())
            })
            .await
            .unwrap();

        assert!(load_fleet(store.as_ref()).requests.is_empty());
        assert_eq!(load_fleet(store.as_ref()).drivers.len(), 29);
    }

    #[tokio::test]
    async fn published_events_reach_subscribers() {
        let state = state(Arc::new(MemoryStore::new(1 << 20)));
        let mut rx = state.events_tx.subscribe();
        state.publish("quote.approved", &serde_json::json!({"quote_id": 1}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, "quote.approved");
        assert_eq!(event.payload["quote_id"], 1);
    }
}
