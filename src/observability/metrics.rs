use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use crate::models::driver::DriverState;
use crate::models::fleet::Fleet;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub quotes_total: IntCounterVec,
    pub route_lookups_total: IntCounterVec,
    pub storage_failures_total: IntCounter,
    pub operation_latency_seconds: HistogramVec,
    pub drivers_by_state: IntGaugeVec,
    pub active_trips: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let quotes_total = IntCounterVec::new(
            Opts::new("quotes_total", "Quotes by lifecycle outcome"),
            &["outcome"],
        )
        .expect("valid quotes_total metric");

        let route_lookups_total = IntCounterVec::new(
            Opts::new("route_lookups_total", "Route lookups by answering source"),
            &["source"],
        )
        .expect("valid route_lookups_total metric");

        let storage_failures_total =
            IntCounter::new("storage_failures_total", "Failed persistence writes")
                .expect("valid storage_failures_total metric");

        let operation_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Latency of committed fleet operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid operation_latency_seconds metric");

        let drivers_by_state = IntGaugeVec::new(
            Opts::new("drivers_by_state", "Drivers per cached state"),
            &["state"],
        )
        .expect("valid drivers_by_state metric");

        let active_trips = IntGauge::new("active_trips", "Trips that are pending or in progress")
            .expect("valid active_trips metric");

        registry
            .register(Box::new(quotes_total.clone()))
            .expect("register quotes_total");
        registry
            .register(Box::new(route_lookups_total.clone()))
            .expect("register route_lookups_total");
        registry
            .register(Box::new(storage_failures_total.clone()))
            .expect("register storage_failures_total");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("register operation_latency_seconds");
        registry
            .register(Box::new(drivers_by_state.clone()))
            .expect("register drivers_by_state");
        registry
            .register(Box::new(active_trips.clone()))
            .expect("register active_trips");

        Self {
            registry,
            quotes_total,
            route_lookups_total,
            storage_failures_total,
            operation_latency_seconds,
            drivers_by_state,
            active_trips,
        }
    }

    /// Recomputes the fleet gauges from a committed snapshot.
    pub fn observe_fleet(&self, fleet: &Fleet) {
        for state in [DriverState::Available, DriverState::Busy, DriverState::Inactive] {
            let count = fleet.drivers.iter().filter(|driver| driver.state == state).count();
            self.drivers_by_state
                .with_label_values(&[state.label()])
                .set(count as i64);
        }
        let active = fleet
            .trips
            .iter()
            .filter(|trip| !trip.state.is_terminal())
            .count();
        self.active_trips.set(active as i64);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_fleet;

    #[test]
    fn fleet_gauges_follow_snapshot() {
        let metrics = Metrics::new();
        metrics.observe_fleet(&demo_fleet(chrono::Utc::now()));

        assert_eq!(metrics.active_trips.get(), 2);
        assert_eq!(metrics.drivers_by_state.with_label_values(&["busy"]).get(), 2);
        assert_eq!(metrics.drivers_by_state.with_label_values(&["available"]).get(), 27);
        assert!(metrics.encode().unwrap().contains("active_trips 2"));
    }
}
