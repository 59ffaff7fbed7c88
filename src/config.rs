use std::env;

use crate::engine::cost::TollRule;
use crate::error::AppError;
use crate::models::truck::{CapacityTable, TruckCapacity};

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub storage_max_bytes: usize,
    pub approval_cooldown_ms: u64,
    pub seed_demo_data: bool,
    pub routing: RoutingConfig,
    pub rules: FleetRules,
}

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub enabled: bool,
    pub nominatim_url: String,
    pub osrm_url: String,
    pub timeout_secs: u64,
}

/// Business rules shared by every engine operation.
#[derive(Debug, Clone, Default)]
pub struct FleetRules {
    pub limits: Limits,
    pub capacities: CapacityTable,
    pub toll_rule: TollRule,
}

/// Validation bounds for records entering the fleet.
#[derive(Debug, Clone)]
pub struct Limits {
    pub name_min_chars: usize,
    pub name_max_chars: usize,
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub distance_km: (f64, f64),
    pub duration_hours: (f64, f64),
    pub weight_kg: (f64, f64),
    pub volume_m3: (f64, f64),
    pub trucks: (u32, u32),
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            name_min_chars: 3,
            name_max_chars: 100,
            title_min_chars: 3,
            title_max_chars: 200,
            distance_km: (1.0, 5000.0),
            duration_hours: (0.5, 72.0),
            weight_kg: (1.0, 50_000.0),
            volume_m3: (0.1, 100.0),
            trucks: (1, 10),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
            osrm_url: "https://router.project-osrm.org/route/v1/driving".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            storage_max_bytes: 5 * 1024 * 1024,
            approval_cooldown_ms: 1000,
            seed_demo_data: false,
            routing: RoutingConfig::default(),
            rules: FleetRules::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let default_caps = &defaults.rules.capacities;

        let capacities = CapacityTable {
            gc: TruckCapacity {
                weight_kg: parse_or_default("GC_CAPACITY_KG", default_caps.gc.weight_kg)?,
                volume_m3: parse_or_default("GC_CAPACITY_M3", default_caps.gc.volume_m3)?,
            },
            mc: TruckCapacity {
                weight_kg: parse_or_default("MC_CAPACITY_KG", default_caps.mc.weight_kg)?,
                volume_m3: parse_or_default("MC_CAPACITY_M3", default_caps.mc.volume_m3)?,
            },
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            storage_max_bytes: parse_or_default("STORAGE_MAX_BYTES", defaults.storage_max_bytes)?,
            approval_cooldown_ms: parse_or_default(
                "APPROVAL_COOLDOWN_MS",
                defaults.approval_cooldown_ms,
            )?,
            seed_demo_data: parse_or_default("SEED_DEMO_DATA", defaults.seed_demo_data)?,
            routing: RoutingConfig {
                enabled: parse_or_default("ROUTING_ENABLED", true)?,
                nominatim_url: env::var("NOMINATIM_URL")
                    .unwrap_or(defaults.routing.nominatim_url),
                osrm_url: env::var("OSRM_URL").unwrap_or(defaults.routing.osrm_url),
                timeout_secs: parse_or_default(
                    "ROUTING_TIMEOUT_SECS",
                    defaults.routing.timeout_secs,
                )?,
            },
            rules: FleetRules {
                limits: Limits::default(),
                capacities,
                toll_rule: parse_or_default("TOLL_RULE", TollRule::default())?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_form_limits() {
        let config = Config::default();
        assert_eq!(config.rules.limits.trucks, (1, 10));
        assert_eq!(config.rules.limits.distance_km, (1.0, 5000.0));
        assert_eq!(config.rules.capacities.gc.weight_kg, 28_000.0);
        assert_eq!(config.rules.capacities.mc.volume_m3, 35.0);
        assert_eq!(config.storage_max_bytes, 5 * 1024 * 1024);
        assert!(!config.routing.enabled);
    }

    #[test]
    fn parse_or_default_falls_back_when_unset() {
        let value: u64 = parse_or_default("FLEET_DISPATCH_SURELY_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }
}
