use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Limits;

pub const AVERAGE_SPEED_KMH: f64 = 80.0;
pub const DEFAULT_DEPOT: &str = "Santiago";

/// Depots a shipment can leave from.
pub const DEPOTS: [&str; 3] = ["Santiago", "Coquimbo", "Osorno"];

/// Destination regions understood by the local estimator, with their zone.
pub const REGIONS: [(&str, Zone); 16] = [
    ("Región de Arica y Parinacota", Zone::North),
    ("Región de Tarapacá", Zone::North),
    ("Región de Antofagasta", Zone::North),
    ("Región de Atacama", Zone::North),
    ("Región de Coquimbo", Zone::CenterNorth),
    ("Región de Valparaíso", Zone::CenterNorth),
    ("Región Metropolitana de Santiago", Zone::Center),
    ("Región del Libertador General Bernardo O'Higgins", Zone::Center),
    ("Región del Maule", Zone::CenterSouth),
    ("Región de Ñuble", Zone::CenterSouth),
    ("Región del Biobío", Zone::CenterSouth),
    ("Región de La Araucanía", Zone::South),
    ("Región de Los Ríos", Zone::South),
    ("Región de Los Lagos", Zone::South),
    ("Región de Aysén del General Carlos Ibáñez del Campo", Zone::FarSouth),
    ("Región de Magallanes y de la Antártica Chilena", Zone::FarSouth),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    North,
    CenterNorth,
    Center,
    CenterSouth,
    South,
    FarSouth,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Online,
    Estimated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub source: RouteSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn zone_for(region: &str) -> Zone {
    REGIONS
        .iter()
        .find(|(name, _)| *name == region)
        .map_or(Zone::Center, |(_, zone)| *zone)
}

pub fn is_known_region(region: &str) -> bool {
    REGIONS.iter().any(|(name, _)| *name == region)
}

/// Approximate road distance from a depot to a zone.
fn base_distance_km(depot: &str, zone: Zone) -> f64 {
    match (depot, zone) {
        ("Coquimbo", Zone::North) => 1400.0,
        ("Coquimbo", Zone::CenterNorth) => 200.0,
        ("Coquimbo", Zone::Center) => 460.0,
        ("Coquimbo", Zone::CenterSouth) => 650.0,
        ("Coquimbo", Zone::South) => 1200.0,
        ("Coquimbo", Zone::FarSouth) => 2400.0,
        ("Osorno", Zone::North) => 2200.0,
        ("Osorno", Zone::CenterNorth) => 1400.0,
        ("Osorno", Zone::Center) => 950.0,
        ("Osorno", Zone::CenterSouth) => 650.0,
        ("Osorno", Zone::South) => 200.0,
        ("Osorno", Zone::FarSouth) => 1400.0,
        (_, Zone::North) => 1700.0,
        (_, Zone::CenterNorth) => 460.0,
        (_, Zone::Center) => 50.0,
        (_, Zone::CenterSouth) => 350.0,
        (_, Zone::South) => 950.0,
        (_, Zone::FarSouth) => 2200.0,
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Local fallback estimate used whenever online routing is unavailable.
/// Never fails: missing input yields a zero route.
pub fn estimate_route(limits: &Limits, origin: &str, destination_region: &str) -> RouteEstimate {
    let origin = origin.trim();
    let destination = destination_region.trim();

    if origin.is_empty() || destination.is_empty() {
        warn!("route estimate requested without origin or destination");
        return RouteEstimate {
            distance_km: 0.0,
            duration_hours: 0.0,
            source: RouteSource::Estimated,
            note: None,
        };
    }

    let depot = DEPOTS
        .iter()
        .find(|depot| **depot == origin)
        .copied()
        .unwrap_or(DEFAULT_DEPOT);
    let zone = zone_for(destination);

    let distance_km = base_distance_km(depot, zone).min(limits.distance_km.1);
    let duration_hours = round1(distance_km / AVERAGE_SPEED_KMH).min(limits.duration_hours.1);

    debug!(depot, destination, distance_km, duration_hours, "route estimated locally");

    RouteEstimate {
        distance_km,
        duration_hours,
        source: RouteSource::Estimated,
        note: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn santiago_to_valparaiso_uses_center_north_distance() {
        let route = estimate_route(&Limits::default(), "Santiago", "Región de Valparaíso");
        assert_eq!(route.distance_km, 460.0);
        assert_eq!(route.duration_hours, 5.8);
        assert_eq!(route.source, RouteSource::Estimated);
    }

    #[test]
    fn unknown_origin_and_region_fall_back_to_defaults() {
        let route = estimate_route(&Limits::default(), "Valdivia", "Atlantis");
        assert_eq!(route.distance_km, 50.0);
        assert_eq!(route.duration_hours, 0.6);
    }

    #[test]
    fn osorno_to_far_south() {
        let route = estimate_route(
            &Limits::default(),
            "Osorno",
            "Región de Magallanes y de la Antártica Chilena",
        );
        assert_eq!(route.distance_km, 1400.0);
        assert_eq!(route.duration_hours, 17.5);
    }

    #[test]
    fn missing_input_returns_zero_route() {
        let route = estimate_route(&Limits::default(), "", "Región de Atacama");
        assert_eq!(route.distance_km, 0.0);
        assert_eq!(route.duration_hours, 0.0);
    }

    #[test]
    fn duration_is_capped_by_limits() {
        let limits = Limits {
            duration_hours: (0.5, 10.0),
            ..Limits::default()
        };
        let route = estimate_route(&limits, "Coquimbo", "Región de Aysén del General Carlos Ibáñez del Campo");
        assert_eq!(route.distance_km, 2400.0);
        assert_eq!(route.duration_hours, 10.0);
    }

    #[test]
    fn every_region_is_known() {
        assert!(REGIONS.iter().all(|(name, _)| is_known_region(name)));
        assert!(!is_known_region("Región Inventada"));
    }
}
