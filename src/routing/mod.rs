//! Online road routing: geocode both places with Nominatim, then ask OSRM
//! for the driving route. Any failure falls back to the local estimator.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{Limits, RoutingConfig};
use crate::engine::route::{estimate_route, round1, RouteEstimate, RouteSource};
use crate::error::AppError;

const COUNTRY_SUFFIX: &str = ", Chile";
const USER_AGENT: &str = "fleet-dispatch/0.1";

#[async_trait]
pub trait RouteResolver: Send + Sync {
    async fn resolve_route(&self, origin: &str, destination: &str) -> Result<RouteEstimate, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Metres.
    distance: f64,
    /// Seconds.
    duration: f64,
}

pub struct OsrmRouteResolver {
    client: reqwest::Client,
    nominatim_url: String,
    osrm_url: String,
}

impl OsrmRouteResolver {
    pub fn new(config: &RoutingConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            nominatim_url: config.nominatim_url.trim_end_matches('/').to_string(),
            osrm_url: config.osrm_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn geocode(&self, place: &str) -> Result<Coordinates, AppError> {
        let query = format!("{place}{COUNTRY_SUFFIX}");
        let url = format!(
            "{}?format=json&q={}",
            self.nominatim_url,
            urlencoding::encode(&query)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept-Language", "es")
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("geocoding request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "geocoding failed with status {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("invalid geocoding response: {e}")))?;

        let place_hit = places
            .first()
            .ok_or_else(|| AppError::ExternalService(format!("no coordinates found for {place}")))?;

        let parse = |raw: &str| {
            raw.parse::<f64>()
                .map_err(|e| AppError::ExternalService(format!("bad coordinate {raw}: {e}")))
        };
        Ok(Coordinates {
            lat: parse(&place_hit.lat)?,
            lon: parse(&place_hit.lon)?,
        })
    }
}

#[async_trait]
impl RouteResolver for OsrmRouteResolver {
    async fn resolve_route(&self, origin: &str, destination: &str) -> Result<RouteEstimate, AppError> {
        let from = self.geocode(origin).await?;
        let to = self.geocode(destination).await?;

        let url = format!(
            "{}/{},{};{},{}?overview=false&alternatives=false&steps=false",
            self.osrm_url, from.lon, from.lat, to.lon, to.lat
        );
        debug!(%url, "requesting road route");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("routing request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "routing failed with status {}",
                response.status()
            )));
        }

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("invalid routing response: {e}")))?;

        let route = body
            .routes
            .first()
            .ok_or_else(|| AppError::ExternalService("routing returned no routes".to_string()))?;

        Ok(RouteEstimate {
            distance_km: round1(route.distance / 1000.0),
            duration_hours: round1(route.duration / 3600.0),
            source: RouteSource::Online,
            note: None,
        })
    }
}

/// Online route when a resolver is configured and answers, otherwise the
/// local estimate annotated with the reason. Never fails.
pub async fn resolve_route(
    resolver: Option<&dyn RouteResolver>,
    limits: &Limits,
    origin: &str,
    destination: &str,
) -> RouteEstimate {
    let (origin, destination) = (origin.trim(), destination.trim());
    if origin.is_empty() || destination.is_empty() {
        return estimate_route(limits, origin, destination);
    }

    let Some(resolver) = resolver else {
        return estimate_route(limits, origin, destination);
    };

    match resolver.resolve_route(origin, destination).await {
        Ok(route) => RouteEstimate {
            distance_km: route.distance_km.min(limits.distance_km.1),
            duration_hours: route.duration_hours.min(limits.duration_hours.1),
            ..route
        },
        Err(err) => {
            warn!(error = %err, origin, destination, "online routing failed, using local estimate");
            RouteEstimate {
                note: Some(format!("estimated locally: {err}")),
                ..estimate_route(limits, origin, destination)
            }
        }
    }
}
