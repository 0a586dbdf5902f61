// Route exports
pub mod estimates;
pub mod products;
pub mod system;
pub mod tasks;
pub mod zone;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;
use validator::ValidationErrors;

use crate::config::{PollSettings, ZoneSettings};
use crate::core::{CoreError, Estimator};
use crate::models::{ErrorResponse, GeoPoint, NearbyQuery};
use crate::services::{FeedCache, Hub, SupabaseClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<SupabaseClient>,
    pub cache: Arc<FeedCache>,
    pub hub: Arc<Hub>,
    pub estimator: Arc<Estimator>,
    pub zone: ZoneSettings,
    pub poll: PollSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(system::configure)
            .configure(zone::configure)
            .configure(products::configure)
            .configure(tasks::configure)
            .configure(estimates::configure),
    );
}

fn validation_failed(errors: &ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(
        "Validation failed",
        errors.to_string(),
        400,
    ))
}

fn invalid_input(err: &CoreError) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(
        format!("Invalid {}", err.field()),
        err.to_string(),
        400,
    ))
}

fn datastore_failed(context: &str, err: &dyn std::fmt::Display) -> HttpResponse {
    tracing::error!("{}: {}", context, err);
    HttpResponse::BadGateway().json(ErrorResponse::new(context, err.to_string(), 502))
}

/// Reference point and effective radius of a nearby query
///
/// A missing radius means the configured zone radius; larger radii are capped.
fn resolve_zone(
    query: &NearbyQuery,
    settings: &ZoneSettings,
) -> Result<(GeoPoint, u32), CoreError> {
    let center = GeoPoint::new(query.lat, query.lng)?;
    let radius = query
        .radius
        .unwrap_or(settings.radius_meters)
        .min(settings.max_radius_meters);
    Ok((center, radius))
}

/// One server-sent event frame carrying `data` as JSON
fn sse_frame<T: Serialize>(data: &T) -> Result<web::Bytes, serde_json::Error> {
    let json = serde_json::to_string(data)?;
    Ok(web::Bytes::from(format!("data: {}\n\n", json)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_zone_defaults_and_caps_radius() {
        let settings = ZoneSettings::default();

        let query = NearbyQuery { lat: 27.7, lng: 85.3, radius: None };
        let (_, radius) = resolve_zone(&query, &settings).unwrap();
        assert_eq!(radius, 1000);

        let query = NearbyQuery { lat: 27.7, lng: 85.3, radius: Some(10_000_000) };
        let (_, radius) = resolve_zone(&query, &settings).unwrap();
        assert_eq!(radius, settings.max_radius_meters);
    }

    #[test]
    fn test_resolve_zone_rejects_bad_coordinates() {
        let query = NearbyQuery { lat: 120.0, lng: 85.3, radius: None };
        assert!(matches!(
            resolve_zone(&query, &ZoneSettings::default()),
            Err(CoreError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_sse_frame_format() {
        let frame = sse_frame(&serde_json::json!({"distance": 12})).unwrap();
        assert_eq!(&frame[..], b"data: {\"distance\":12}\n\n");
    }
}
