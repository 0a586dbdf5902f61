use actix_web::{http::header, web, HttpResponse, Responder};
use validator::Validate;

use super::{
    datastore_failed, invalid_input, resolve_zone, sse_frame, validation_failed, AppState,
};
use crate::core::{within_radius, Zone};
use crate::models::{GeoPoint, GeotaggedRecord, NearbyQuery, NearbyResponse, PostMessageRequest};

/// Configure zone feed routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/zone/messages", web::get().to(nearby_messages))
        .route("/zone/messages", web::post().to(post_message))
        .route("/zone/stream", web::get().to(stream_zone));
}

/// Messages posted within the radius of a reference point
///
/// GET /api/v1/zone/messages?lat={lat}&lng={lng}&radius={meters}
async fn nearby_messages(
    state: web::Data<AppState>,
    query: web::Query<NearbyQuery>,
) -> impl Responder {
    let (center, radius) = match resolve_zone(&query, &state.zone) {
        Ok(zone) => zone,
        Err(e) => return invalid_input(&e),
    };

    let supabase = &state.supabase;
    let records = match state.cache.messages(move || supabase.list_messages()).await {
        Ok(records) => records,
        Err(e) => return datastore_failed("Failed to fetch messages", &e),
    };

    let results = within_radius(center, &records, radius);

    tracing::info!(
        "{} of {} messages within {}m of ({}, {})",
        results.len(),
        records.len(),
        radius,
        center.latitude(),
        center.longitude()
    );

    HttpResponse::Ok().json(NearbyResponse {
        total_results: results.len(),
        results,
        radius_meters: radius,
    })
}

/// Post a message into the zone feed
///
/// POST /api/v1/zone/messages
///
/// Request body:
/// ```json
/// {
///   "user_id": "Cyber Rhino",
///   "content": "string",
///   "lat": 27.7172,
///   "lng": 85.3240
/// }
/// ```
async fn post_message(
    state: web::Data<AppState>,
    req: web::Json<PostMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for zone message: {:?}", errors);
        return validation_failed(&errors);
    }

    let req = req.into_inner();
    let location = match GeoPoint::new(req.latitude, req.longitude) {
        Ok(point) => point,
        Err(e) => return invalid_input(&e),
    };

    let record = GeotaggedRecord {
        id: None,
        user_id: req.user_id,
        content: req.content,
        location,
        created_at: None,
    };

    let created = match state.supabase.insert_message(&record).await {
        Ok(created) => created,
        Err(e) => return datastore_failed("Failed to store message", &e),
    };

    state.cache.invalidate_messages().await;
    let delivered = state.hub.publish_record(created.clone());

    tracing::debug!(
        "Message {:?} from {} delivered to {} live subscribers",
        created.id,
        created.user_id,
        delivered
    );

    HttpResponse::Created().json(created)
}

/// Live feed of new messages landing inside the caller's zone
///
/// GET /api/v1/zone/stream?lat={lat}&lng={lng}&radius={meters}
///
/// Only messages posted through `POST /api/v1/zone/messages` on this
/// instance are delivered. Rows written to the datastore by other clients
/// or other instances never reach the stream; they show up on the next
/// `GET /api/v1/zone/messages` once the feed cache expires.
async fn stream_zone(
    state: web::Data<AppState>,
    query: web::Query<NearbyQuery>,
) -> impl Responder {
    let (center, radius) = match resolve_zone(&query, &state.zone) {
        Ok(zone) => zone,
        Err(e) => return invalid_input(&e),
    };

    let subscription = state.hub.subscribe_zone(Zone::new(center, radius));
    tracing::info!(
        "Opened zone stream {} ({} subscribers)",
        subscription.id(),
        state.hub.zone_subscribers()
    );

    let events = futures::stream::unfold(subscription, |mut subscription| async move {
        let nearby = subscription.next().await?;
        Some((sse_frame(&nearby), subscription))
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONTENT_ENCODING, "identity"))
        .streaming(events)
}
