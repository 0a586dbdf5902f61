use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use super::{datastore_failed, invalid_input, resolve_zone, validation_failed, AppState};
use crate::core::within_radius;
use crate::models::{
    CreateTaskRequest, ErrorResponse, GeoPoint, NearbyQuery, NearbyResponse, TaskRequest,
    TaskStatus, BOUNTY_OPTIONS,
};

/// Configure task request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/requests", web::post().to(create_task))
        .route("/requests/nearby", web::get().to(nearby_tasks));
}

/// Drop a bounty request on the map
///
/// POST /api/v1/requests
///
/// Request body:
/// ```json
/// {
///   "lat": 27.7172,
///   "lng": 85.3240,
///   "description": "Is the Bhatbhateni queue long?",
///   "bounty": 100
/// }
/// ```
async fn create_task(
    state: web::Data<AppState>,
    req: web::Json<CreateTaskRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(&errors);
    }

    if !BOUNTY_OPTIONS.contains(&req.bounty) {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Invalid bounty",
            format!("Bounty must be one of: {:?}", BOUNTY_OPTIONS),
            400,
        ));
    }

    let req = req.into_inner();
    let location = match GeoPoint::new(req.lat, req.lng) {
        Ok(point) => point,
        Err(e) => return invalid_input(&e),
    };

    let task = TaskRequest {
        id: None,
        location,
        description: req.description,
        bounty: req.bounty,
        status: TaskStatus::Open,
        created_at: None,
    };

    match state.supabase.insert_task_request(&task).await {
        Ok(created) => {
            tracing::info!("Task {:?} posted with bounty {}", created.id, created.bounty);
            HttpResponse::Created().json(created)
        }
        Err(e) => datastore_failed("Failed to store request", &e),
    }
}

/// Open requests near a reference point
///
/// GET /api/v1/requests/nearby?lat={lat}&lng={lng}&radius={meters}
async fn nearby_tasks(
    state: web::Data<AppState>,
    query: web::Query<NearbyQuery>,
) -> impl Responder {
    let (center, radius) = match resolve_zone(&query, &state.zone) {
        Ok(zone) => zone,
        Err(e) => return invalid_input(&e),
    };

    let tasks = match state.supabase.list_task_requests(Some(TaskStatus::Open)).await {
        Ok(tasks) => tasks,
        Err(e) => return datastore_failed("Failed to fetch requests", &e),
    };

    let results = within_radius(center, &tasks, radius);

    tracing::debug!("{} of {} open requests within {}m", results.len(), tasks.len(), radius);

    HttpResponse::Ok().json(NearbyResponse {
        total_results: results.len(),
        results,
        radius_meters: radius,
    })
}
