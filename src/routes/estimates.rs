use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use super::{invalid_input, validation_failed, AppState};
use crate::models::{EstimateRequest, EstimateRequestBody};

/// Configure construction estimate routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/estimates", web::post().to(create_estimate))
        .route("/estimates/rates", web::get().to(rate_tables));
}

/// Estimate construction cost and materials
///
/// POST /api/v1/estimates
///
/// Request body:
/// ```json
/// {
///   "region": "nepal",
///   "district": "kathmandu",
///   "floors": 2,
///   "area": 1000,
///   "unit": "sq_ft",
///   "quality": "standard"
/// }
/// ```
async fn create_estimate(
    state: web::Data<AppState>,
    req: web::Json<EstimateRequestBody>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(&errors);
    }

    let request = match EstimateRequest::try_from(req.into_inner()) {
        Ok(request) => request,
        Err(e) => return invalid_input(&e),
    };

    match state.estimator.estimate(&request) {
        Ok(result) => {
            tracing::info!(
                "Estimated {} sq ft in {}/{} at {}: {}",
                result.total_area_sq_ft,
                result.region,
                result.district,
                result.quality,
                result.total_cost
            );
            HttpResponse::Ok().json(result)
        }
        Err(e) => {
            tracing::info!("Rejected estimate request: {}", e);
            invalid_input(&e)
        }
    }
}

/// Reference tables the estimator prices against
///
/// GET /api/v1/estimates/rates
async fn rate_tables(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.estimator.tables())
}
