use actix_web::{web, HttpResponse, Responder};
use std::time::Duration;
use tokio::sync::watch;

use super::{datastore_failed, AppState};
use crate::core::anonymous_handle;
use crate::models::{
    ConfirmationQuery, ConfirmationResponse, ErrorResponse, HealthResponse, IdentityResponse,
};
use crate::services::{poll_until, PollError, PollOptions, SupabaseError};

/// Configure health, identity and confirmation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/identity", web::get().to(new_identity))
        .route("/donations/{id}/confirmation", web::get().to(await_donation));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let stats = state.cache.stats();
    tracing::trace!(
        "Health check: {} cached feeds, {} product feeds, {} zone subscribers",
        stats.feeds,
        stats.product_feeds,
        state.hub.zone_subscribers()
    );

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Fresh anonymous display handle
///
/// GET /api/v1/identity
async fn new_identity() -> impl Responder {
    HttpResponse::Ok().json(IdentityResponse {
        handle: anonymous_handle(),
    })
}

/// Wait until a donation is confirmed by the payment side
///
/// GET /api/v1/donations/{id}/confirmation?timeout_secs={secs}
///
/// Answers `confirmed: false` when the wait runs out; the client may ask again.
async fn await_donation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ConfirmationQuery>,
) -> impl Responder {
    let id = path.into_inner();
    let timeout_secs = query
        .timeout_secs
        .unwrap_or(state.poll.timeout_secs)
        .min(state.poll.max_timeout_secs);

    let options = PollOptions::new(
        Duration::from_millis(state.poll.interval_millis),
        Duration::from_secs(timeout_secs),
    );

    // Held until the handler returns; nothing cancels a request-scoped wait
    let (_cancel, cancel_rx) = watch::channel(false);

    let supabase = &state.supabase;
    let table = supabase.tables().donations.as_str();
    let row = id.as_str();

    let outcome = poll_until(options, cancel_rx, move || async move {
        supabase
            .fetch_flag(table, row, "confirmed")
            .await
            .map(|confirmed| confirmed.then_some(()))
    })
    .await;

    match outcome {
        Ok(()) => {
            tracing::info!("Donation {} confirmed", id);
            HttpResponse::Ok().json(ConfirmationResponse { id, confirmed: true })
        }
        Err(PollError::TimedOut(waited)) => {
            tracing::info!("Donation {} still unconfirmed after {:?}", id, waited);
            HttpResponse::Ok().json(ConfirmationResponse { id, confirmed: false })
        }
        Err(PollError::Cancelled) => HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
            "Confirmation cancelled",
            format!("Stopped waiting on donation {}", id),
            503,
        )),
        Err(PollError::Check(SupabaseError::NotFound(_))) => {
            HttpResponse::NotFound().json(ErrorResponse::new(
                "Donation not found",
                format!("No donation with id {}", id),
                404,
            ))
        }
        Err(PollError::Check(e)) => datastore_failed("Failed to check donation", &e),
    }
}
