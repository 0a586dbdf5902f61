use actix_web::{http::header, web, HttpResponse, Responder};
use validator::Validate;

use super::{datastore_failed, sse_frame, validation_failed, AppState};
use crate::models::{ErrorResponse, PostProductMessageRequest, ProductMessage};

/// Configure product chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/products/{barcode}/messages", web::get().to(product_messages))
        .route("/products/{barcode}/messages", web::post().to(post_product_message))
        .route("/products/{barcode}/stream", web::get().to(stream_product));
}

fn normalize_barcode(raw: &str) -> Option<String> {
    let barcode = raw.trim();
    (!barcode.is_empty() && barcode.len() <= 64).then(|| barcode.to_string())
}

fn invalid_barcode() -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(
        "Invalid barcode",
        "barcode must be 1 to 64 characters",
        400,
    ))
}

/// Chat history for one scanned product, oldest first
///
/// GET /api/v1/products/{barcode}/messages
async fn product_messages(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let Some(barcode) = normalize_barcode(&path) else {
        return invalid_barcode();
    };

    let supabase = &state.supabase;
    let lookup = barcode.as_str();
    match state
        .cache
        .product_messages(&barcode, move || supabase.list_product_messages(lookup))
        .await
    {
        Ok(messages) => {
            tracing::debug!("{} messages for product {}", messages.len(), barcode);
            HttpResponse::Ok().json(messages.as_ref())
        }
        Err(e) => datastore_failed("Failed to fetch product messages", &e),
    }
}

/// Post into a product's chat
///
/// POST /api/v1/products/{barcode}/messages
async fn post_product_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<PostProductMessageRequest>,
) -> impl Responder {
    let Some(barcode) = normalize_barcode(&path) else {
        return invalid_barcode();
    };

    if let Err(errors) = req.validate() {
        return validation_failed(&errors);
    }

    let req = req.into_inner();
    let message = ProductMessage {
        id: None,
        user_id: req.user_id,
        barcode,
        content: req.content,
        created_at: None,
    };

    let created = match state.supabase.insert_product_message(&message).await {
        Ok(created) => created,
        Err(e) => return datastore_failed("Failed to store product message", &e),
    };

    state.cache.invalidate_product(&created.barcode).await;
    state.hub.publish_product(created.clone());

    HttpResponse::Created().json(created)
}

/// Live feed of one product's chat
///
/// GET /api/v1/products/{barcode}/stream
///
/// Only messages posted through `POST /api/v1/products/{barcode}/messages`
/// on this instance are delivered. Rows inserted into the datastore
/// directly are picked up by the history endpoint, not by the stream.
async fn stream_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let Some(barcode) = normalize_barcode(&path) else {
        return invalid_barcode();
    };

    let subscription = state.hub.subscribe_product(&barcode);
    tracing::info!(
        "Opened product stream for {} ({} active topics)",
        subscription.barcode(),
        state.hub.product_topics()
    );

    let events = futures::stream::unfold(subscription, |mut subscription| async move {
        let message = subscription.next().await?;
        Some((sse_frame(&message), subscription))
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONTENT_ENCODING, "identity"))
        .streaming(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode(" 8901234567890 ").as_deref(), Some("8901234567890"));
        assert!(normalize_barcode("   ").is_none());
        assert!(normalize_barcode(&"9".repeat(65)).is_none());
    }
}
