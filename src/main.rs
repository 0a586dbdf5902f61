use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use walls::config::Settings;
use walls::core::{Estimator, EstimatorTables};
use walls::routes::{self, AppState};
use walls::services::{FeedCache, Hub, SupabaseClient, SupabaseTables};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors
pub fn handle_path_error(
    err: error::PathError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging; RUST_LOG wins over LOG_LEVEL, which wins over the config file
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(logging.level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(logging.format);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Walls service...");

    let settings = settings.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Estimator reference tables
    let tables = match &settings.estimator.tables_path {
        Some(path) => EstimatorTables::load_from(path),
        None => EstimatorTables::bundled(),
    }
    .unwrap_or_else(|e| {
        error!("Failed to load estimator tables: {}", e);
        panic!("Estimator tables error: {}", e);
    });

    info!("Estimator tables loaded ({} regions)", tables.rates.len());
    let estimator = Arc::new(Estimator::new(tables));

    // Initialize datastore client
    let table_settings = settings.datastore.tables;
    let tables = SupabaseTables {
        messages: table_settings.messages,
        product_chats: table_settings.product_chats,
        requests: table_settings.requests,
        donations: table_settings.donations,
    };

    let supabase = Arc::new(
        SupabaseClient::new(
            settings.datastore.url.clone(),
            settings.datastore.api_key,
            tables,
            settings.datastore.timeout_secs.unwrap_or(15),
        )
        .map_err(|e| {
            error!("Failed to build datastore client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?
        .with_feed_limit(settings.datastore.feed_limit),
    );

    info!(
        "Datastore client initialized for {} (feed limit {})",
        settings.datastore.url, settings.datastore.feed_limit
    );

    let cache = Arc::new(FeedCache::new(
        settings.zone.cache_ttl_secs,
        settings.zone.product_cache_size,
    ));
    let hub = Arc::new(Hub::new(settings.zone.channel_capacity));

    info!(
        "Feed cache ready (TTL: {}s), hub capacity {}",
        settings.zone.cache_ttl_secs, settings.zone.channel_capacity
    );

    // Build application state
    let app_state = AppState {
        supabase,
        cache,
        hub,
        estimator,
        zone: settings.zone,
        poll: settings.poll,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
