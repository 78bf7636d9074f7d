use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use staffmatch::config::Settings;
use staffmatch::core::Matcher;
use staffmatch::routes::{self, matches::AppState};
use staffmatch::services::{LogNotifier, MatchNotifier, MatchingService, PostgresRepository, WebhookNotifier};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

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
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error(e)
    })?;

    // Initialize logging; LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting staffmatch matching service...");

    // Resolve weights and tolerances before touching the database
    let profile = settings.scoring.weight_profile().map_err(|e| {
        error!("Invalid scoring configuration: {}", e);
        io_error(e)
    })?;

    let mut matcher = Matcher::new(profile, settings.matching.scoring_params())
        .and_then(|m| m.with_threshold(settings.matching.threshold))
        .map_err(|e| {
            error!("Invalid matching configuration: {}", e);
            io_error(e)
        })?;
    if let Some(max_workers) = settings.matching.max_workers {
        matcher = matcher.with_max_workers(max_workers);
    }

    info!(
        "Matcher initialized with weights: {:?}, threshold: {}",
        matcher.weights(),
        matcher.threshold()
    );

    // Initialize PostgreSQL repository
    let postgres = Arc::new(
        PostgresRepository::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            io_error(e)
        })?,
    );

    info!("PostgreSQL repository initialized");

    // Webhook notifications when configured, log-only otherwise
    let notifier: Arc<dyn MatchNotifier> = match &settings.notifications.webhook_url {
        Some(url) => {
            let timeout = Duration::from_secs(settings.notifications.timeout_secs.unwrap_or(10));
            let webhook = WebhookNotifier::new(url.clone(), settings.notifications.api_key.clone(), timeout)
                .map_err(io_error)?;
            info!("Match notifications go to {}", url);
            Arc::new(webhook)
        }
        None => {
            info!("No notification webhook configured, logging matches only");
            Arc::new(LogNotifier)
        }
    };

    let service = Arc::new(MatchingService::new(postgres.clone(), notifier, matcher));

    // Build application state
    let app_state = AppState {
        service,
        postgres: Some(postgres),
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
