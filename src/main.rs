use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use anyhow::Context;
use buyer_gateway::application::auth_service::AuthProxyService;
use buyer_gateway::infrastructure::backend_client::HttpBuyerBackend;
use buyer_gateway::infrastructure::config::AppConfig;
use buyer_gateway::infrastructure::logging::init_logging;
use buyer_gateway::presentation::handlers::{
    AppState, forgot_password, health_check, json_config, login, register,
};
use buyer_gateway::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use std::sync::Arc;
use tracing::{info, instrument};

fn cors(origins: &[String]) -> Cors {
    let cors = origins.iter().fold(Cors::default(), |cors, origin| {
        cors.allowed_origin(origin)
    });
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec!["x-request-id"])
        .max_age(3600)
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    init_logging();
    info!("Logging initialized successfully");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(
        backend = %config.backend_base_url,
        login_timeout_ms = config.login_timeout.as_millis(),
        forgot_password_timeout_ms = config.forgot_password_timeout.as_millis(),
        registration_timeout_ms = config.registration_timeout.as_millis(),
        validate_submissions = config.validate_submissions,
        "Configuration loaded"
    );

    let backend = HttpBuyerBackend::new(&config.backend_base_url, config.timeouts())
        .context("Failed to build backend HTTP client")?;
    let auth_service = AuthProxyService::new(Arc::new(backend), config.validate_submissions);
    let state = web::Data::new(AppState { auth_service });
    info!("Application state initialized");

    let origins: Vec<String> = config
        .cors_origins()
        .into_iter()
        .map(str::to_string)
        .collect();
    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(cors(&origins))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health_check))
                    .route("/auth/login", web::post().to(login))
                    .route("/auth/forgot-password", web::post().to(forgot_password))
                    .route("/auth/register", web::post().to(register)),
            )
    });

    let server = server
        .bind(config.bind_addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(
        address = %config.bind_addr,
        routes = %"GET /api/health, POST /api/auth/login, POST /api/auth/forgot-password, POST /api/auth/register",
        "Starting HTTP server"
    );
    server.run().await.context("HTTP server terminated with an error")
}
