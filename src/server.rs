//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Workflows API.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Url;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::agents::AgentServiceClient;
use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::repositories::{
    ComplianceRuleRepository, DocumentRepository, WorkflowSessionRepository,
};
use crate::telemetry;
use crate::workflow::{PipelineRunner, WorkflowJobStore};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub jobs: WorkflowJobStore,
    pub runner: PipelineRunner,
    pub sessions: WorkflowSessionRepository,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Every workflow and session route requires a bearer token; the service
    // root and health probe stay open.
    let protected = Router::new()
        .route("/upload-async", post(handlers::workflows::upload_async))
        .route(
            "/workflow-status/{job_id}",
            get(handlers::workflows::workflow_status),
        )
        .route("/sessions", get(handlers::sessions::list_sessions))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        // Outermost so auth rejections still carry a trace id.
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Builds the CORS layer from the configured origin allowlist. An empty list
/// keeps the permissive default used for local development.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);

    let agent_base_url = Url::parse(&config.agent_service.base_url)
        .map_err(|e| format!("Invalid agent service URL: {}", e))?;
    let processor = Arc::new(AgentServiceClient::new(
        &agent_base_url,
        Duration::from_secs(config.agent_service.timeout_seconds),
    )?);

    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        jobs: WorkflowJobStore::new(chrono::Duration::minutes(
            config.workflow_retention_minutes as i64,
        )),
        runner: PipelineRunner::new(
            processor,
            ComplianceRuleRepository::new(db.clone()),
            DocumentRepository::new(db.clone()),
        ),
        sessions: WorkflowSessionRepository::new(db),
    };
    let app = create_app(state);

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on: {}", addr);
    tracing::info!("Running in profile: {}", config.profile);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Registers the bearer scheme referenced by the protected endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::workflows::upload_async,
        crate::handlers::workflows::workflow_status,
        crate::handlers::sessions::list_sessions,
        crate::handlers::sessions::get_session,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::Health,
            crate::handlers::workflows::UploadForm,
            crate::handlers::workflows::JobAccepted,
            crate::handlers::sessions::SessionsResponse,
            crate::handlers::sessions::SessionResponse,
            crate::models::SessionSummary,
            crate::models::SessionDetail,
            crate::workflow::Job,
            crate::workflow::StageRecord,
            crate::workflow::LogEntry,
            crate::workflow::JobStatus,
            crate::workflow::StageStatus,
            crate::workflow::StageKey,
            crate::error::ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Workflows API",
        description = "Asynchronous compliance document analysis workflows",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
