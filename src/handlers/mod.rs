//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Workflows API.

use crate::models::ServiceInfo;
use axum::response::Json;
use serde::Serialize;
use utoipa::ToSchema;

pub mod sessions;
pub mod workflows;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness probe response
#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Health)
    ),
    tag = "root"
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
