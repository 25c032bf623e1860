//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `"ok"` while the process serves traffic.
    pub status: &'static str,
}

/// Liveness probe.
pub async fn health_check() -> Json<Health> {
    Json(Health { status: "ok" })
}
