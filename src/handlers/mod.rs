pub mod doling;
pub mod kaleidoskop;
pub mod profil;
pub mod umat;

use axum::Json;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

/// GET /health - liveness plus a database ping
pub async fn health() -> Result<Json<Value>, ApiError> {
    DatabaseManager::health_check().await?;
    Ok(Json(json!({
        "success": true,
        "status": "healthy"
    })))
}

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "lingkungan-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
