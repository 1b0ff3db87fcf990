// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
/// Storage failures are logged server-side with full detail and surfaced as a
/// generic localized message, never the underlying cause.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::ConfigMissing(name) => {
                tracing::error!("Missing configuration: {}", name);
                ApiError::service_unavailable("Layanan sedang tidak tersedia")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Terjadi kesalahan pada penyimpanan data")
            }
            crate::database::manager::DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Layanan sedang diperbarui, coba lagi nanti")
            }
        }
    }
}

impl From<crate::services::doling_service::DolingError> for ApiError {
    fn from(err: crate::services::doling_service::DolingError) -> Self {
        use crate::services::doling_service::DolingError;
        match err {
            DolingError::NotFound(msg) => ApiError::not_found(msg),
            DolingError::Validation(msg) => ApiError::bad_request(msg),
            DolingError::Database(sqlx_err) => {
                tracing::error!("Doling storage error: {}", sqlx_err);
                ApiError::internal_server_error("Gagal memproses data doa lingkungan")
            }
            DolingError::Decode(msg) => {
                tracing::error!("Doling decode error: {}", msg);
                ApiError::internal_server_error("Gagal memproses data doa lingkungan")
            }
        }
    }
}

impl From<crate::services::household_service::HouseholdError> for ApiError {
    fn from(err: crate::services::household_service::HouseholdError) -> Self {
        use crate::services::household_service::HouseholdError;
        match err {
            HouseholdError::NotFound(msg) => ApiError::not_found(msg),
            HouseholdError::Database(sqlx_err) => {
                tracing::error!("Household storage error: {}", sqlx_err);
                ApiError::internal_server_error("Gagal mengambil data keluarga")
            }
        }
    }
}

impl From<crate::services::profile_service::ProfileError> for ApiError {
    fn from(err: crate::services::profile_service::ProfileError) -> Self {
        use crate::services::profile_service::ProfileError;
        match err {
            ProfileError::NotFound(msg) => ApiError::not_found(msg),
            ProfileError::Validation(msg) => ApiError::bad_request(msg),
            ProfileError::Database(sqlx_err) => {
                tracing::error!("Profile storage error: {}", sqlx_err);
                ApiError::internal_server_error("Terjadi kesalahan saat memproses data profil")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
