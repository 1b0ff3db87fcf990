use axum::extract::{Path, Query};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::KeluargaUmat;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::household_service::{HouseholdService, UlangTahun};

async fn service() -> Result<HouseholdService, crate::error::ApiError> {
    Ok(HouseholdService::new(DatabaseManager::pool().await?))
}

/// GET /api/umat - active households
pub async fn list() -> ApiResult<Vec<KeluargaUmat>> {
    let data = service().await?.list_active().await?;
    Ok(ApiResponse::success(data))
}

/// GET /api/umat/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<KeluargaUmat> {
    let data = service().await?.get(id).await?;
    Ok(ApiResponse::success(data))
}

#[derive(Debug, Deserialize)]
pub struct BirthdayQuery {
    pub bulan: Option<u32>,
}

/// GET /api/umat/ulang-tahun?bulan=8 - birthday celebrants, optionally for
/// one calendar month
pub async fn birthdays(Query(query): Query<BirthdayQuery>) -> ApiResult<Vec<UlangTahun>> {
    if let Some(bulan) = query.bulan {
        if !(1..=12).contains(&bulan) {
            return Err(ApiError::bad_request(format!(
                "Bulan tidak valid: {}",
                bulan
            )));
        }
    }
    let data = service().await?.birthdays(query.bulan).await?;
    Ok(ApiResponse::success(data))
}
