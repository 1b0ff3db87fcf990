use axum::extract::Query;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::kaleidoskop_service::{
    parish_year, JenisIbadatStat, KaleidoskopService, KegiatanItem, KehadiranBulan, Ringkasan,
};

async fn service() -> Result<KaleidoskopService, crate::error::ApiError> {
    Ok(KaleidoskopService::new(DatabaseManager::pool().await?))
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub tahun: Option<i32>,
}

impl YearQuery {
    /// Default to the current year in the parish timezone
    fn year(&self) -> i32 {
        self.tahun.unwrap_or_else(|| parish_year(Utc::now()))
    }
}

/// GET /api/kaleidoskop/kegiatan
pub async fn activities(Query(query): Query<WindowQuery>) -> ApiResult<Vec<KegiatanItem>> {
    let data = service().await?.activities(query.start, query.end).await?;
    Ok(ApiResponse::success(data))
}

/// GET /api/kaleidoskop/statistik
pub async fn statistik(Query(query): Query<WindowQuery>) -> ApiResult<Vec<JenisIbadatStat>> {
    let data = service()
        .await?
        .statistik_per_jenis(query.start, query.end)
        .await?;
    Ok(ApiResponse::success(data))
}

/// GET /api/kaleidoskop/ringkasan
pub async fn ringkasan(Query(query): Query<WindowQuery>) -> ApiResult<Ringkasan> {
    let data = service().await?.ringkasan(query.start, query.end).await?;
    Ok(ApiResponse::success(data))
}

/// GET /api/kaleidoskop/kehadiran?tahun=2025
pub async fn kehadiran_per_bulan(Query(query): Query<YearQuery>) -> ApiResult<Vec<KehadiranBulan>> {
    let data = service().await?.kehadiran_per_bulan(query.year()).await?;
    Ok(ApiResponse::success(data))
}
