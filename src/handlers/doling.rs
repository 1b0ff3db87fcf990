use axum::extract::{Path, Query};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::cache::PageCache;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::doling_service::{
    AbsensiData, AbsensiInput, DolingData, DolingService, KeluargaForSelect, NewDoling,
    RekapBulanan, RiwayatKehadiran, UpdateDolingDetail,
};
use crate::types::StatusApproval;

async fn service() -> Result<DolingService, crate::error::ApiError> {
    Ok(DolingService::new(DatabaseManager::pool().await?))
}

const DOLING_PAGE: &str = "/kesekretariatan/doling";

/// ETag derived from the page revalidation version; bumps on every mutation
fn list_etag(version: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("\"doling-v{}\"", version)).ok()
}

/// GET /api/doling - all meetings, newest first
pub async fn list() -> Result<Response, ApiError> {
    let data = service().await?.list().await?;
    let version = PageCache::version(DOLING_PAGE).await;
    let mut response = ApiResponse::success(data).into_response();
    if let Some(value) = list_etag(version) {
        response.headers_mut().insert(header::ETAG, value);
    }
    Ok(response)
}

/// POST /api/doling - schedule a meeting
pub async fn create(Json(body): Json<NewDoling>) -> ApiResult<DolingData> {
    let data = service().await?.schedule(body).await?;
    Ok(ApiResponse::created(data))
}

/// GET /api/doling/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<DolingData> {
    let data = service().await?.get(id).await?;
    Ok(ApiResponse::success(data))
}

/// PATCH /api/doling/:id - partial detail update
pub async fn update(
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDolingDetail>,
) -> ApiResult<DolingData> {
    let data = service().await?.update_detail(id, body).await?;
    Ok(ApiResponse::success(data))
}

/// DELETE /api/doling/:id - meeting plus its attendance and approval
pub async fn delete(Path(id): Path<Uuid>) -> ApiResult<serde_json::Value> {
    service().await?.delete(id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct SelectionQuery {
    pub doling_id: Option<Uuid>,
}

/// GET /api/doling/keluarga - host candidates, flagged when already present
/// on a meeting's attendance sheet
pub async fn households_for_selection(
    Query(query): Query<SelectionQuery>,
) -> ApiResult<Vec<KeluargaForSelect>> {
    let data = service()
        .await?
        .households_for_selection(query.doling_id)
        .await?;
    Ok(ApiResponse::success(data))
}

/// GET /api/doling/:id/absensi
pub async fn absensi_list(Path(id): Path<Uuid>) -> ApiResult<Vec<AbsensiData>> {
    let data = service().await?.absensi_list(id).await?;
    Ok(ApiResponse::success(data))
}

/// PUT /api/doling/:id/absensi - batch attendance upsert
pub async fn record_attendance(
    Path(id): Path<Uuid>,
    Json(body): Json<Vec<AbsensiInput>>,
) -> ApiResult<Vec<AbsensiData>> {
    let svc = service().await?;
    svc.record_attendance(id, body).await?;
    let data = svc.absensi_list(id).await?;
    Ok(ApiResponse::success(data))
}

/// DELETE /api/doling/absensi/:id
pub async fn delete_attendance(Path(id): Path<Uuid>) -> ApiResult<serde_json::Value> {
    service().await?.delete_attendance(id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
    pub status: StatusApproval,
}

/// PUT /api/doling/:id/approval
pub async fn set_approval(
    Path(id): Path<Uuid>,
    Json(body): Json<ApprovalBody>,
) -> ApiResult<serde_json::Value> {
    service().await?.set_approval(id, body.status).await?;
    Ok(ApiResponse::success(serde_json::json!({
        "doa_lingkungan_id": id,
        "status": body.status
    })))
}

/// GET /api/doling/riwayat - per-household attendance percentages
pub async fn attendance_history() -> ApiResult<Vec<RiwayatKehadiran>> {
    let data = service().await?.attendance_history().await?;
    Ok(ApiResponse::success(data))
}

#[derive(Debug, Deserialize)]
pub struct RekapQuery {
    pub tahun: i32,
}

/// GET /api/doling/rekap?tahun=2025 - twelve monthly entries
pub async fn monthly_recap(Query(query): Query<RekapQuery>) -> ApiResult<Vec<RekapBulanan>> {
    let data = service().await?.monthly_recap(query.tahun).await?;
    Ok(ApiResponse::success(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_encodes_the_page_version() {
        assert_eq!(list_etag(0).unwrap().to_str().unwrap(), "\"doling-v0\"");
        assert_eq!(list_etag(7).unwrap().to_str().unwrap(), "\"doling-v7\"");
    }

    #[tokio::test]
    async fn revalidation_changes_the_list_etag() {
        let before = list_etag(PageCache::version(DOLING_PAGE).await);
        PageCache::revalidate_path(DOLING_PAGE).await;
        let after = list_etag(PageCache::version(DOLING_PAGE).await);
        assert_ne!(before, after);
    }
}
