use axum::extract::Path;
use axum::{Extension, Json};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::profile_service::{
    DependentInput, FamilyProfile, ProfileService, UpdateFamilyHead, UpsertSpouse,
};

async fn service() -> Result<ProfileService, crate::error::ApiError> {
    Ok(ProfileService::new(DatabaseManager::pool().await?))
}

/// GET /api/profil - the caller's own family profile
pub async fn get(Extension(user): Extension<AuthUser>) -> ApiResult<FamilyProfile> {
    let data = service().await?.get_profile(user.user_id).await?;
    Ok(ApiResponse::success(data))
}

/// PUT /api/profil/kepala
pub async fn update_head(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateFamilyHead>,
) -> ApiResult<FamilyProfile> {
    let data = service().await?.update_family_head(user.user_id, body).await?;
    Ok(ApiResponse::success(data))
}

/// PUT /api/profil/pasangan - create or replace the spouse record
pub async fn upsert_spouse(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpsertSpouse>,
) -> ApiResult<FamilyProfile> {
    let data = service().await?.upsert_spouse(user.user_id, body).await?;
    Ok(ApiResponse::success(data))
}

/// POST /api/profil/tanggungan
pub async fn add_dependent(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<DependentInput>,
) -> ApiResult<FamilyProfile> {
    let data = service().await?.add_dependent(user.user_id, body).await?;
    Ok(ApiResponse::created(data))
}

/// PUT /api/profil/tanggungan/:id
pub async fn update_dependent(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<DependentInput>,
) -> ApiResult<FamilyProfile> {
    let data = service()
        .await?
        .update_dependent(user.user_id, id, body)
        .await?;
    Ok(ApiResponse::success(data))
}

/// DELETE /api/profil/tanggungan/:id
pub async fn delete_dependent(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<FamilyProfile> {
    let data = service().await?.delete_dependent(user.user_id, id).await?;
    Ok(ApiResponse::success(data))
}
