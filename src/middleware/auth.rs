use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::types::Role;

/// Authenticated user context extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = claims
            .role()
            .ok_or_else(|| format!("unknown role claim: {}", claims.role))?;
        Ok(Self {
            user_id: claims.sub,
            role,
        })
    }
}

/// Strict bearer-token middleware for endpoints that need an identity, not
/// just a page decision (profile self-service). Missing or invalid tokens
/// are a 401 here.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let reject = |msg: &str| {
        let api_error = ApiError::unauthorized(msg);
        (StatusCode::UNAUTHORIZED, Json(api_error.to_json()))
    };

    let token = extract_bearer_token(&headers).map_err(|msg| reject(&msg))?;

    let claims = validate_jwt(&token).ok_or_else(|| reject("Invalid or expired session token"))?;

    let auth_user = AuthUser::try_from(claims).map_err(|msg| reject(&msg))?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty session token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
