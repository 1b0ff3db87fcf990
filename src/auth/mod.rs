use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::types::Role;

/// Session claims consumed by the access controller. Tokens are issued by
/// the external auth collaborator; this API only reads the role claim.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            role: role.as_code().to_string(),
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn role(&self) -> Option<Role> {
        Role::from_code(&self.role)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Token helper used by fixtures and operational tooling; the API itself
/// never issues sessions.
pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate a bearer token and extract claims. Invalid or expired tokens
/// are treated as absence of a session, not as a hard failure.
pub fn validate_jwt(token: &str) -> Option<Claims> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return None;
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .ok()
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_role() {
        let claims = Claims::new(Uuid::new_v4(), Role::Sekretaris);
        let token = generate_jwt(claims).expect("token");
        let decoded = validate_jwt(&token).expect("claims");
        assert_eq!(decoded.role(), Some(Role::Sekretaris));
    }

    #[test]
    fn garbage_token_yields_no_session() {
        assert!(validate_jwt("not-a-token").is_none());
    }
}
