//! Bearer-token identity extraction.
//!
//! The identity provider is external; tokens are HS256 JWTs whose claims
//! resolve to a `{user_id, wedding_id}` pair. The pipeline trusts that pair
//! and performs no further identity verification.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use weddia_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// user_id
    pub sub: Uuid,
    pub wedding_id: Uuid,
    /// expiration timestamp
    pub exp: i64,
    /// issued at timestamp
    pub iat: i64,
}

/// Caller identity extracted from the Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub wedding_id: Uuid,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing Authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Authorization header must be a bearer token".to_string(),
            ))
        })?;

        let decoded = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| HttpAppError(AppError::Unauthorized(format!("Invalid token: {}", e))))?;

        Ok(AuthUser {
            user_id: decoded.claims.sub,
            wedding_id: decoded.claims.wedding_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn claims_round_trip_through_jwt() {
        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            wedding_id: Uuid::new_v4(),
            exp: (Utc::now().timestamp()) + 3600,
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let decoded = decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, claims.sub);
        assert_eq!(decoded.claims.wedding_id, claims.wedding_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = JwtClaims {
            sub: Uuid::new_v4(),
            wedding_id: Uuid::new_v4(),
            exp: (Utc::now().timestamp()) + 3600,
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::default(),
        )
        .is_err());
    }
}
