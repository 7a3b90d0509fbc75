//! Authentication middleware
//!
//! Decodes the bearer JWT and attaches the caller's owner scope to the
//! request. Handlers trust that scope completely.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::AppState;

/// Authenticated caller extracted from the JWT
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    /// Tenant whose ledger, properties and requests the caller may touch
    pub owner_id: Uuid,
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    owner_id: String,
    exp: i64,
    iat: i64,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let auth_user = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(user) => user,
        Err(msg) => return unauthorized_response(&msg),
    };

    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// Sign a token for a user acting within an owner scope
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    owner_id: Uuid,
    ttl: chrono::Duration,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        owner_id: owner_id.to_string(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(e.into()))
}

fn decode_jwt(token: &str, secret: &str) -> Result<AuthUser, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))?;

    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token".to_string())?;
    let owner_id =
        Uuid::parse_str(&claims.owner_id).map_err(|_| "Invalid owner ID in token".to_string())?;

    Ok(AuthUser { user_id, owner_id })
}

fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHENTICATED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| unauthorized_response("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_decodes_to_same_scope() {
        let user_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let token = issue_token("secret", user_id, owner_id, chrono::Duration::hours(1)).unwrap();

        let user = decode_jwt(&token, "secret").unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.owner_id, owner_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(
            "secret",
            Uuid::new_v4(),
            Uuid::new_v4(),
            chrono::Duration::hours(1),
        )
        .unwrap();
        assert!(decode_jwt(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(
            "secret",
            Uuid::new_v4(),
            Uuid::new_v4(),
            chrono::Duration::hours(-2),
        )
        .unwrap();
        assert!(decode_jwt(&token, "secret").is_err());
    }
}
