//! JWT authentication middleware.
//!
//! Tokens are issued elsewhere; this service only verifies them.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::is_admin_role;

use crate::api::AppState;

const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 bearer token verification.
pub struct TokenVerifier {
    key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

/// Authenticated caller extracted from the JWT
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl CurrentUser {
    /// Admin-store roles may change roles and act on any record.
    pub fn is_privileged(&self) -> bool {
        is_admin_role(&self.role)
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(token)?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

pub fn require_privileged(user: &CurrentUser) -> AppResult<()> {
    if user.is_privileged() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Callers may act on their own record; privileged callers on any.
pub fn require_self_or_privileged(user: &CurrentUser, id: Uuid) -> AppResult<()> {
    if user.id == id {
        Ok(())
    } else {
        require_privileged(user)
    }
}
