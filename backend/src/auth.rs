use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    extract::{Json, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::AppState;

const TOKEN_TTL_HOURS: i64 = 24;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<RegisterResp>), AppError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Ledger(shoe_ledger::stat::LedgerError::InvalidInput(
            "email and password are required".into(),
        )));
    }
    let user_id = Uuid::new_v4();
    let password_hash =
        hash_password(&payload.password).map_err(|e| AppError::Internal(format!("hash error: {e}")))?;

    sqlx::query(
        r#"INSERT INTO users (id, email, password_hash)
        VALUES ($1, $2, $3)"#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(password_hash)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            AppError::Conflict
        } else {
            AppError::Database(e)
        }
    })?;

    info!(%user_id, "registered user");
    Ok((StatusCode::CREATED, Json(RegisterResp { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<LoginResp>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let row: Option<UserRow> = sqlx::query_as(r#"SELECT id, password_hash FROM users WHERE email = $1"#)
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;

    let bad_login = || AppError::Unauthorized("invalid email or password".into());
    let Some(row) = row else {
        return Err(bad_login());
    };
    let is_valid = verify_password(&payload.password, &row.password_hash)
        .map_err(|e| AppError::Internal(format!("verify error: {e}")))?;
    if !is_valid {
        return Err(bad_login());
    }

    let token = encode_jwt(row.id, &state.jwt_secret)?;
    Ok(Json(LoginResp { token, user_id: row.id }))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn encode_jwt(user_id: Uuid, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("jwt encode error: {e}")))
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| AppError::Unauthorized(format!("invalid token: {e}")))?;
    Ok(data.claims)
}

/// Resolves the bearer token to an [`AuthUser`] extension for protected routes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("invalid Authorization scheme".into()))?;

    let claims = decode_jwt(token, &state.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid sub in token".into()))?;

    req.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize,
    pub iat: usize,
    /// user id as a uuid string
    pub sub: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResp {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct LoginResp {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("tempo-run").unwrap();
        assert!(verify_password("tempo-run", &hash).unwrap());
        assert!(!verify_password("easy-run", &hash).unwrap());
    }

    #[test]
    fn token_round_trips_with_the_same_secret() {
        let id = Uuid::new_v4();
        let token = encode_jwt(id, "s3cret").unwrap();
        let claims = decode_jwt(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_another_secret_is_unauthorized() {
        let token = encode_jwt(Uuid::new_v4(), "one").unwrap();
        let err = decode_jwt(&token, "two").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
