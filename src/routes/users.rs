use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::dto::claims_dto::Claims;
use crate::dto::user_dto::{CreateUser, LoginUser, User};
use crate::error::{ApiError, ApiResult};
use crate::services::auth_user::AuthUser;
use crate::services::password::{hash_password, verify_password};

pub async fn create_user(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<CreateUser>,
) -> ApiResult<impl IntoResponse> {
    info!("Registering user {}", payload.username);

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    }

    /* First check if the user with that user name already exists */
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&payload.username)
        .fetch_one(&pool)
        .await?;

    if existing > 0 {
        return Err(ApiError::Conflict("That username already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO users (name, username, email, password_hash)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(password_hash)
    .execute(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("Successfully created user \"{}\"", payload.username) })),
    ))
}

pub async fn remove_user(
    AuthUser(claims): AuthUser,
    Extension(pool): Extension<SqlitePool>,
) -> ApiResult<impl IntoResponse> {
    let username = claims.sub;
    info!("Removing user {}", username);

    sqlx::query("DELETE FROM users WHERE username = ?")
        .bind(&username)
        .execute(&pool)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "message": format!("Successfully removed {}", username) }))))
}

/* POST to login the user */
pub async fn login_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<LoginUser>,
) -> ApiResult<impl IntoResponse> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, username, email, password_hash FROM users WHERE username = ?",
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("User was not found.".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!("Failed login for {}", payload.username);
        return Err(ApiError::Unauthorized("Incorrect username or password.".to_string()));
    }

    let claims = Claims {
        sub: user.username.clone(),
        exp: (Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token encoding failed: {}", e)))?;

    Ok((StatusCode::OK, Json(json!({ "token": token, "user": user }))))
}
