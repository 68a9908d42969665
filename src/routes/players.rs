use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::dto::player_dto::{Player, UpsertPlayer};
use crate::error::{ApiError, ApiResult};
use crate::services::auth_user::AuthUser;

/**
 * GET the rugby player pool.
 */
pub async fn get_players(
    Extension(pool): Extension<SqlitePool>,
) -> ApiResult<impl IntoResponse> {
    let players = sqlx::query_as::<_, Player>(
        "SELECT id, name, club, position, fantasy_position FROM players ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(players)))
}

/**
 * POST a batch of players into the pool. Admin only.
 */
pub async fn upsert_players(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<Vec<UpsertPlayer>>,
) -> ApiResult<impl IntoResponse> {
    if !config.is_admin(&claims.sub) {
        return Err(ApiError::Forbidden("You must be an admin to load players.".to_string()));
    }

    info!("Saving {} players.", payload.len());
    save_players(&pool, &payload).await?;

    Ok((StatusCode::OK, Json(json!({ "saved": payload.len() }))))
}

pub async fn save_players(
    pool: &SqlitePool,
    players: &[UpsertPlayer],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for player in players {
        sqlx::query(
            r#"
            INSERT INTO players (id, name, club, position, fantasy_position)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                club = excluded.club,
                position = excluded.position,
                fantasy_position = excluded.fantasy_position
            "#,
        )
        .bind(player.id)
        .bind(&player.name)
        .bind(&player.club)
        .bind(&player.position)
        .bind(&player.fantasy_position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}
