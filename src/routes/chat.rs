use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::dto::chat_dto::{ChatPage, MAX_MESSAGE_LEN, NewChatMessage};
use crate::error::{ApiError, ApiResult};
use crate::routes::leagues::require_member;
use crate::services::auth_user::AuthUser;
use crate::services::league_store;
use crate::services::websocket::{LeagueEvent, send_chat_message};

/**
 * GET a page of league chat, newest first.
 */
pub async fn get_messages(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
    Query(page): Query<ChatPage>,
) -> ApiResult<impl IntoResponse> {
    league_store::fetch_league(&pool, league_id).await?;

    let limit = page.limit();
    let messages = league_store::fetch_chat(&pool, league_id, limit, page.offset()).await?;
    let has_more = messages.len() as i64 == limit;

    Ok(Json(json!({ "messages": messages, "has_more": has_more })))
}

/**
 * POST a chat message as the signed-in league member and push it to the league's sockets.
 */
pub async fn post_message(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<NewChatMessage>,
) -> ApiResult<impl IntoResponse> {
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_member(&pool, &league, &claims.sub, &config).await?;

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Message cannot be longer than {} characters",
            MAX_MESSAGE_LEN
        )));
    }

    if let Some(reply_to_id) = payload.reply_to_id {
        if league_store::fetch_chat_message(&pool, league_id, reply_to_id).await?.is_none() {
            return Err(ApiError::NotFound("Message being replied to was not found".to_string()));
        }
    }

    let now = Utc::now();
    let message_id = league_store::insert_chat(
        &pool,
        league_id,
        &claims.sub,
        message,
        &payload.message_type,
        payload.reply_to_id,
        now,
    )
    .await?;
    league_store::join_chat(&pool, league_id, &claims.sub, now).await?;

    let stored = league_store::fetch_chat_message(&pool, league_id, message_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Chat message {} vanished after insert", message_id)))?;
    send_chat_message(&tx, &stored);

    Ok((StatusCode::CREATED, Json(stored)))
}

/**
 * GET everyone who has joined the league's chat.
 */
pub async fn get_participants(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    league_store::fetch_league(&pool, league_id).await?;
    let participants = league_store::fetch_participants(&pool, league_id).await?;
    Ok(Json(participants))
}

/**
 * POST to join the league's chat.
 */
pub async fn join_chat(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_member(&pool, &league, &claims.sub, &config).await?;

    info!("{} joining chat for league {}", claims.sub, league_id);
    league_store::join_chat(&pool, league_id, &claims.sub, Utc::now()).await?;
    Ok((StatusCode::OK, Json(json!({ "message": "Joined league chat" }))))
}

/**
 * PUT to mark the league's chat as read up to now.
 */
pub async fn mark_read(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_member(&pool, &league, &claims.sub, &config).await?;

    league_store::mark_chat_read(&pool, league_id, &claims.sub, Utc::now()).await?;
    Ok((StatusCode::OK, Json(json!({ "message": "Read status updated" }))))
}
