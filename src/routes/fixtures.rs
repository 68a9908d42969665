use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::dto::fixture_dto::{NextMatchupQuery, RecordScore};
use crate::error::{ApiError, ApiResult};
use crate::routes::leagues::require_commissioner;
use crate::services::auth_user::AuthUser;
use crate::services::cache::{self, TtlCache};
use crate::services::league_lock::LeagueLocks;
use crate::services::league_store;
use crate::services::websocket::{LeagueEvent, send_fixture_update};

/**
 * GET all fixtures of a league ordered by week.
 */
pub async fn get_fixtures(
    Extension(pool): Extension<SqlitePool>,
    Extension(cache): Extension<TtlCache>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let key = cache::fixtures_key(league_id);
    if let Some(cached) = cache.get(&key).await {
        return Ok(Json(cached));
    }

    league_store::fetch_league(&pool, league_id).await?;
    let fixtures = league_store::fetch_fixtures(&pool, league_id).await?;
    let value = serde_json::to_value(&fixtures)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize fixtures: {}", e)))?;

    cache.set(key, value.clone()).await;
    Ok(Json(value))
}

/**
 * GET the earliest unplayed fixture for a team.
 */
pub async fn next_matchup(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
    Query(query): Query<NextMatchupQuery>,
) -> ApiResult<impl IntoResponse> {
    let fixtures = league_store::fetch_fixtures(&pool, league_id).await?;

    let next = fixtures
        .into_iter()
        .find(|f| f.involves(query.team_id) && !f.is_played());

    match next {
        Some(fixture) => Ok(Json(json!({ "fixture": fixture }))),
        None => Ok(Json(json!({ "fixture": null, "message": "No upcoming fixtures found" }))),
    }
}

/**
 * PUT a result onto a fixture. Commissioner only; scored fixtures survive regeneration.
 */
pub async fn record_score(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path((league_id, fixture_id)): Path<(i64, i64)>,
    Json(payload): Json<RecordScore>,
) -> ApiResult<impl IntoResponse> {
    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_commissioner(&league, &claims.sub, &config)?;

    if payload.home_score < 0.0 || payload.away_score < 0.0 {
        return Err(ApiError::BadRequest("Scores must be non-negative".to_string()));
    }

    league_store::fetch_fixture(&pool, league_id, fixture_id).await?;
    league_store::record_score(&pool, fixture_id, payload.home_score, payload.away_score).await?;
    info!("Recorded {}-{} for fixture {}", payload.home_score, payload.away_score, fixture_id);

    cache.invalidate(&cache::fixtures_key(league_id)).await;
    send_fixture_update(&pool, &tx, league_id).await;

    Ok((StatusCode::OK, Json(json!({ "message": "Score recorded" }))))
}

/**
 * POST to rebuild the league's unplayed fixtures from its current teams.
 */
pub async fn regenerate_fixtures(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_commissioner(&league, &claims.sub, &config)?;

    let plan = league_store::regenerate_fixtures(&pool, &league).await?;

    cache.invalidate(&cache::fixtures_key(league_id)).await;
    send_fixture_update(&pool, &tx, league_id).await;

    Ok((StatusCode::OK, Json(json!({
        "removed": plan.remove.len(),
        "created": plan.insert.len(),
        "last_played_week": plan.last_played_week,
    }))))
}
