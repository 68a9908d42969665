use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::Config;
use crate::dto::draft_dto::DraftStatus;
use crate::dto::league_dto::{CreateLeague, League};
use crate::dto::team_dto::JoinLeague;
use crate::error::{ApiError, ApiResult};
use crate::services::auth_user::AuthUser;
use crate::services::cache::{self, TtlCache};
use crate::services::league_lock::LeagueLocks;
use crate::services::league_store;
use crate::services::websocket::{LeagueEvent, send_fixture_update, send_team_update};

const LEAGUE_CODE_LEN: usize = 8;

fn generate_league_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(LEAGUE_CODE_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

/// League creator or the configured admin.
pub fn require_commissioner(league: &League, username: &str, config: &Config) -> ApiResult<()> {
    if league.created_by == username || config.is_admin(username) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the league commissioner can do that".to_string(),
        ))
    }
}

/// A team owner in the league, its commissioner, or the admin.
pub async fn require_member(
    pool: &SqlitePool,
    league: &League,
    username: &str,
    config: &Config,
) -> ApiResult<()> {
    if league_store::is_member(pool, league.id, username).await? {
        return Ok(());
    }
    require_commissioner(league, username, config)
        .map_err(|_| ApiError::Forbidden("You are not a member of this league".to_string()))
}

/**
 * GET all leagues.
 */
pub async fn get_leagues(
    Extension(pool): Extension<SqlitePool>,
    Extension(cache): Extension<TtlCache>,
) -> ApiResult<impl IntoResponse> {
    if let Some(cached) = cache.get(&cache::leagues_key()).await {
        return Ok(Json(cached));
    }

    info!("Fetching leagues.");
    let leagues = league_store::fetch_leagues(&pool).await?;
    let value = serde_json::to_value(&leagues)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize leagues: {}", e)))?;

    cache.set(cache::leagues_key(), value.clone()).await;
    Ok(Json(value))
}

pub async fn get_league(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let league = league_store::fetch_league(&pool, league_id).await?;
    Ok(Json(league))
}

/**
 * POST to create a league owned by the caller.
 */
pub async fn create_league(
    Extension(pool): Extension<SqlitePool>,
    Extension(cache): Extension<TtlCache>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateLeague>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating league {} for {}", payload.name, claims.sub);

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("League name is required".to_string()));
    }
    if payload.max_teams < 2 {
        return Err(ApiError::BadRequest("A league needs room for at least 2 teams".to_string()));
    }
    if payload.total_weeks < 1 || payload.playoff_weeks < 0 || payload.playoff_weeks > payload.total_weeks {
        return Err(ApiError::BadRequest(
            "Weeks must be positive and playoffs cannot outnumber them".to_string(),
        ));
    }
    if payload.starting_budget < 0 {
        return Err(ApiError::BadRequest("Starting budget must be non-negative".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leagues (name, created_by, max_teams, max_players_per_team, waiver_mode,
                             total_weeks, playoff_weeks, starting_budget, league_code, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&claims.sub)
    .bind(payload.max_teams)
    .bind(15_i64)
    .bind(payload.waiver_mode.as_str())
    .bind(payload.total_weeks)
    .bind(payload.playoff_weeks)
    .bind(payload.starting_budget)
    .bind(generate_league_code())
    .bind(Utc::now())
    .execute(&pool)
    .await?;

    cache.invalidate(&cache::leagues_key()).await;

    let league = league_store::fetch_league(&pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(league)))
}

/**
 * POST to join a league with a new team. Fixtures are rebuilt afterwards.
 */
pub async fn join_league(
    Extension(pool): Extension<SqlitePool>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<JoinLeague>,
) -> ApiResult<impl IntoResponse> {
    info!("{} joining league {}", claims.sub, league_id);

    let team_name = payload.team_name.trim();
    if team_name.is_empty() {
        return Err(ApiError::BadRequest("Team name is required".to_string()));
    }

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;

    let (already_in, team_count): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(owner = ?), 0), COUNT(*) FROM teams WHERE league_id = ?",
    )
    .bind(&claims.sub)
    .bind(league_id)
    .fetch_one(&pool)
    .await?;

    if league.draft() == DraftStatus::Live {
        return Err(ApiError::BadRequest("Cannot join while the draft is live".to_string()));
    }
    if already_in > 0 {
        return Err(ApiError::BadRequest("You are already in this league".to_string()));
    }
    if team_count >= league.max_teams {
        return Err(ApiError::BadRequest("League is full".to_string()));
    }

    let team_id = league_store::insert_team(&pool, &league, team_name, &claims.sub).await?;

    // A failed schedule rebuild leaves the old fixtures and does not undo the join.
    if let Err(e) = league_store::regenerate_fixtures(&pool, &league).await {
        error!("Failed to regenerate fixtures for league {}: {}", league_id, e);
    }

    cache.invalidate_prefix(&cache::league_prefix(league_id)).await;
    send_team_update(&pool, &tx, &league).await;
    send_fixture_update(&pool, &tx, league_id).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully joined league", "team_id": team_id })),
    ))
}

/**
 * DELETE a team from the league. Commissioner only. Unplayed fixtures are
 * rebuilt without it; played results stay.
 */
pub async fn remove_team(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path((league_id, team_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    info!("{} removing team {} from league {}", claims.sub, team_id, league_id);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_commissioner(&league, &claims.sub, &config)?;

    if league.draft() == DraftStatus::Live {
        return Err(ApiError::BadRequest("Cannot remove a team while the draft is live".to_string()));
    }

    let teams = league_store::load_teams(&pool, &league).await?;
    let team = teams
        .get(&team_id)
        .ok_or_else(|| ApiError::NotFound("Team not found in this league".to_string()))?;

    league_store::remove_team(&pool, league_id, team_id, Utc::now()).await?;

    if let Err(e) = league_store::regenerate_fixtures(&pool, &league).await {
        error!("Failed to regenerate fixtures for league {}: {}", league_id, e);
    }

    cache.invalidate_prefix(&cache::league_prefix(league_id)).await;
    send_team_update(&pool, &tx, &league).await;
    send_fixture_update(&pool, &tx, league_id).await;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Team '{}' removed from league", team.name) })),
    ))
}
