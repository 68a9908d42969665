use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::dto::team_dto::{MovePlayer, Team};
use crate::error::{ApiError, ApiResult};
use crate::services::auth_user::AuthUser;
use crate::services::league_lock::LeagueLocks;
use crate::services::league_store;
use crate::services::websocket::{LeagueEvent, send_team_update};

/**
 * GET request to get all the teams of a league, rosters included.
 */
pub async fn get_teams(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Fetching teams for league {}.", league_id);

    let league = league_store::fetch_league(&pool, league_id).await?;
    let mut teams: Vec<Team> = league_store::load_teams(&pool, &league)
        .await?
        .into_values()
        .collect();
    teams.sort_by_key(|t| t.id);

    Ok(Json(teams))
}

/**
 * PUT request moving a rostered player between the starting lineup and the bench.
 */
pub async fn move_player(
    Extension(pool): Extension<SqlitePool>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path((league_id, team_id, player_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<MovePlayer>,
) -> ApiResult<impl IntoResponse> {
    info!("Moving player {} on team {} (starting: {})", player_id, team_id, payload.is_starting);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let team = league_store::load_team(&pool, &league, team_id).await?;

    if team.owner != claims.sub {
        return Err(ApiError::Forbidden("You do not have permission to edit this team.".to_string()));
    }

    let slot = team
        .slot(player_id)
        .ok_or_else(|| ApiError::NotFound("Player is not on this team".to_string()))?;

    if payload.is_starting && !slot.is_starting {
        let required = team.starting_requirements.get(&slot.position).copied().unwrap_or(0);
        if team.starting_count(&slot.position) >= required {
            warn!("Starting {} slots already filled on team {}", slot.position, team_id);
            return Err(ApiError::BadRequest(format!(
                "All {} starting {} slots are filled",
                required, slot.position
            )));
        }
    }

    if !payload.is_starting && slot.is_starting && team.bench_count() >= team.bench_capacity {
        return Err(ApiError::BadRequest(format!(
            "The bench already holds {} players",
            team.bench_capacity
        )));
    }

    sqlx::query("UPDATE roster_slots SET is_starting = ? WHERE league_id = ? AND team_id = ? AND player_id = ?")
        .bind(payload.is_starting)
        .bind(league_id)
        .bind(team_id)
        .bind(player_id)
        .execute(&pool)
        .await?;

    send_team_update(&pool, &tx, &league).await;
    Ok((StatusCode::OK, Json(json!({ "message": "Player position updated" }))))
}
