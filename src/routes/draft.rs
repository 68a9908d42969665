use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rand::rng;
use rand::seq::SliceRandom;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::dto::draft_dto::{DraftPickRequest, DraftState, DraftStatus, SharedDrafts};
use crate::dto::league_dto::League;
use crate::dto::team_dto::RosterSlot;
use crate::error::ApiResult;
use crate::routes::leagues::require_commissioner;
use crate::services::auth_user::AuthUser;
use crate::services::cache::{self, TtlCache};
use crate::services::draft;
use crate::services::league_lock::LeagueLocks;
use crate::services::league_store;
use crate::services::websocket::{LeagueEvent, send_draft_update, send_team_update};

/// The league's draft from memory, loading it from the database on first use.
async fn current_draft(drafts: &SharedDrafts, pool: &SqlitePool, league: &League) -> ApiResult<DraftState> {
    if let Some(state) = drafts.read().await.get(&league.id) {
        return Ok(state.clone());
    }

    info!("Loading draft state for league {} from the database.", league.id);
    let state = league_store::load_draft(pool, league).await?;
    drafts.write().await.insert(league.id, state.clone());
    Ok(state)
}

/**
 * POST to start a league's draft in a shuffled snake order. Commissioner only.
 */
pub async fn start_draft(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(drafts): Extension<SharedDrafts>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Starting draft for league {}.", league_id);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_commissioner(&league, &claims.sub, &config)?;

    let teams = league_store::load_teams(&pool, &league).await?;
    let mut pick_order = league_store::join_order(&teams);
    pick_order.shuffle(&mut rng());

    let state = draft::start(league_id, league.draft(), pick_order)?;
    league_store::save_draft(&pool, &state, None).await?;
    drafts.write().await.insert(league_id, state.clone());
    info!("Saved draft for league {} to db.", league_id);

    cache.invalidate(&cache::leagues_key()).await;
    send_draft_update(&tx, &state);

    Ok((StatusCode::OK, Json(json!({ "message": "Draft started", "draft_state": state }))))
}

/**
 * GET the draft status, pick order and picks so far.
 */
pub async fn get_draft(
    Extension(pool): Extension<SqlitePool>,
    Extension(drafts): Extension<SharedDrafts>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let league = league_store::fetch_league(&pool, league_id).await?;
    let state = current_draft(&drafts, &pool, &league).await?;
    let on_the_clock = draft::on_the_clock(&state).filter(|_| state.status == DraftStatus::Live);

    Ok(Json(json!({ "draft_state": state, "on_the_clock": on_the_clock })))
}

/**
 * POST a pick for the team on the clock. Only that team's owner may pick.
 */
pub async fn draft_pick(
    Extension(pool): Extension<SqlitePool>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(drafts): Extension<SharedDrafts>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<DraftPickRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("{} drafting player {} in league {}", claims.sub, payload.player_id, league_id);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let player = league_store::fetch_player(&pool, payload.player_id).await?;

    let mut teams = league_store::load_teams(&pool, &league).await?;
    let mut state = current_draft(&drafts, &pool, &league).await?;

    let pick = draft::make_pick(
        &mut state,
        &mut teams,
        &claims.sub,
        player.id,
        &player.fantasy_position,
    )?;
    let slot = RosterSlot {
        player_id: pick.player_id,
        position: pick.position.clone(),
        is_starting: pick.is_starting,
    };

    league_store::save_draft(&pool, &state, Some((pick.team_id, &slot))).await?;
    drafts.write().await.insert(league_id, state.clone());

    if state.status == DraftStatus::Completed {
        info!("Draft for league {} completed with the last pick.", league_id);
        cache.invalidate(&cache::leagues_key()).await;
    }
    cache.invalidate_prefix(&cache::league_prefix(league_id)).await;
    send_draft_update(&tx, &state);
    send_team_update(&pool, &tx, &league).await;

    Ok((StatusCode::OK, Json(json!({
        "message": format!("{} drafted", player.name),
        "pick": pick,
        "draft_state": state,
    }))))
}

/**
 * POST to close a live draft early. Commissioner only.
 */
pub async fn complete_draft(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(drafts): Extension<SharedDrafts>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Completing draft for league {}.", league_id);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_commissioner(&league, &claims.sub, &config)?;

    let mut state = current_draft(&drafts, &pool, &league).await?;
    draft::complete(&mut state)?;

    league_store::save_draft(&pool, &state, None).await?;
    drafts.write().await.insert(league_id, state.clone());

    cache.invalidate(&cache::leagues_key()).await;
    send_draft_update(&tx, &state);

    Ok((StatusCode::OK, Json(json!({ "message": "Draft completed", "draft_state": state }))))
}
