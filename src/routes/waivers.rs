use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
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
use crate::dto::waiver_dto::{ClaimRequest, ClaimStatus, ProcessSummary, UpdateClaimPriority};
use crate::error::{ApiError, ApiResult};
use crate::routes::leagues::require_commissioner;
use crate::services::auth_user::AuthUser;
use crate::services::claim_validator::validate_claim;
use crate::services::league_lock::LeagueLocks;
use crate::services::league_store;
use crate::services::waiver_engine::{self, resolve};
use crate::services::websocket::{LeagueEvent, send_team_update, send_waiver_update};

/**
 * GET every waiver claim in a league, processed ones included.
 */
pub async fn get_claims(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    league_store::fetch_league(&pool, league_id).await?;
    let claims = league_store::fetch_claims(&pool, league_id).await?;
    Ok(Json(claims))
}

/**
 * POST a waiver claim. Rule violations are rejected here and never become pending.
 */
pub async fn submit_claim(
    Extension(pool): Extension<SqlitePool>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<ClaimRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Team {} claiming player {} in league {}", payload.team_id, payload.player_id, league_id);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let team = league_store::load_team(&pool, &league, payload.team_id).await?;

    let player = league_store::fetch_player(&pool, payload.player_id).await?;

    validate_claim(&team, &claims.sub, &payload, &player.fantasy_position, league.mode())?;

    let (claim_id, priority) = league_store::insert_claim(
        &pool,
        league_id,
        &payload,
        &player.fantasy_position,
        Utc::now(),
    )
    .await?;

    let data = json!({
        "id": claim_id,
        "team_id": payload.team_id,
        "player_id": payload.player_id,
        "players_to_drop": payload.players_to_drop,
        "priority": priority,
        "bid_amount": payload.bid_amount,
        "status": ClaimStatus::Pending,
    });
    send_waiver_update(&tx, league_id, "waiver_claim_added", data.clone());

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Waiver claim submitted successfully", "data": data })),
    ))
}

/**
 * DELETE a pending claim. The claiming team's owner or the commissioner may withdraw it.
 */
pub async fn delete_claim(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path((league_id, claim_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    info!("Withdrawing waiver claim {} in league {}", claim_id, league_id);

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let claim = league_store::fetch_claim(&pool, league_id, claim_id).await?;

    if claim.status != ClaimStatus::Pending.as_str() {
        return Err(ApiError::BadRequest("Only pending claims can be withdrawn".to_string()));
    }

    let owns_claim = league_store::load_teams(&pool, &league)
        .await?
        .get(&claim.team_id)
        .is_some_and(|t| t.owner == claims.sub);
    if !owns_claim {
        require_commissioner(&league, &claims.sub, &config)?;
    }

    sqlx::query("DELETE FROM waiver_claims WHERE id = ? AND league_id = ? AND status = ?")
        .bind(claim_id)
        .bind(league_id)
        .bind(ClaimStatus::Pending.as_str())
        .execute(&pool)
        .await?;

    send_waiver_update(&tx, league_id, "waiver_claim_deleted", json!({ "claim_id": claim_id }));
    Ok((StatusCode::OK, Json(json!({ "message": "Waiver claim deleted successfully" }))))
}

/**
 * PUT a new rank on a pending claim within its team's own claims. Lower ranks
 * are tried first when the team's turn comes up in a PRIORITY run.
 */
pub async fn update_claim_priority(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path((league_id, claim_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateClaimPriority>,
) -> ApiResult<impl IntoResponse> {
    info!("Setting priority {} on waiver claim {} in league {}", payload.priority, claim_id, league_id);

    if payload.priority < 1 {
        return Err(ApiError::BadRequest("priority must be at least 1".to_string()));
    }

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let claim = league_store::fetch_claim(&pool, league_id, claim_id).await?;

    let owns_claim = league_store::load_teams(&pool, &league)
        .await?
        .get(&claim.team_id)
        .is_some_and(|t| t.owner == claims.sub);
    if !owns_claim {
        require_commissioner(&league, &claims.sub, &config)?;
    }

    if !league_store::update_claim_priority(&pool, league_id, claim_id, payload.priority).await? {
        return Err(ApiError::BadRequest("Only pending claims can be reordered".to_string()));
    }

    let data = json!({ "claim_id": claim_id, "new_priority": payload.priority });
    send_waiver_update(&tx, league_id, "waiver_priority_updated", data.clone());

    Ok((StatusCode::OK, Json(json!({ "message": "Waiver priority updated", "data": data }))))
}

/**
 * POST to run waivers for a league. Commissioner only.
 */
pub async fn process_waivers(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    require_commissioner(&league, &claims.sub, &config)?;

    let mode = league.mode();
    info!("Processing waivers for league {} in {} mode.", league_id, mode.as_str());

    let teams = league_store::load_teams(&pool, &league).await?;
    let pending = league_store::load_pending_claims(&pool, league_id).await?;

    let result = resolve(&pending, &teams, mode, Utc::now())?;
    league_store::apply_resolution(&pool, league_id, &teams, &result).await?;

    let summary = ProcessSummary {
        processed_count: result.outcomes.len(),
        approved_count: result.approved_count(),
        rejected_count: result.rejected_count(),
        priority_order: result.priority_order.clone(),
    };

    send_waiver_update(
        &tx,
        league_id,
        "waivers_processed",
        json!({ "summary": summary, "outcomes": result.outcomes }),
    );
    send_team_update(&pool, &tx, &league).await;

    Ok((StatusCode::OK, Json(json!({
        "message": "Waivers processed successfully",
        "processed_count": summary.processed_count,
        "approved_count": summary.approved_count,
        "rejected_count": summary.rejected_count,
        "priority_order": summary.priority_order,
        "outcomes": result.outcomes,
    }))))
}

/**
 * GET the league's current waiver order, best priority first.
 */
pub async fn get_waiver_order(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let league = league_store::fetch_league(&pool, league_id).await?;
    let teams = league_store::load_teams(&pool, &league).await?;

    let order: Vec<_> = waiver_engine::current_priority_order(&teams)
        .into_iter()
        .filter_map(|id| teams.get(&id))
        .map(|t| json!({
            "team_id": t.id,
            "team_name": t.name,
            "waiver_priority": t.waiver_priority,
            "faab_budget": t.faab_budget,
        }))
        .collect();

    Ok(Json(order))
}
