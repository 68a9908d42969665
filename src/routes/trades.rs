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
use tracing::{info, warn};

use crate::dto::trade_dto::{ProposeTrade, RespondTrade, TradeStatus};
use crate::error::{ApiError, ApiResult};
use crate::services::auth_user::AuthUser;
use crate::services::cache::{self, TtlCache};
use crate::services::league_lock::LeagueLocks;
use crate::services::league_store;
use crate::services::trade_engine::{apply_trade, check_proposal};
use crate::services::websocket::{LeagueEvent, send_team_update, send_trade_update};

/**
 * GET every trade in a league, newest first.
 */
pub async fn get_trades(
    Extension(pool): Extension<SqlitePool>,
    Path(league_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    league_store::fetch_league(&pool, league_id).await?;
    let trades = league_store::fetch_trades(&pool, league_id).await?;
    Ok(Json(trades))
}

/**
 * POST a trade proposal from one of the caller's teams to another team in the league.
 */
pub async fn propose_trade(
    Extension(pool): Extension<SqlitePool>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<ProposeTrade>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Team {} proposing a trade to team {} in league {}",
        payload.from_team_id, payload.to_team_id, league_id
    );

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let teams = league_store::load_teams(&pool, &league).await?;

    let from = teams
        .get(&payload.from_team_id)
        .ok_or_else(|| ApiError::NotFound("Team not found in this league".to_string()))?;
    let to = teams
        .get(&payload.to_team_id)
        .ok_or_else(|| ApiError::NotFound("Team not found in this league".to_string()))?;

    if from.owner != claims.sub {
        return Err(ApiError::Forbidden("You can only propose trades from your own team".to_string()));
    }
    check_proposal(from, to, &payload.players_offered, &payload.players_requested)?;

    let trade_id = league_store::insert_trade(&pool, league_id, &payload, Utc::now()).await?;
    let trade = league_store::fetch_trade(&pool, league_id, trade_id).await?;
    send_trade_update(&tx, "trade_proposed", &trade);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Trade proposal sent successfully", "data": trade })),
    ))
}

/**
 * POST an answer to a pending trade. Only the receiving team's owner may answer;
 * an accepted trade swaps the players in one transaction.
 */
pub async fn respond_to_trade(
    Extension(pool): Extension<SqlitePool>,
    Extension(cache): Extension<TtlCache>,
    Extension(locks): Extension<LeagueLocks>,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    AuthUser(claims): AuthUser,
    Path((league_id, trade_id)): Path<(i64, i64)>,
    Json(payload): Json<RespondTrade>,
) -> ApiResult<impl IntoResponse> {
    let response: TradeStatus = payload
        .response
        .parse()
        .ok()
        .filter(|s| *s != TradeStatus::Pending)
        .ok_or_else(|| ApiError::BadRequest("Response must be ACCEPTED or REJECTED".to_string()))?;

    info!("{} answering trade {} with {}", claims.sub, trade_id, response.as_str());

    let _guard = locks.acquire(league_id).await;
    let league = league_store::fetch_league(&pool, league_id).await?;
    let trade = league_store::fetch_trade(&pool, league_id, trade_id).await?;

    if trade.status != TradeStatus::Pending.as_str() {
        return Err(ApiError::BadRequest("This trade has already been responded to".to_string()));
    }

    let teams = league_store::load_teams(&pool, &league).await?;
    let to = teams
        .get(&trade.to_team_id)
        .ok_or_else(|| ApiError::NotFound("Team not found in this league".to_string()))?;
    if to.owner != claims.sub {
        return Err(ApiError::Forbidden("Only the receiving team can respond to this trade".to_string()));
    }

    let now = Utc::now();
    let answered = match response {
        TradeStatus::Accepted => {
            let from = teams
                .get(&trade.from_team_id)
                .ok_or_else(|| ApiError::NotFound("Team not found in this league".to_string()))?;
            let (new_from, new_to) =
                apply_trade(from, to, &trade.players_offered.0, &trade.players_requested.0).inspect_err(|e| {
                    warn!("Trade {} can no longer go through: {}", trade_id, e);
                })?;
            league_store::accept_trade(&pool, &trade, (from, to), (&new_from, &new_to), now).await?
        }
        _ => league_store::reject_trade(&pool, trade_id, now).await?,
    };
    if !answered {
        return Err(ApiError::BadRequest("This trade has already been responded to".to_string()));
    }

    let trade = league_store::fetch_trade(&pool, league_id, trade_id).await?;
    send_trade_update(&tx, "trade_responded", &trade);
    if response == TradeStatus::Accepted {
        cache.invalidate_prefix(&cache::league_prefix(league_id)).await;
        send_team_update(&pool, &tx, &league).await;
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Trade {}", response.as_str().to_lowercase()), "data": trade })),
    ))
}
