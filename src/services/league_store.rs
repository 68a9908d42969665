use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use sqlx::types::Json;
use tracing::{info, warn};

use crate::dto::chat_dto::{ChatMessage, ChatParticipant};
use crate::dto::draft_dto::{DraftState, DraftStateRow};
use crate::dto::fixture_dto::Fixture;
use crate::dto::league_dto::League;
use crate::dto::player_dto::Player;
use crate::dto::team_dto::{
    BENCH_CAPACITY, RosterSlot, RosterSlotRow, Team, TeamId, TeamRow, default_starting_requirements,
};
use crate::dto::trade_dto::{ProposeTrade, Trade, TradeStatus};
use crate::dto::waiver_dto::{ClaimRequest, ClaimStatus, RejectReason, WaiverClaim, WaiverClaimRow};
use crate::error::{ApiError, ApiResult};
use crate::services::fixture_scheduler::{self, RegenerationPlan};
use crate::services::waiver_engine::ResolutionResult;

const LEAGUE_COLUMNS: &str = "id, name, created_by, max_teams, max_players_per_team, waiver_mode, \
     total_weeks, playoff_weeks, starting_budget, league_code, draft_status, created_at";

const CLAIM_COLUMNS: &str = "id, league_id, team_id, player_id, player_position, drop_player_ids, \
     priority, bid, submitted_at, status, processed_at, reject_reason";

const TRADE_COLUMNS: &str = "id, league_id, from_team_id, to_team_id, players_offered, players_requested, \
     status, created_at, responded_at";

const CHAT_SELECT: &str = "SELECT m.id, m.league_id, m.username, t.name AS team_name, m.message, \
     m.message_type, m.reply_to_id, m.created_at \
     FROM chat_messages m LEFT JOIN teams t ON t.league_id = m.league_id AND t.owner = m.username";

const FIXTURE_COLUMNS: &str =
    "id, league_id, week_number, home_team_id, away_team_id, home_score, away_score, is_playoff";

pub async fn fetch_leagues(pool: &SqlitePool) -> Result<Vec<League>, sqlx::Error> {
    sqlx::query_as::<_, League>(&format!("SELECT {} FROM leagues ORDER BY id", LEAGUE_COLUMNS))
        .fetch_all(pool)
        .await
}

pub async fn fetch_league(pool: &SqlitePool, league_id: i64) -> ApiResult<League> {
    sqlx::query_as::<_, League>(&format!("SELECT {} FROM leagues WHERE id = ?", LEAGUE_COLUMNS))
        .bind(league_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("League not found".to_string()))
}

pub async fn fetch_player(pool: &SqlitePool, player_id: i64) -> ApiResult<Player> {
    sqlx::query_as::<_, Player>("SELECT id, name, club, position, fantasy_position FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Player not found".to_string()))
}

/// Every team in the league with its roster, keyed by id.
pub async fn load_teams(pool: &SqlitePool, league: &League) -> Result<HashMap<TeamId, Team>, sqlx::Error> {
    let team_rows = sqlx::query_as::<_, TeamRow>(
        "SELECT id, league_id, name, owner, waiver_priority, faab_budget FROM teams WHERE league_id = ?",
    )
    .bind(league.id)
    .fetch_all(pool)
    .await?;

    let slot_rows = sqlx::query_as::<_, RosterSlotRow>(
        "SELECT team_id, player_id, position, is_starting FROM roster_slots WHERE league_id = ? ORDER BY rowid",
    )
    .bind(league.id)
    .fetch_all(pool)
    .await?;

    let mut teams: HashMap<TeamId, Team> = team_rows
        .into_iter()
        .map(|row| {
            let team = Team {
                id: row.id,
                league_id: row.league_id,
                name: row.name,
                owner: row.owner,
                waiver_priority: row.waiver_priority,
                faab_budget: row.faab_budget,
                roster: Vec::new(),
                roster_limit: league.max_players_per_team.max(0) as usize,
                bench_capacity: BENCH_CAPACITY,
                starting_requirements: default_starting_requirements(),
            };
            (team.id, team)
        })
        .collect();

    for slot in slot_rows {
        match teams.get_mut(&slot.team_id) {
            Some(team) => team.roster.push(RosterSlot {
                player_id: slot.player_id,
                position: slot.position,
                is_starting: slot.is_starting,
            }),
            None => warn!("Roster slot for player {} points at missing team {}", slot.player_id, slot.team_id),
        }
    }

    Ok(teams)
}

pub async fn load_team(pool: &SqlitePool, league: &League, team_id: TeamId) -> ApiResult<Team> {
    load_teams(pool, league)
        .await?
        .remove(&team_id)
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))
}

/// Teams in join order.
pub fn join_order(teams: &HashMap<TeamId, Team>) -> Vec<TeamId> {
    let mut ids: Vec<TeamId> = teams.keys().copied().collect();
    ids.sort_unstable();
    ids
}

pub async fn insert_team(
    pool: &SqlitePool,
    league: &League,
    name: &str,
    owner: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let next_priority: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(waiver_priority), 0) + 1 FROM teams WHERE league_id = ?",
    )
    .bind(league.id)
    .fetch_one(&mut *tx)
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO teams (league_id, name, owner, waiver_priority, faab_budget)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(league.id)
    .bind(name)
    .bind(owner)
    .bind(next_priority)
    .bind(league.starting_budget)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn fetch_claims(pool: &SqlitePool, league_id: i64) -> Result<Vec<WaiverClaimRow>, sqlx::Error> {
    sqlx::query_as::<_, WaiverClaimRow>(&format!(
        "SELECT {} FROM waiver_claims WHERE league_id = ? ORDER BY team_id, priority, submitted_at, id",
        CLAIM_COLUMNS
    ))
    .bind(league_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_claim(pool: &SqlitePool, league_id: i64, claim_id: i64) -> ApiResult<WaiverClaimRow> {
    sqlx::query_as::<_, WaiverClaimRow>(&format!(
        "SELECT {} FROM waiver_claims WHERE league_id = ? AND id = ?",
        CLAIM_COLUMNS
    ))
    .bind(league_id)
    .bind(claim_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Waiver claim not found".to_string()))
}

pub async fn load_pending_claims(pool: &SqlitePool, league_id: i64) -> ApiResult<Vec<WaiverClaim>> {
    let rows = sqlx::query_as::<_, WaiverClaimRow>(&format!(
        "SELECT {} FROM waiver_claims WHERE league_id = ? AND status = ? ORDER BY submitted_at, id",
        CLAIM_COLUMNS
    ))
    .bind(league_id)
    .bind(ClaimStatus::Pending.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| WaiverClaim::try_from(row).map_err(ApiError::Internal))
        .collect()
}

/// Stores a pending claim at the back of its team's own ranking. Returns the
/// claim id and that rank.
pub async fn insert_claim(
    pool: &SqlitePool,
    league_id: i64,
    request: &ClaimRequest,
    player_position: &str,
    submitted_at: DateTime<Utc>,
) -> Result<(i64, i64), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let priority: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(priority), 0) + 1 FROM waiver_claims WHERE league_id = ? AND team_id = ? AND status = ?",
    )
    .bind(league_id)
    .bind(request.team_id)
    .bind(ClaimStatus::Pending.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO waiver_claims
            (league_id, team_id, player_id, player_position, drop_player_ids, priority, bid, submitted_at, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(league_id)
    .bind(request.team_id)
    .bind(request.player_id)
    .bind(player_position)
    .bind(Json(&request.players_to_drop))
    .bind(priority)
    .bind(request.bid_amount)
    .bind(submitted_at)
    .bind(ClaimStatus::Pending.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((result.last_insert_rowid(), priority))
}

/// False when the claim was no longer pending.
pub async fn update_claim_priority(
    pool: &SqlitePool,
    league_id: i64,
    claim_id: i64,
    priority: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE waiver_claims SET priority = ? WHERE id = ? AND league_id = ? AND status = ?")
        .bind(priority)
        .bind(claim_id)
        .bind(league_id)
        .bind(ClaimStatus::Pending.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Writes a whole waiver run in one transaction: claim statuses, budgets,
/// priorities and roster swaps. `before` is the snapshot the run started from.
pub async fn apply_resolution(
    pool: &SqlitePool,
    league_id: i64,
    before: &HashMap<TeamId, Team>,
    result: &ResolutionResult,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for outcome in &result.outcomes {
        sqlx::query(
            r#"
            UPDATE waiver_claims
            SET status = ?, processed_at = ?, reject_reason = ?
            WHERE id = ? AND league_id = ? AND status = ?
            "#,
        )
        .bind(outcome.status.as_str())
        .bind(outcome.processed_at)
        .bind(outcome.reason.map(|r| r.as_str()))
        .bind(outcome.claim_id)
        .bind(league_id)
        .bind(ClaimStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;
    }

    for (team_id, team) in &result.teams {
        sqlx::query("UPDATE teams SET faab_budget = ?, waiver_priority = ? WHERE id = ?")
            .bind(team.faab_budget)
            .bind(team.waiver_priority)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
    }

    /* Drops go first; a dropped player may have been picked up by another team in the same run */
    for (team_id, team) in &result.teams {
        delete_departed(&mut *tx, league_id, old_roster(before, *team_id), team).await?;
    }
    for (team_id, team) in &result.teams {
        insert_arrivals(&mut *tx, league_id, old_roster(before, *team_id), team).await?;
    }

    tx.commit().await?;
    info!(
        "Stored waiver run for league {}: {} approved, {} rejected.",
        league_id,
        result.approved_count(),
        result.rejected_count()
    );
    Ok(())
}

fn old_roster(before: &HashMap<TeamId, Team>, team_id: TeamId) -> &[RosterSlot] {
    before.get(&team_id).map(|t| t.roster.as_slice()).unwrap_or_default()
}

async fn delete_departed(
    conn: &mut SqliteConnection,
    league_id: i64,
    old: &[RosterSlot],
    team: &Team,
) -> Result<(), sqlx::Error> {
    for slot in old {
        if !team.has_player(slot.player_id) {
            sqlx::query("DELETE FROM roster_slots WHERE league_id = ? AND team_id = ? AND player_id = ?")
                .bind(league_id)
                .bind(team.id)
                .bind(slot.player_id)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn insert_arrivals(
    conn: &mut SqliteConnection,
    league_id: i64,
    old: &[RosterSlot],
    team: &Team,
) -> Result<(), sqlx::Error> {
    for slot in &team.roster {
        if !old.iter().any(|s| s.player_id == slot.player_id) {
            insert_slot(&mut *conn, league_id, team.id, slot).await?;
        }
    }
    Ok(())
}

async fn insert_slot(
    conn: &mut SqliteConnection,
    league_id: i64,
    team_id: TeamId,
    slot: &RosterSlot,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO roster_slots (league_id, team_id, player_id, position, is_starting)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(league_id)
    .bind(team_id)
    .bind(slot.player_id)
    .bind(&slot.position)
    .bind(slot.is_starting)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn is_member(pool: &SqlitePool, league_id: i64, username: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE league_id = ? AND owner = ?")
        .bind(league_id)
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Deletes a team and its roster. Its pending claims are rejected and its
/// pending trades are turned down in the same transaction.
pub async fn remove_team(
    pool: &SqlitePool,
    league_id: i64,
    team_id: TeamId,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE waiver_claims SET status = ?, processed_at = ?, reject_reason = ?
        WHERE league_id = ? AND team_id = ? AND status = ?
        "#,
    )
    .bind(ClaimStatus::Rejected.as_str())
    .bind(at)
    .bind(RejectReason::TeamNotFound.as_str())
    .bind(league_id)
    .bind(team_id)
    .bind(ClaimStatus::Pending.as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE trades SET status = ?, responded_at = ?
        WHERE league_id = ? AND status = ? AND (from_team_id = ? OR to_team_id = ?)
        "#,
    )
    .bind(TradeStatus::Rejected.as_str())
    .bind(at)
    .bind(league_id)
    .bind(TradeStatus::Pending.as_str())
    .bind(team_id)
    .bind(team_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM roster_slots WHERE league_id = ? AND team_id = ?")
        .bind(league_id)
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM teams WHERE league_id = ? AND id = ?")
        .bind(league_id)
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Removed team {} from league {}.", team_id, league_id);
    Ok(())
}

/// The stored draft, or a fresh one carrying the league's status.
pub async fn load_draft(pool: &SqlitePool, league: &League) -> Result<DraftState, sqlx::Error> {
    let row = sqlx::query_as::<_, DraftStateRow>(
        "SELECT league_id, pick_order, current_turn, direction, picks FROM draft_state WHERE league_id = ?",
    )
    .bind(league.id)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some(row) => DraftState {
            league_id: row.league_id,
            status: league.draft(),
            pick_order: row.pick_order.0,
            current_turn: row.current_turn.max(0) as usize,
            direction: row.direction,
            picks: row.picks.0,
        },
        None => DraftState {
            status: league.draft(),
            ..DraftState::not_started(league.id)
        },
    })
}

/// Saves the draft and the league's draft status together, plus the roster
/// slot of a pick when there is one.
pub async fn save_draft(
    pool: &SqlitePool,
    state: &DraftState,
    pick: Option<(TeamId, &RosterSlot)>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO draft_state (league_id, pick_order, current_turn, direction, picks)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(league_id) DO UPDATE SET
            pick_order = excluded.pick_order,
            current_turn = excluded.current_turn,
            direction = excluded.direction,
            picks = excluded.picks
        "#,
    )
    .bind(state.league_id)
    .bind(Json(&state.pick_order))
    .bind(state.current_turn as i64)
    .bind(state.direction)
    .bind(Json(&state.picks))
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE leagues SET draft_status = ? WHERE id = ?")
        .bind(state.status.as_str())
        .bind(state.league_id)
        .execute(&mut *tx)
        .await?;

    if let Some((team_id, slot)) = pick {
        insert_slot(&mut *tx, state.league_id, team_id, slot).await?;
    }

    tx.commit().await
}

pub async fn insert_trade(
    pool: &SqlitePool,
    league_id: i64,
    proposal: &ProposeTrade,
    created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO trades (league_id, from_team_id, to_team_id, players_offered, players_requested, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(league_id)
    .bind(proposal.from_team_id)
    .bind(proposal.to_team_id)
    .bind(Json(&proposal.players_offered))
    .bind(Json(&proposal.players_requested))
    .bind(TradeStatus::Pending.as_str())
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn fetch_trades(pool: &SqlitePool, league_id: i64) -> Result<Vec<Trade>, sqlx::Error> {
    sqlx::query_as::<_, Trade>(&format!(
        "SELECT {} FROM trades WHERE league_id = ? ORDER BY created_at DESC, id DESC",
        TRADE_COLUMNS
    ))
    .bind(league_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_trade(pool: &SqlitePool, league_id: i64, trade_id: i64) -> ApiResult<Trade> {
    sqlx::query_as::<_, Trade>(&format!(
        "SELECT {} FROM trades WHERE league_id = ? AND id = ?",
        TRADE_COLUMNS
    ))
    .bind(league_id)
    .bind(trade_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Trade not found".to_string()))
}

/// False when the trade had already been answered.
pub async fn reject_trade(
    pool: &SqlitePool,
    trade_id: i64,
    responded_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE trades SET status = ?, responded_at = ? WHERE id = ? AND status = ?")
        .bind(TradeStatus::Rejected.as_str())
        .bind(responded_at)
        .bind(trade_id)
        .bind(TradeStatus::Pending.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Marks the trade accepted and swaps the rosters in one transaction.
/// False, with nothing written, when the trade had already been answered.
pub async fn accept_trade(
    pool: &SqlitePool,
    trade: &Trade,
    before: (&Team, &Team),
    after: (&Team, &Team),
    responded_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE trades SET status = ?, responded_at = ? WHERE id = ? AND status = ?")
        .bind(TradeStatus::Accepted.as_str())
        .bind(responded_at)
        .bind(trade.id)
        .bind(TradeStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    for (old, new) in [(before.0, after.0), (before.1, after.1)] {
        delete_departed(&mut *tx, trade.league_id, &old.roster, new).await?;
    }
    for (old, new) in [(before.0, after.0), (before.1, after.1)] {
        insert_arrivals(&mut *tx, trade.league_id, &old.roster, new).await?;
    }

    tx.commit().await?;
    info!("Trade {} accepted in league {}.", trade.id, trade.league_id);
    Ok(true)
}

/// Newest first.
pub async fn fetch_chat(
    pool: &SqlitePool,
    league_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "{} WHERE m.league_id = ? ORDER BY m.created_at DESC, m.id DESC LIMIT ? OFFSET ?",
        CHAT_SELECT
    ))
    .bind(league_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn fetch_chat_message(
    pool: &SqlitePool,
    league_id: i64,
    message_id: i64,
) -> Result<Option<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!("{} WHERE m.league_id = ? AND m.id = ?", CHAT_SELECT))
        .bind(league_id)
        .bind(message_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_chat(
    pool: &SqlitePool,
    league_id: i64,
    username: &str,
    message: &str,
    message_type: &str,
    reply_to_id: Option<i64>,
    created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO chat_messages (league_id, username, message, message_type, reply_to_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(league_id)
    .bind(username)
    .bind(message)
    .bind(message_type)
    .bind(reply_to_id)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn fetch_participants(pool: &SqlitePool, league_id: i64) -> Result<Vec<ChatParticipant>, sqlx::Error> {
    sqlx::query_as::<_, ChatParticipant>(
        r#"
        SELECT p.username, t.name AS team_name, p.joined_at, p.last_read_at
        FROM chat_participants p
        LEFT JOIN teams t ON t.league_id = p.league_id AND t.owner = p.username
        WHERE p.league_id = ?
        ORDER BY p.joined_at, p.username
        "#,
    )
    .bind(league_id)
    .fetch_all(pool)
    .await
}

/// Joining twice keeps the original join time.
pub async fn join_chat(
    pool: &SqlitePool,
    league_id: i64,
    username: &str,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO chat_participants (league_id, username, joined_at)
        VALUES (?, ?, ?)
        ON CONFLICT(league_id, username) DO NOTHING
        "#,
    )
    .bind(league_id)
    .bind(username)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_chat_read(
    pool: &SqlitePool,
    league_id: i64,
    username: &str,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO chat_participants (league_id, username, joined_at, last_read_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(league_id, username) DO UPDATE SET last_read_at = excluded.last_read_at
        "#,
    )
    .bind(league_id)
    .bind(username)
    .bind(at)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_fixtures(pool: &SqlitePool, league_id: i64) -> Result<Vec<Fixture>, sqlx::Error> {
    sqlx::query_as::<_, Fixture>(&format!(
        "SELECT {} FROM fixtures WHERE league_id = ? ORDER BY week_number, id",
        FIXTURE_COLUMNS
    ))
    .bind(league_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_fixture(pool: &SqlitePool, league_id: i64, fixture_id: i64) -> ApiResult<Fixture> {
    sqlx::query_as::<_, Fixture>(&format!(
        "SELECT {} FROM fixtures WHERE league_id = ? AND id = ?",
        FIXTURE_COLUMNS
    ))
    .bind(league_id)
    .bind(fixture_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Fixture not found".to_string()))
}

/// Swaps unplayed fixtures for the new schedule in one transaction. Fixtures
/// holding a score are never deleted, even if the plan lists them.
pub async fn apply_regeneration(
    pool: &SqlitePool,
    league_id: i64,
    plan: &RegenerationPlan,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for fixture_id in &plan.remove {
        sqlx::query(
            r#"
            DELETE FROM fixtures
            WHERE id = ? AND league_id = ? AND home_score IS NULL AND away_score IS NULL
            "#,
        )
        .bind(fixture_id)
        .bind(league_id)
        .execute(&mut *tx)
        .await?;
    }

    for fixture in &plan.insert {
        sqlx::query(
            r#"
            INSERT INTO fixtures (league_id, week_number, home_team_id, away_team_id, is_playoff)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(league_id)
        .bind(fixture.week as i64)
        .bind(fixture.home)
        .bind(fixture.away)
        .bind(fixture.is_playoff)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Rebuilds the league's schedule from its current teams. Callers hold the
/// league lock.
pub async fn regenerate_fixtures(pool: &SqlitePool, league: &League) -> ApiResult<RegenerationPlan> {
    let teams = load_teams(pool, league).await?;
    let existing = fetch_fixtures(pool, league.id).await?;

    let plan = fixture_scheduler::plan_regeneration(
        &existing,
        &join_order(&teams),
        league.total_weeks.max(0) as u32,
        league.playoff_weeks.max(0) as u32,
    );
    apply_regeneration(pool, league.id, &plan).await?;

    info!(
        "Regenerated fixtures for league {}: removed {}, inserted {}, kept results through week {}.",
        league.id,
        plan.remove.len(),
        plan.insert.len(),
        plan.last_played_week
    );
    Ok(plan)
}

pub async fn record_score(
    pool: &SqlitePool,
    fixture_id: i64,
    home_score: f64,
    away_score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE fixtures SET home_score = ?, away_score = ? WHERE id = ?")
        .bind(home_score)
        .bind(away_score)
        .bind(fixture_id)
        .execute(pool)
        .await?;
    Ok(())
}
