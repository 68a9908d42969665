use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::dto::team_dto::{Money, PlayerId, TeamId};

pub type ClaimId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "PENDING",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ClaimStatus::Pending),
            "APPROVED" => Ok(ClaimStatus::Approved),
            "REJECTED" => Ok(ClaimStatus::Rejected),
            other => Err(format!("unknown claim status '{}'", other)),
        }
    }
}

/// How contested waiver claims are decided for a league.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaiverMode {
    /// Ordinal waiver priority, processed in rounds.
    Priority,
    /// Sealed-bid Free Agent Acquisition Budget.
    #[default]
    Faab,
}

impl WaiverMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaiverMode::Priority => "PRIORITY",
            WaiverMode::Faab => "FAAB",
        }
    }
}

impl FromStr for WaiverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIORITY" => Ok(WaiverMode::Priority),
            "FAAB" => Ok(WaiverMode::Faab),
            other => Err(format!("unknown waiver mode '{}'", other)),
        }
    }
}

/// Why a claim lost during a processing run.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// An earlier claim in the run already took the player.
    AlreadyClaimed,
    /// Another team bid more, or the same amount earlier.
    Outbid,
    InsufficientBudget,
    TeamNotFound,
    /// The player was rostered elsewhere before the run.
    PlayerUnavailable,
    /// A drop target is no longer on the team's bench.
    DropUnavailable,
    RosterFull,
    /// No open starting slot for the position and no room on the bench.
    BenchFull,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::AlreadyClaimed => "ALREADY_CLAIMED",
            RejectReason::Outbid => "OUTBID",
            RejectReason::InsufficientBudget => "INSUFFICIENT_BUDGET",
            RejectReason::TeamNotFound => "TEAM_NOT_FOUND",
            RejectReason::PlayerUnavailable => "PLAYER_UNAVAILABLE",
            RejectReason::DropUnavailable => "DROP_UNAVAILABLE",
            RejectReason::RosterFull => "ROSTER_FULL",
            RejectReason::BenchFull => "BENCH_FULL",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WaiverClaim {
    pub id: ClaimId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    /// Fantasy position of the player being added.
    pub player_position: String,
    pub drop_player_ids: Vec<PlayerId>,
    /// The team's own ranking of its claims, lower first.
    pub priority: i64,
    /// Only meaningful in FAAB leagues.
    pub bid: Money,
    pub submitted_at: DateTime<Utc>,
    pub status: ClaimStatus,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WaiverClaimRow {
    pub id: i64,
    pub league_id: i64,
    pub team_id: i64,
    pub player_id: i64,
    pub player_position: String,
    pub drop_player_ids: Json<Vec<i64>>,
    pub priority: i64,
    pub bid: i64,
    pub submitted_at: DateTime<Utc>,
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
}

impl TryFrom<WaiverClaimRow> for WaiverClaim {
    type Error = String;

    fn try_from(row: WaiverClaimRow) -> Result<Self, Self::Error> {
        Ok(WaiverClaim {
            id: row.id,
            team_id: row.team_id,
            player_id: row.player_id,
            player_position: row.player_position,
            drop_player_ids: row.drop_player_ids.0,
            priority: row.priority,
            bid: row.bid,
            submitted_at: row.submitted_at,
            status: row.status.parse()?,
            processed_at: row.processed_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClaimRequest {
    pub team_id: TeamId,
    pub player_id: PlayerId,
    #[serde(default)]
    pub players_to_drop: Vec<PlayerId>,
    #[serde(default)]
    pub bid_amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClaimPriority {
    pub priority: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct ProcessSummary {
    pub processed_count: usize,
    pub approved_count: usize,
    pub rejected_count: usize,
    pub priority_order: Option<Vec<TeamId>>,
}

#[derive(Serialize)]
pub struct WaiverUpdate {
    pub r#type: String,
    pub league_id: i64,
    pub data: serde_json::Value,
}
