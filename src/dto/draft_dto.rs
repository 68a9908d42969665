use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::dto::team_dto::{PlayerId, TeamId};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    #[default]
    NotStarted,
    Live,
    Completed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::NotStarted => "NOT_STARTED",
            DraftStatus::Live => "LIVE",
            DraftStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for DraftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(DraftStatus::NotStarted),
            "LIVE" => Ok(DraftStatus::Live),
            "COMPLETED" => Ok(DraftStatus::Completed),
            other => Err(format!("unknown draft status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DraftPick {
    /// 1-based.
    pub round: usize,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub position: String,
    pub is_starting: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DraftState {
    pub league_id: i64,
    pub status: DraftStatus,
    pub pick_order: Vec<TeamId>,
    /// Index into `pick_order` of the team on the clock.
    pub current_turn: usize,
    pub direction: i64,
    pub picks: Vec<DraftPick>,
}

impl DraftState {
    pub fn not_started(league_id: i64) -> Self {
        Self {
            league_id,
            status: DraftStatus::NotStarted,
            pick_order: Vec::new(),
            current_turn: 0,
            direction: 1,
            picks: Vec::new(),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DraftStateRow {
    pub league_id: i64,
    pub pick_order: Json<Vec<TeamId>>,
    pub current_turn: i64,
    pub direction: i64,
    pub picks: Json<Vec<DraftPick>>,
}

#[derive(Debug, Deserialize)]
pub struct DraftPickRequest {
    pub player_id: PlayerId,
}

#[derive(Serialize)]
pub struct UpdateDraft {
    pub r#type: String,
    pub draft_state: DraftState,
}

/// Live drafts by league, loaded from the database on first use.
pub type SharedDrafts = Arc<RwLock<HashMap<i64, DraftState>>>;
