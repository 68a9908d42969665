use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::dto::draft_dto::DraftStatus;
use crate::dto::waiver_dto::WaiverMode;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub created_by: String,
    pub max_teams: i64,
    pub max_players_per_team: i64,
    pub waiver_mode: String,
    pub total_weeks: i64,
    pub playoff_weeks: i64,
    pub starting_budget: i64,
    pub league_code: String,
    pub draft_status: String,
    pub created_at: DateTime<Utc>,
}

impl League {
    /// Falls back to FAAB for rows written before the mode column was validated.
    pub fn mode(&self) -> WaiverMode {
        self.waiver_mode.parse().unwrap_or_default()
    }

    pub fn draft(&self) -> DraftStatus {
        self.draft_status.parse().unwrap_or_default()
    }
}

fn default_max_teams() -> i64 {
    6
}

fn default_total_weeks() -> i64 {
    10
}

fn default_playoff_weeks() -> i64 {
    2
}

fn default_starting_budget() -> i64 {
    10_000
}

#[derive(Debug, Deserialize)]
pub struct CreateLeague {
    pub name: String,
    #[serde(default = "default_max_teams")]
    pub max_teams: i64,
    #[serde(default)]
    pub waiver_mode: WaiverMode,
    #[serde(default = "default_total_weeks")]
    pub total_weeks: i64,
    #[serde(default = "default_playoff_weeks")]
    pub playoff_weeks: i64,
    #[serde(default = "default_starting_budget")]
    pub starting_budget: i64,
}
