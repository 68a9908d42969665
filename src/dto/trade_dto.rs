use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::dto::team_dto::{PlayerId, TeamId};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "PENDING",
            TradeStatus::Accepted => "ACCEPTED",
            TradeStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TradeStatus::Pending),
            "ACCEPTED" => Ok(TradeStatus::Accepted),
            "REJECTED" => Ok(TradeStatus::Rejected),
            other => Err(format!("unknown trade status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Trade {
    pub id: i64,
    pub league_id: i64,
    pub from_team_id: TeamId,
    pub to_team_id: TeamId,
    pub players_offered: Json<Vec<PlayerId>>,
    pub players_requested: Json<Vec<PlayerId>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProposeTrade {
    pub from_team_id: TeamId,
    pub to_team_id: TeamId,
    #[serde(default)]
    pub players_offered: Vec<PlayerId>,
    #[serde(default)]
    pub players_requested: Vec<PlayerId>,
}

#[derive(Debug, Deserialize)]
pub struct RespondTrade {
    pub response: String,
}

#[derive(Serialize)]
pub struct TradeUpdate {
    pub r#type: String,
    pub trade: Trade,
}
