use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Fixture {
    pub id: i64,
    pub league_id: i64,
    pub week_number: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
    pub is_playoff: bool,
}

impl Fixture {
    pub fn is_played(&self) -> bool {
        self.home_score.is_some() || self.away_score.is_some()
    }

    pub fn involves(&self, team_id: i64) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordScore {
    pub home_score: f64,
    pub away_score: f64,
}

#[derive(Debug, Deserialize)]
pub struct NextMatchupQuery {
    pub team_id: i64,
}

#[derive(Serialize)]
pub struct FixturesUpdate {
    pub r#type: String,
    pub league_id: i64,
    pub fixtures: Vec<Fixture>,
}
