use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub club: String,
    pub position: String,
    pub fantasy_position: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertPlayer {
    pub id: i64,
    pub name: String,
    pub club: String,
    pub position: String,
    pub fantasy_position: String,
}
