use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type TeamId = i64;
pub type PlayerId = i64;
/// Whole pence.
pub type Money = i64;

pub const BENCH_CAPACITY: usize = 4;

/// Starting lineup every team has to fill before players go to the bench.
pub fn default_starting_requirements() -> BTreeMap<String, usize> {
    [
        ("Prop", 2),
        ("Hooker", 1),
        ("Lock", 1),
        ("Back Row", 2),
        ("Scrum-half", 1),
        ("Fly-half", 1),
        ("Centre", 1),
        ("Back Three", 2),
    ]
    .into_iter()
    .map(|(position, count)| (position.to_string(), count))
    .collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RosterSlot {
    pub player_id: PlayerId,
    pub position: String,
    pub is_starting: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Team {
    pub id: TeamId,
    pub league_id: i64,
    pub name: String,
    pub owner: String,
    /// Lower is better.
    pub waiver_priority: i64,
    pub faab_budget: Money,
    pub roster: Vec<RosterSlot>,
    pub roster_limit: usize,
    pub bench_capacity: usize,
    pub starting_requirements: BTreeMap<String, usize>,
}

impl Team {
    pub fn slot(&self, player_id: PlayerId) -> Option<&RosterSlot> {
        self.roster.iter().find(|s| s.player_id == player_id)
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.slot(player_id).is_some()
    }

    pub fn is_on_bench(&self, player_id: PlayerId) -> bool {
        self.slot(player_id).is_some_and(|s| !s.is_starting)
    }

    pub fn bench_count(&self) -> usize {
        self.roster.iter().filter(|s| !s.is_starting).count()
    }

    pub fn starting_count(&self, position: &str) -> usize {
        self.roster
            .iter()
            .filter(|s| s.is_starting && s.position == position)
            .count()
    }

    /// Where a player arriving at `position` lands once `leaving` are gone:
    /// `Some(true)` for an open starting slot, `Some(false)` for the bench,
    /// `None` when both are full.
    pub fn placement_after(&self, position: &str, leaving: &[PlayerId]) -> Option<bool> {
        let staying = || self.roster.iter().filter(|s| !leaving.contains(&s.player_id));

        let required = self.starting_requirements.get(position).copied().unwrap_or(0);
        let starting = staying()
            .filter(|s| s.is_starting && s.position == position)
            .count();
        if starting < required {
            return Some(true);
        }

        let bench = staying().filter(|s| !s.is_starting).count();
        (bench < self.bench_capacity).then_some(false)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TeamRow {
    pub id: i64,
    pub league_id: i64,
    pub name: String,
    pub owner: String,
    pub waiver_priority: i64,
    pub faab_budget: i64,
}

#[derive(Debug, FromRow, Clone)]
pub struct RosterSlotRow {
    pub team_id: i64,
    pub player_id: i64,
    pub position: String,
    pub is_starting: bool,
}

#[derive(Serialize)]
pub struct TeamsUpdate {
    pub r#type: String,
    pub league_id: i64,
    pub teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
pub struct JoinLeague {
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MovePlayer {
    pub is_starting: bool,
}
