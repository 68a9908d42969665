use std::collections::HashMap;

use thiserror::Error;

use crate::dto::draft_dto::{DraftPick, DraftState, DraftStatus};
use crate::dto::team_dto::{PlayerId, RosterSlot, Team, TeamId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Draft has already been started")]
    AlreadyStarted,

    #[error("A draft needs at least 2 teams")]
    NotEnoughTeams,

    #[error("Draft is not live")]
    NotLive,

    #[error("It is not your turn to pick")]
    NotYourTurn,

    #[error("Player {0} is already on a roster in this league")]
    PlayerTaken(PlayerId),

    #[error("Team '{0}' has a full roster")]
    RosterFull(String),

    #[error("Team '{team}' has no starting slot or bench space for a {position}")]
    NoRoom { team: String, position: String },
}

/// Opens a draft over `pick_order`, which the caller has already shuffled.
pub fn start(league_id: i64, status: DraftStatus, pick_order: Vec<TeamId>) -> Result<DraftState, DraftError> {
    if status != DraftStatus::NotStarted {
        return Err(DraftError::AlreadyStarted);
    }
    if pick_order.len() < 2 {
        return Err(DraftError::NotEnoughTeams);
    }

    Ok(DraftState {
        league_id,
        status: DraftStatus::Live,
        pick_order,
        current_turn: 0,
        direction: 1,
        picks: Vec::new(),
    })
}

pub fn on_the_clock(state: &DraftState) -> Option<TeamId> {
    state.pick_order.get(state.current_turn).copied()
}

/// Snake order: the last team in a round picks again to open the next.
fn advance(state: &mut DraftState) {
    let len = state.pick_order.len() as i64;
    let mut next_turn = state.current_turn as i64 + state.direction;
    if next_turn >= len {
        next_turn = len - 1;
        state.direction = -1;
    } else if next_turn < 0 {
        next_turn = 0;
        state.direction = 1;
    }
    state.current_turn = next_turn.max(0) as usize;
}

/// Records a pick for the team on the clock, owned by `username`, and moves
/// the clock on. The draft completes once every team's roster is full.
/// `teams` are updated in place with the new roster slot.
pub fn make_pick(
    state: &mut DraftState,
    teams: &mut HashMap<TeamId, Team>,
    username: &str,
    player_id: PlayerId,
    position: &str,
) -> Result<DraftPick, DraftError> {
    if state.status != DraftStatus::Live {
        return Err(DraftError::NotLive);
    }

    let team_id = on_the_clock(state).ok_or(DraftError::NotLive)?;
    if teams.values().any(|t| t.has_player(player_id)) {
        return Err(DraftError::PlayerTaken(player_id));
    }

    let team = teams.get_mut(&team_id).ok_or(DraftError::NotYourTurn)?;
    if team.owner != username {
        return Err(DraftError::NotYourTurn);
    }
    if team.roster.len() >= team.roster_limit {
        return Err(DraftError::RosterFull(team.name.clone()));
    }

    let is_starting = team.placement_after(position, &[]).ok_or_else(|| DraftError::NoRoom {
        team: team.name.clone(),
        position: position.to_string(),
    })?;

    team.roster.push(RosterSlot {
        player_id,
        position: position.to_string(),
        is_starting,
    });

    let pick = DraftPick {
        round: state.picks.len() / state.pick_order.len() + 1,
        team_id,
        player_id,
        position: position.to_string(),
        is_starting,
    };
    state.picks.push(pick.clone());

    let all_full = state
        .pick_order
        .iter()
        .filter_map(|id| teams.get(id))
        .all(|t| t.roster.len() >= t.roster_limit);
    if all_full {
        state.status = DraftStatus::Completed;
        return Ok(pick);
    }

    /* Teams that filled up early lose their remaining turns */
    loop {
        advance(state);
        let open = on_the_clock(state)
            .and_then(|id| teams.get(&id))
            .is_some_and(|t| t.roster.len() < t.roster_limit);
        if open {
            break;
        }
    }

    Ok(pick)
}

pub fn complete(state: &mut DraftState) -> Result<(), DraftError> {
    if state.status != DraftStatus::Live {
        return Err(DraftError::NotLive);
    }
    state.status = DraftStatus::Completed;
    Ok(())
}
