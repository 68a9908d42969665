use std::collections::HashSet;

use thiserror::Error;

use crate::dto::team_dto::{PlayerId, RosterSlot, Team, TeamId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeError {
    #[error("Cannot trade with yourself")]
    SameTeam,

    #[error("A trade has to move at least one player")]
    NothingOffered,

    #[error("Player {0} is listed more than once")]
    Duplicate(PlayerId),

    #[error("Player {player_id} is not on team {team_id}")]
    NotOnTeam { team_id: TeamId, player_id: PlayerId },

    #[error("Team {team_id} would go over its roster limit of {limit}")]
    RosterLimit { team_id: TeamId, limit: usize },

    #[error("Team {team_id} has no starting slot or bench space for an incoming {position}")]
    NoRoom { team_id: TeamId, position: String },
}

/// Checks that a proposal names two different teams and that every listed
/// player is currently on the side giving them up.
pub fn check_proposal(
    from: &Team,
    to: &Team,
    offered: &[PlayerId],
    requested: &[PlayerId],
) -> Result<(), TradeError> {
    if from.id == to.id {
        return Err(TradeError::SameTeam);
    }
    if offered.is_empty() && requested.is_empty() {
        return Err(TradeError::NothingOffered);
    }

    let mut seen = HashSet::new();
    for &player_id in offered.iter().chain(requested) {
        if !seen.insert(player_id) {
            return Err(TradeError::Duplicate(player_id));
        }
    }

    for (team, players) in [(from, offered), (to, requested)] {
        if let Some(&player_id) = players.iter().find(|&&p| !team.has_player(p)) {
            return Err(TradeError::NotOnTeam { team_id: team.id, player_id });
        }
    }

    Ok(())
}

/// Both rosters after the swap. Incoming players start when their position
/// has an open starting slot and otherwise sit on the bench.
pub fn apply_trade(
    from: &Team,
    to: &Team,
    offered: &[PlayerId],
    requested: &[PlayerId],
) -> Result<(Team, Team), TradeError> {
    check_proposal(from, to, offered, requested)?;

    let new_from = receive(from, offered, outgoing(to, requested))?;
    let new_to = receive(to, requested, outgoing(from, offered))?;
    Ok((new_from, new_to))
}

fn outgoing(team: &Team, players: &[PlayerId]) -> Vec<RosterSlot> {
    team.roster
        .iter()
        .filter(|s| players.contains(&s.player_id))
        .cloned()
        .collect()
}

fn receive(team: &Team, leaving: &[PlayerId], incoming: Vec<RosterSlot>) -> Result<Team, TradeError> {
    let mut next = team.clone();
    next.roster.retain(|s| !leaving.contains(&s.player_id));

    if next.roster.len() + incoming.len() > next.roster_limit {
        return Err(TradeError::RosterLimit {
            team_id: team.id,
            limit: team.roster_limit,
        });
    }

    for slot in incoming {
        let is_starting = next.placement_after(&slot.position, &[]).ok_or_else(|| TradeError::NoRoom {
            team_id: team.id,
            position: slot.position.clone(),
        })?;
        next.roster.push(RosterSlot { is_starting, ..slot });
    }

    Ok(next)
}
