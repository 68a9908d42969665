use std::collections::BTreeMap;

use thiserror::Error;

use crate::dto::team_dto::{Money, PlayerId, Team};
use crate::dto::waiver_dto::{ClaimRequest, WaiverMode};

/// Reasons a claim is turned away at submission; it never becomes pending.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Permission denied: you do not own this team")]
    NotTeamOwner,

    #[error("Player {0} is already on your team")]
    AlreadyOnTeam(PlayerId),

    #[error("Player with ID {0} not found on your team")]
    DropNotOnTeam(PlayerId),

    #[error("Cannot drop player {0}: starting lineup players cannot be dropped via waivers")]
    StartingLineupProtected(PlayerId),

    #[error("Team is at max roster size ({0}). You must select a player to drop.")]
    RosterFullWithoutDrop(usize),

    #[error("Bid amount must be non-negative")]
    NegativeBid,

    #[error("Insufficient FAAB budget: have {budget}, bid is {bid}")]
    BidExceedsBudget { bid: Money, budget: Money },

    #[error("Bench is full. You must claim players from required positions: {}", .needed.join(", "))]
    PositionNotNeeded { needed: Vec<String> },

    #[error("No starting slot or bench space for a {0}. Drop a bench player to make room.")]
    NoRoomForPosition(String),
}

/// Starting positions still short of their requirement, with the shortfall.
pub fn position_needs(team: &Team) -> BTreeMap<String, usize> {
    team.starting_requirements
        .iter()
        .filter_map(|(position, required)| {
            let filled = team.starting_count(position);
            (filled < *required).then(|| (position.clone(), required - filled))
        })
        .collect()
}

/// Checks a claim against the submitting team as it stands right now.
///
/// `player_position` is the fantasy position of the player being claimed.
pub fn validate_claim(
    team: &Team,
    submitter: &str,
    request: &ClaimRequest,
    player_position: &str,
    mode: WaiverMode,
) -> Result<(), ValidationError> {
    if team.owner != submitter {
        return Err(ValidationError::NotTeamOwner);
    }
    if team.has_player(request.player_id) {
        return Err(ValidationError::AlreadyOnTeam(request.player_id));
    }

    for drop in &request.players_to_drop {
        match team.slot(*drop) {
            None => return Err(ValidationError::DropNotOnTeam(*drop)),
            Some(slot) if slot.is_starting => {
                return Err(ValidationError::StartingLineupProtected(*drop));
            }
            Some(_) => {}
        }
    }

    if team.roster.len() >= team.roster_limit && request.players_to_drop.is_empty() {
        return Err(ValidationError::RosterFullWithoutDrop(team.roster_limit));
    }

    if request.bid_amount < 0 {
        return Err(ValidationError::NegativeBid);
    }
    if mode == WaiverMode::Faab && request.bid_amount > team.faab_budget {
        return Err(ValidationError::BidExceedsBudget {
            bid: request.bid_amount,
            budget: team.faab_budget,
        });
    }

    if team.bench_count() >= team.bench_capacity {
        let needs = position_needs(team);
        if !needs.is_empty() && !needs.contains_key(player_position) {
            return Err(ValidationError::PositionNotNeeded {
                needed: needs.into_keys().collect(),
            });
        }
    }

    if team
        .placement_after(player_position, &request.players_to_drop)
        .is_none()
    {
        return Err(ValidationError::NoRoomForPosition(player_position.to_string()));
    }

    Ok(())
}
