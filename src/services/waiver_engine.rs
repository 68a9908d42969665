use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::dto::team_dto::{PlayerId, RosterSlot, Team, TeamId};
use crate::dto::waiver_dto::{ClaimId, ClaimStatus, RejectReason, WaiverClaim, WaiverMode};

/// Malformed input handed to [`resolve`]. Business-rule failures never show up
/// here; they are per-claim rejections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("claim {0} is not pending")]
    NotPending(ClaimId),

    #[error("claim {0} appears more than once")]
    DuplicateClaim(ClaimId),

    #[error("claim {0} has a negative bid")]
    NegativeBid(ClaimId),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub claim_id: ClaimId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub status: ClaimStatus,
    pub reason: Option<RejectReason>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// In processing order.
    pub outcomes: Vec<ClaimOutcome>,
    /// Team states after every approved claim was applied.
    pub teams: HashMap<TeamId, Team>,
    /// Next cycle's ranking, best first. Only produced in priority leagues.
    pub priority_order: Option<Vec<TeamId>>,
}

impl ResolutionResult {
    pub fn approved(&self) -> impl Iterator<Item = &ClaimOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == ClaimStatus::Approved)
    }

    pub fn approved_count(&self) -> usize {
        self.approved().count()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.len() - self.approved_count()
    }

    pub fn outcome(&self, claim_id: ClaimId) -> Option<&ClaimOutcome> {
        self.outcomes.iter().find(|o| o.claim_id == claim_id)
    }
}

/// Decides every pending claim in one run.
///
/// `teams` is the league snapshot the claims were loaded with. A player is
/// unavailable while it sits on any roster, so players dropped earlier in the
/// run can be picked up later in it. `processed_at` is stamped on each
/// outcome as is, so two runs over the same input give identical results.
pub fn resolve(
    claims: &[WaiverClaim],
    teams: &HashMap<TeamId, Team>,
    mode: WaiverMode,
    processed_at: DateTime<Utc>,
) -> Result<ResolutionResult, ResolveError> {
    check_contract(claims)?;

    let mut run = Run::new(teams, mode, processed_at);
    match mode {
        WaiverMode::Priority => run.resolve_in_rounds(claims),
        WaiverMode::Faab => run.resolve_by_bids(claims),
    }

    let priority_order = match mode {
        WaiverMode::Priority => {
            let order = next_priority_order(teams, claims, &run.outcomes);
            for (rank, team_id) in order.iter().enumerate() {
                if let Some(team) = run.teams.get_mut(team_id) {
                    team.waiver_priority = rank as i64 + 1;
                }
            }
            Some(order)
        }
        WaiverMode::Faab => None,
    };

    Ok(ResolutionResult {
        outcomes: run.outcomes,
        teams: run.teams,
        priority_order,
    })
}

fn check_contract(claims: &[WaiverClaim]) -> Result<(), ResolveError> {
    let mut seen = HashSet::new();
    for claim in claims {
        if claim.status != ClaimStatus::Pending {
            return Err(ResolveError::NotPending(claim.id));
        }
        if !seen.insert(claim.id) {
            return Err(ResolveError::DuplicateClaim(claim.id));
        }
        if claim.bid < 0 {
            return Err(ResolveError::NegativeBid(claim.id));
        }
    }
    Ok(())
}

/// Team ids best priority first; ties fall back to the id.
pub fn current_priority_order(teams: &HashMap<TeamId, Team>) -> Vec<TeamId> {
    let mut order: Vec<&Team> = teams.values().collect();
    order.sort_by_key(|t| (t.waiver_priority, t.id));
    order.into_iter().map(|t| t.id).collect()
}

/// Teams that sat the run out keep the front, teams that claimed and lost
/// come next, winners go to the back in the order of their last grant.
fn next_priority_order(
    teams: &HashMap<TeamId, Team>,
    claims: &[WaiverClaim],
    outcomes: &[ClaimOutcome],
) -> Vec<TeamId> {
    let claimants: HashSet<TeamId> = claims.iter().map(|c| c.team_id).collect();
    let mut last_grant: HashMap<TeamId, usize> = HashMap::new();
    for (seq, outcome) in outcomes.iter().enumerate() {
        if outcome.status == ClaimStatus::Approved {
            last_grant.insert(outcome.team_id, seq);
        }
    }

    let (idle, claimed): (Vec<TeamId>, Vec<TeamId>) = current_priority_order(teams)
        .into_iter()
        .partition(|id| !claimants.contains(id));
    let (empty_handed, mut winners): (Vec<TeamId>, Vec<TeamId>) = claimed
        .into_iter()
        .partition(|id| !last_grant.contains_key(id));
    winners.sort_by_key(|id| last_grant.get(id).copied().unwrap_or_default());

    idle.into_iter().chain(empty_handed).chain(winners).collect()
}

struct Run {
    mode: WaiverMode,
    teams: HashMap<TeamId, Team>,
    owners: HashMap<PlayerId, TeamId>,
    granted: HashSet<PlayerId>,
    processed_at: DateTime<Utc>,
    outcomes: Vec<ClaimOutcome>,
}

impl Run {
    fn new(teams: &HashMap<TeamId, Team>, mode: WaiverMode, processed_at: DateTime<Utc>) -> Self {
        let owners = teams
            .values()
            .flat_map(|t| t.roster.iter().map(move |s| (s.player_id, t.id)))
            .collect();

        Self {
            mode,
            teams: teams.clone(),
            owners,
            granted: HashSet::new(),
            processed_at,
            outcomes: Vec::new(),
        }
    }

    /// Round k gives every team, in priority order, its k-th claim by its own
    /// ranking, then submission time.
    fn resolve_in_rounds(&mut self, claims: &[WaiverClaim]) {
        let mut queues: BTreeMap<TeamId, Vec<&WaiverClaim>> = BTreeMap::new();
        for claim in claims {
            queues.entry(claim.team_id).or_default().push(claim);
        }
        for queue in queues.values_mut() {
            queue.sort_by_key(|c| (c.priority, c.submitted_at, c.id));
        }

        let order = current_priority_order(&self.teams);
        for (team_id, queue) in &queues {
            if !self.teams.contains_key(team_id) {
                for claim in queue {
                    self.reject(claim, RejectReason::TeamNotFound);
                }
            }
        }

        let rounds = order
            .iter()
            .filter_map(|id| queues.get(id).map(Vec::len))
            .max()
            .unwrap_or(0);

        for round in 0..rounds {
            for team_id in &order {
                if let Some(claim) = queues.get(team_id).and_then(|q| q.get(round)) {
                    let _ = self.process(claim);
                }
            }
        }
    }

    /// One contest per player. Contests run in the order of their best bid and
    /// only that best bid can win; if it fails a late check nobody gets the
    /// player this run.
    fn resolve_by_bids(&mut self, claims: &[WaiverClaim]) {
        let mut ranked: Vec<&WaiverClaim> = claims.iter().collect();
        ranked.sort_by(|a, b| {
            b.bid
                .cmp(&a.bid)
                .then(a.submitted_at.cmp(&b.submitted_at))
                .then(a.id.cmp(&b.id))
        });

        let mut contests: Vec<Vec<&WaiverClaim>> = Vec::new();
        let mut contest_index: HashMap<PlayerId, usize> = HashMap::new();
        for claim in ranked {
            if !self.teams.contains_key(&claim.team_id) {
                self.reject(claim, RejectReason::TeamNotFound);
                continue;
            }
            let idx = *contest_index.entry(claim.player_id).or_insert_with(|| {
                contests.push(Vec::new());
                contests.len() - 1
            });
            contests[idx].push(claim);
        }

        for contest in contests {
            let Some((best, rest)) = contest.split_first() else {
                continue;
            };
            let losing_reason = match self.process(best) {
                Ok(()) => RejectReason::Outbid,
                Err(reason @ (RejectReason::PlayerUnavailable | RejectReason::AlreadyClaimed)) => {
                    reason
                }
                Err(_) => RejectReason::Outbid,
            };
            for claim in rest {
                self.reject(claim, losing_reason);
            }
        }
    }

    fn process(&mut self, claim: &WaiverClaim) -> Result<(), RejectReason> {
        match self.check(claim) {
            Ok(()) => {
                self.grant(claim);
                Ok(())
            }
            Err(reason) => {
                self.reject(claim, reason);
                Err(reason)
            }
        }
    }

    fn check(&self, claim: &WaiverClaim) -> Result<(), RejectReason> {
        let team = self
            .teams
            .get(&claim.team_id)
            .ok_or(RejectReason::TeamNotFound)?;

        if self.granted.contains(&claim.player_id) {
            return Err(RejectReason::AlreadyClaimed);
        }
        if self.owners.contains_key(&claim.player_id) {
            return Err(RejectReason::PlayerUnavailable);
        }

        let drops: HashSet<PlayerId> = claim.drop_player_ids.iter().copied().collect();
        if drops.iter().any(|p| !team.is_on_bench(*p)) {
            return Err(RejectReason::DropUnavailable);
        }
        if team.roster.len() - drops.len() >= team.roster_limit {
            return Err(RejectReason::RosterFull);
        }
        if team
            .placement_after(&claim.player_position, &claim.drop_player_ids)
            .is_none()
        {
            return Err(RejectReason::BenchFull);
        }
        if self.mode == WaiverMode::Faab && claim.bid > team.faab_budget {
            return Err(RejectReason::InsufficientBudget);
        }
        Ok(())
    }

    fn grant(&mut self, claim: &WaiverClaim) {
        let Some(team) = self.teams.get_mut(&claim.team_id) else {
            return;
        };

        let is_starting = team
            .placement_after(&claim.player_position, &claim.drop_player_ids)
            .unwrap_or(false);
        team.roster
            .retain(|s| !claim.drop_player_ids.contains(&s.player_id));
        team.roster.push(RosterSlot {
            player_id: claim.player_id,
            position: claim.player_position.clone(),
            is_starting,
        });
        if self.mode == WaiverMode::Faab {
            team.faab_budget -= claim.bid;
        }

        for dropped in &claim.drop_player_ids {
            self.owners.remove(dropped);
        }
        self.owners.insert(claim.player_id, claim.team_id);
        self.granted.insert(claim.player_id);

        self.outcomes.push(ClaimOutcome {
            claim_id: claim.id,
            team_id: claim.team_id,
            player_id: claim.player_id,
            status: ClaimStatus::Approved,
            reason: None,
            processed_at: self.processed_at,
        });
    }

    fn reject(&mut self, claim: &WaiverClaim, reason: RejectReason) {
        self.outcomes.push(ClaimOutcome {
            claim_id: claim.id,
            team_id: claim.team_id,
            player_id: claim.player_id,
            status: ClaimStatus::Rejected,
            reason: Some(reason),
            processed_at: self.processed_at,
        });
    }
}
