use serde::Serialize;

use crate::dto::fixture_dto::Fixture;
use crate::dto::team_dto::TeamId;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledFixture {
    /// 1-based.
    pub week: u32,
    pub home: TeamId,
    pub away: TeamId,
    pub is_playoff: bool,
}

/// Single round robin by the circle method.
///
/// An odd field gets a bye slot that never shows up in the output. Rounds map
/// onto weeks in order and stop at `available_weeks`; the last `playoff_weeks`
/// of the emitted rounds are flagged as playoffs.
pub fn generate(teams: &[TeamId], available_weeks: u32, playoff_weeks: u32) -> Vec<ScheduledFixture> {
    if teams.len() < 2 || available_weeks == 0 {
        return Vec::new();
    }

    // None is the bye.
    let mut slots: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();

    let rounds = (n - 1).min(available_weeks as usize);
    let first_playoff_round = rounds.saturating_sub(playoff_weeks as usize);

    let mut fixtures = Vec::with_capacity(rounds * n / 2);
    for round in 0..rounds {
        if round > 0 {
            slots[1..].rotate_left(1);
        }
        for i in 0..n / 2 {
            if let (Some(home), Some(away)) = (slots[i], slots[n - 1 - i]) {
                fixtures.push(ScheduledFixture {
                    week: round as u32 + 1,
                    home,
                    away,
                    is_playoff: round >= first_playoff_round,
                });
            }
        }
    }

    fixtures
}

/// What to change in a league's stored fixtures when its teams change.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationPlan {
    /// Fixture ids with no score yet.
    pub remove: Vec<i64>,
    pub insert: Vec<ScheduledFixture>,
    /// Weeks up to and including this one already have results.
    pub last_played_week: u32,
}

/// Replaces every unplayed fixture while leaving results alone.
///
/// The new schedule starts the week after the last week holding a result and
/// fills whatever is left of `total_weeks`, so nobody ends up playing twice in
/// a week that has already started.
pub fn plan_regeneration(
    existing: &[Fixture],
    teams: &[TeamId],
    total_weeks: u32,
    playoff_weeks: u32,
) -> RegenerationPlan {
    let last_played_week = existing
        .iter()
        .filter(|f| f.is_played())
        .map(|f| f.week_number.max(0) as u32)
        .max()
        .unwrap_or(0);

    let remove = existing
        .iter()
        .filter(|f| !f.is_played())
        .map(|f| f.id)
        .collect();

    let remaining_weeks = total_weeks.saturating_sub(last_played_week);
    let remaining_playoffs = playoff_weeks.min(remaining_weeks);
    let insert = generate(teams, remaining_weeks, remaining_playoffs)
        .into_iter()
        .map(|f| ScheduledFixture {
            week: f.week + last_played_week,
            ..f
        })
        .collect();

    RegenerationPlan {
        remove,
        insert,
        last_played_week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn weeks(fixtures: &[ScheduledFixture]) -> HashMap<u32, Vec<ScheduledFixture>> {
        let mut by_week: HashMap<u32, Vec<ScheduledFixture>> = HashMap::new();
        for f in fixtures {
            by_week.entry(f.week).or_default().push(*f);
        }
        by_week
    }

    #[test]
    fn first_round_pairs_ends_towards_middle() {
        let fixtures = generate(&[1, 2, 3, 4], 3, 0);
        let week_one: Vec<(TeamId, TeamId)> = fixtures
            .iter()
            .filter(|f| f.week == 1)
            .map(|f| (f.home, f.away))
            .collect();
        assert_eq!(week_one, vec![(1, 4), (2, 3)]);

        // Team 1 stays put, the rest rotate one place.
        let week_two: Vec<(TeamId, TeamId)> = fixtures
            .iter()
            .filter(|f| f.week == 2)
            .map(|f| (f.home, f.away))
            .collect();
        assert_eq!(week_two, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn full_rotation_meets_everyone_once() {
        for n in 2..=9 {
            let teams: Vec<TeamId> = (1..=n).collect();
            let fixtures = generate(&teams, 20, 0);

            let real = n as usize;
            let padded = real + real % 2;
            assert_eq!(weeks(&fixtures).len(), padded - 1);

            let mut pairs = HashSet::new();
            for f in &fixtures {
                let key = (f.home.min(f.away), f.home.max(f.away));
                assert!(pairs.insert(key), "repeat pairing {key:?}");
            }
            assert_eq!(pairs.len(), real * (real - 1) / 2);

            for team in &teams {
                let played = fixtures.iter().filter(|f| f.home == *team || f.away == *team).count();
                assert_eq!(played, real - 1);
            }

            for (_, week) in weeks(&fixtures) {
                assert!(week.len() <= real / 2);
                let mut seen = HashSet::new();
                for f in week {
                    assert!(seen.insert(f.home));
                    assert!(seen.insert(f.away));
                }
            }
        }
    }

    #[test]
    fn five_teams_truncated_to_three_weeks() {
        let fixtures = generate(&[1, 2, 3, 4, 5], 3, 0);

        let by_week = weeks(&fixtures);
        assert_eq!(by_week.len(), 3);
        assert!(by_week.keys().all(|w| (1..=3).contains(w)));
        assert!(by_week.values().all(|w| w.len() == 2));
        assert_eq!(fixtures.len(), 6);
    }

    #[test]
    fn final_rounds_are_playoffs() {
        let fixtures = generate(&[1, 2, 3, 4], 10, 2);
        for f in &fixtures {
            assert_eq!(f.is_playoff, f.week >= 2, "week {}", f.week);
        }

        let all_playoff = generate(&[1, 2], 1, 3);
        assert!(all_playoff.iter().all(|f| f.is_playoff));
    }

    #[test]
    fn degenerate_inputs_give_nothing() {
        assert!(generate(&[], 5, 0).is_empty());
        assert!(generate(&[1], 5, 0).is_empty());
        assert!(generate(&[1, 2, 3], 0, 0).is_empty());
    }

    fn stored(id: i64, week: i64, home: i64, away: i64, score: Option<(f64, f64)>) -> Fixture {
        Fixture {
            id,
            league_id: 1,
            week_number: week,
            home_team_id: home,
            away_team_id: away,
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            is_playoff: false,
        }
    }

    #[test]
    fn regeneration_keeps_results_and_starts_after_them() {
        let existing = vec![
            stored(1, 1, 1, 4, Some((31.0, 12.5))),
            stored(2, 1, 2, 3, Some((20.0, 22.0))),
            stored(3, 2, 1, 3, None),
            stored(4, 2, 4, 2, None),
        ];

        let plan = plan_regeneration(&existing, &[1, 2, 3, 4, 5], 4, 1);

        assert_eq!(plan.last_played_week, 1);
        assert_eq!(plan.remove, vec![3, 4]);
        assert!(plan.insert.iter().all(|f| (2..=4).contains(&f.week)));
        assert!(plan.insert.iter().filter(|f| f.is_playoff).all(|f| f.week == 4));
        assert!(plan.insert.iter().any(|f| f.home == 5 || f.away == 5));
    }

    #[test]
    fn regeneration_without_results_replaces_everything() {
        let existing = vec![stored(1, 1, 1, 2, None)];

        let plan = plan_regeneration(&existing, &[1, 2, 3], 5, 0);

        assert_eq!(plan.last_played_week, 0);
        assert_eq!(plan.remove, vec![1]);
        assert_eq!(plan.insert, generate(&[1, 2, 3], 5, 0));
    }
}
