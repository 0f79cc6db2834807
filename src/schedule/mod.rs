//! Round-robin scheduling, knockout bracket construction and winner
//! propagation, score entry, and league standings (spec §4.D).

use std::collections::HashMap;

use crate::domain::session::{BracketMatch, Knockout, KnockoutRound, Match};
use crate::error::{Error, Result};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

/// Builds a round-robin schedule over `teams` using the circle method,
/// inserting a bye round-slot when the team count is odd. Returns `k-1`
/// rounds for even `k`, `k` rounds (each with one bye) for odd `k`.
pub fn round_robin_schedule(teams: &[String]) -> Vec<Vec<Match>> {
    let mut arr: Vec<Option<String>> = teams.iter().cloned().map(Some).collect();
    if arr.len() % 2 == 1 {
        arr.push(None);
    }
    let n = arr.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..(n - 1) {
        let mut round = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            match (&arr[i], &arr[n - 1 - i]) {
                (Some(home), Some(away)) => round.push(Match::new_play(home.clone(), away.clone())),
                (Some(team), None) | (None, Some(team)) => {
                    round.push(Match::Bye { bye: team.clone() })
                }
                (None, None) => {}
            }
        }
        rounds.push(round);

        let last = arr.pop().unwrap();
        arr.insert(1, last);
    }
    rounds
}

/// Sets or clears one side's score, applying the auto-zero rule: setting a
/// score when both were null initializes the other to 0; clearing a score
/// clears both (spec §4.B).
pub fn set_score(m: &mut Match, side: Side, score: Option<u32>) -> Result<()> {
    if let Some(s) = score {
        validation::validate_score(s)?;
    }
    match m {
        Match::Play {
            home_score,
            away_score,
            ..
        } => {
            let (mine, theirs) = match side {
                Side::Home => (home_score, away_score),
                Side::Away => (away_score, home_score),
            };
            match score {
                None => {
                    *mine = None;
                    *theirs = None;
                }
                Some(s) => {
                    *mine = Some(s);
                    if theirs.is_none() {
                        *theirs = Some(0);
                    }
                }
            }
            Ok(())
        }
        Match::Bye { .. } => Err(Error::validation("cannot set a score on a bye")),
    }
}

/// Applies a `+1`/`-1` scorer-count delta, enforcing the auto-zero rule and
/// the scorer-map invariants (spec §4.D, §4.H). `roster` is the scoring
/// team's current member list, used to validate the resulting map.
pub fn apply_scorer_delta(
    m: &mut Match,
    side: Side,
    player: &str,
    delta: i32,
    roster: &[&str],
) -> Result<()> {
    if delta != 1 && delta != -1 {
        return Err(Error::validation("scorer delta must be +1 or -1"));
    }
    match m {
        Match::Play {
            home_score,
            away_score,
            home_scorers,
            away_scorers,
            ..
        } => {
            let (scorers, mine, theirs) = match side {
                Side::Home => (home_scorers, home_score, away_score),
                Side::Away => (away_scorers, away_score, home_score),
            };

            if mine.is_none() && theirs.is_none() {
                *mine = Some(0);
                *theirs = Some(0);
            }

            let entry = scorers.entry(player.to_string()).or_insert(0);
            if delta < 0 {
                if *entry == 0 {
                    return Err(Error::validation(format!(
                        "'{player}' has no scorer count to decrement"
                    )));
                }
                *entry -= 1;
                if *entry == 0 {
                    scorers.remove(player);
                }
            } else {
                *entry += 1;
            }

            let team_score = mine.unwrap_or(0);
            validation::validate_scorers(scorers, roster, team_score)?;
            Ok(())
        }
        Match::Bye { .. } => Err(Error::validation("cannot record scorers on a bye")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl StandingRow {
    fn new(team: String) -> Self {
        StandingRow {
            team,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }
}

/// League standings from one session's rounds: 3/1/0 points, sorted by
/// points desc, goal difference desc, goals-for desc (spec §4.D).
pub fn league_standings(rounds: &[Vec<Match>]) -> Vec<StandingRow> {
    let mut rows: HashMap<String, StandingRow> = HashMap::new();

    for round in rounds {
        for m in round {
            match m {
                Match::Bye { bye } => {
                    rows.entry(bye.clone())
                        .or_insert_with(|| StandingRow::new(bye.clone()));
                }
                Match::Play {
                    home,
                    away,
                    home_score,
                    away_score,
                    ..
                } => {
                    rows.entry(home.clone())
                        .or_insert_with(|| StandingRow::new(home.clone()));
                    rows.entry(away.clone())
                        .or_insert_with(|| StandingRow::new(away.clone()));

                    if let (Some(hs), Some(as_)) = (home_score, away_score) {
                        {
                            let row = rows.get_mut(home).unwrap();
                            row.played += 1;
                            row.goals_for += hs;
                            row.goals_against += as_;
                            if hs > as_ {
                                row.won += 1;
                                row.points += 3;
                            } else if hs < as_ {
                                row.lost += 1;
                            } else {
                                row.drawn += 1;
                                row.points += 1;
                            }
                        }
                        {
                            let row = rows.get_mut(away).unwrap();
                            row.played += 1;
                            row.goals_for += as_;
                            row.goals_against += hs;
                            if as_ > hs {
                                row.won += 1;
                                row.points += 3;
                            } else if as_ < hs {
                                row.lost += 1;
                            } else {
                                row.drawn += 1;
                                row.points += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    let mut list: Vec<StandingRow> = rows.into_values().collect();
    list.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
            .then_with(|| a.team.cmp(&b.team))
    });
    list
}

/// Builds a seeded single-elimination bracket: `1 v k, 2 v k-1, ...`. A
/// lone unpaired top seed (odd team count) receives an automatic bye into
/// the first round's downstream slot.
pub fn build_knockout(seeded_teams: &[String]) -> Result<Knockout> {
    if seeded_teams.len() < 2 {
        return Err(Error::validation("knockout requires at least 2 teams"));
    }

    let sequence = KnockoutRound::sequence_for(seeded_teams.len());
    let first_round = sequence[0];
    let n = seeded_teams.len();
    let half = n / 2;

    let mut bracket = Vec::new();
    let mut match_index = 0u32;
    for i in 0..half {
        bracket.push(BracketMatch {
            round: first_round,
            match_index,
            home: Some(seeded_teams[i].clone()),
            away: Some(seeded_teams[n - 1 - i].clone()),
            home_score: None,
            away_score: None,
            home_scorers: HashMap::new(),
            away_scorers: HashMap::new(),
        });
        match_index += 1;
    }
    if n % 2 == 1 {
        bracket.push(BracketMatch {
            round: first_round,
            match_index,
            home: Some(seeded_teams[half].clone()),
            away: None,
            home_score: None,
            away_score: None,
            home_scorers: HashMap::new(),
            away_scorers: HashMap::new(),
        });
    }

    let mut prev_count = bracket.len();
    for &round in &sequence[1..] {
        let this_count = prev_count.div_ceil(2);
        for i in 0..this_count {
            bracket.push(BracketMatch {
                round,
                match_index: i as u32,
                home: None,
                away: None,
                home_score: None,
                away_score: None,
                home_scorers: HashMap::new(),
                away_scorers: HashMap::new(),
            });
        }
        prev_count = this_count;
    }

    let mut knockout = Knockout { bracket };
    propagate_knockout(&mut knockout, &sequence);
    Ok(knockout)
}

/// Advances every completed match's winner into the next round's slot. A
/// bye (missing `away`) auto-advances its lone entrant. Draws and
/// incomplete matches leave the downstream slot untouched (`None`) —
/// the engine tolerates a tied knockout scoreline rather than erroring.
pub fn propagate_knockout(knockout: &mut Knockout, sequence: &[KnockoutRound]) {
    for window in sequence.windows(2) {
        let (round, next_round) = (window[0], window[1]);
        let mut in_round: Vec<&BracketMatch> = knockout
            .bracket
            .iter()
            .filter(|m| m.round == round)
            .collect();
        in_round.sort_by_key(|m| m.match_index);

        let advancers: Vec<Option<String>> = in_round
            .iter()
            .map(|m| effective_advancer(m).map(str::to_string))
            .collect();

        for (i, advancer) in advancers.into_iter().enumerate() {
            let next_match_index = (i / 2) as u32;
            let is_home = i % 2 == 0;
            if let Some(bm) = knockout
                .bracket
                .iter_mut()
                .find(|m| m.round == next_round && m.match_index == next_match_index)
            {
                if is_home {
                    bm.home = advancer;
                } else {
                    bm.away = advancer;
                }
            }
        }
    }
}

fn effective_advancer(m: &BracketMatch) -> Option<&str> {
    match (&m.home, &m.away) {
        (Some(h), None) => Some(h.as_str()),
        (None, Some(a)) => Some(a.as_str()),
        _ => m.winner(),
    }
}

/// The cup winner: the team occupying the final round's completed winning
/// slot, if any.
pub fn cup_winner(knockout: &Knockout) -> Option<&str> {
    knockout
        .bracket
        .iter()
        .find(|m| m.round == KnockoutRound::Final)
        .and_then(effective_advancer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_even_teams_has_k_minus_one_rounds() {
        let teams = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let rounds = round_robin_schedule(&teams);
        assert_eq!(rounds.len(), 3);
        for round in &rounds {
            assert_eq!(round.len(), 2);
        }
    }

    #[test]
    fn round_robin_odd_teams_has_one_bye_per_round() {
        let teams = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let rounds = round_robin_schedule(&teams);
        assert_eq!(rounds.len(), 3);
        for round in &rounds {
            assert_eq!(round.iter().filter(|m| matches!(m, Match::Bye { .. })).count(), 1);
        }
    }

    #[test]
    fn set_score_auto_zeroes_opposite_side() {
        let mut m = Match::new_play("A", "B");
        set_score(&mut m, Side::Home, Some(2)).unwrap();
        match &m {
            Match::Play { home_score, away_score, .. } => {
                assert_eq!(*home_score, Some(2));
                assert_eq!(*away_score, Some(0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn clearing_a_score_clears_both() {
        let mut m = Match::new_play("A", "B");
        set_score(&mut m, Side::Home, Some(2)).unwrap();
        set_score(&mut m, Side::Home, None).unwrap();
        match &m {
            Match::Play { home_score, away_score, .. } => {
                assert_eq!(*home_score, None);
                assert_eq!(*away_score, None);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn scorer_delta_rejects_exceeding_team_score() {
        let mut m = Match::new_play("A", "B");
        set_score(&mut m, Side::Home, Some(1)).unwrap();
        apply_scorer_delta(&mut m, Side::Home, "Ada", 1, &["Ada", "Bo"]).unwrap();
        let err = apply_scorer_delta(&mut m, Side::Home, "Bo", 1, &["Ada", "Bo"]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn league_standings_orders_by_points_then_goal_difference() {
        let rounds = vec![vec![
            {
                let mut m = Match::new_play("Red", "Blue");
                set_score(&mut m, Side::Home, Some(3)).unwrap();
                set_score(&mut m, Side::Away, Some(1)).unwrap();
                m
            },
        ]];
        let standings = league_standings(&rounds);
        assert_eq!(standings[0].team, "Red");
        assert_eq!(standings[0].points, 3);
        assert_eq!(standings[1].team, "Blue");
        assert_eq!(standings[1].points, 0);
    }

    #[test]
    fn knockout_propagation_matches_semifinal_example() {
        let sequence = KnockoutRound::sequence_for(4);
        let mut knockout = Knockout {
            bracket: vec![
                BracketMatch {
                    round: KnockoutRound::Semi,
                    match_index: 0,
                    home: Some("Red".to_string()),
                    away: Some("Blue".to_string()),
                    home_score: Some(2),
                    away_score: Some(1),
                    home_scorers: HashMap::new(),
                    away_scorers: HashMap::new(),
                },
                BracketMatch {
                    round: KnockoutRound::Semi,
                    match_index: 1,
                    home: Some("Green".to_string()),
                    away: Some("Yellow".to_string()),
                    home_score: Some(1),
                    away_score: Some(3),
                    home_scorers: HashMap::new(),
                    away_scorers: HashMap::new(),
                },
                BracketMatch {
                    round: KnockoutRound::Final,
                    match_index: 0,
                    home: None,
                    away: None,
                    home_score: None,
                    away_score: None,
                    home_scorers: HashMap::new(),
                    away_scorers: HashMap::new(),
                },
            ],
        };
        propagate_knockout(&mut knockout, &sequence);

        let final_match = knockout
            .bracket
            .iter()
            .find(|m| m.round == KnockoutRound::Final)
            .unwrap();
        assert_eq!(final_match.home.as_deref(), Some("Red"));
        assert_eq!(final_match.away.as_deref(), Some("Yellow"));
    }
}
