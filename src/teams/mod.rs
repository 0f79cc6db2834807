//! Seeded team generator: pot draft plus iterative multi-objective balance
//! optimization under hard constraints (spec §4.C).

pub mod pair_history;

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::cancellation::CancellationToken;
use crate::domain::session::{Team, Teams};
use crate::domain::Settings;
use crate::error::{Error, Result};
use pair_history::PairHistory;

const MAX_ITER: u32 = 5000;
const EARLY_EXIT_AFTER: u32 = 2000;
const EARLY_EXIT_SCORE: f64 = 0.25;
const PAIR_HISTORY_WINDOW: u32 = 12;
const MAX_PAIR_REPEATS: u32 = 4;

const WEIGHT_ELO: f64 = 1.0;
const WEIGHT_SPREAD: f64 = 0.7;
const WEIGHT_PAIR: f64 = 1.3;

const COLORS: &[&str] = &[
    "Red", "Blue", "Green", "Yellow", "Orange", "Purple", "Black", "White",
];
const NOUNS: &[&str] = &[
    "Lions", "Hawks", "Wolves", "Foxes", "Eagles", "Tigers", "Bears", "Sharks",
];

/// One player's rating inputs to team generation, resolved from the current
/// (or, on fallback, previous) year's rankings.
#[derive(Debug, Clone)]
pub struct PlayerRating {
    pub name: String,
    pub elo: f64,
    pub elo_games_played: u32,
    pub attacking_rating: f64,
    pub attacking_established: bool,
    pub control_rating: f64,
    pub control_established: bool,
    pub ranking_points: f64,
    pub appearances: u32,
}

impl PlayerRating {
    /// A player with no prior record: baseline ELO, zero of everything else.
    pub fn unranked(name: impl Into<String>, baseline_elo: f64) -> Self {
        PlayerRating {
            name: name.into(),
            elo: baseline_elo,
            elo_games_played: 0,
            attacking_rating: 0.0,
            attacking_established: false,
            control_rating: 0.0,
            control_established: false,
            ranking_points: 0.0,
            appearances: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamConfig {
    pub team_count: u32,
    pub team_sizes: Vec<u32>,
}

impl TeamConfig {
    fn validate(&self, player_count: usize) -> Result<()> {
        if self.team_sizes.len() as u32 != self.team_count {
            return Err(Error::team("teamSizes length must equal teams"));
        }
        let total: u32 = self.team_sizes.iter().sum();
        if total as usize != player_count {
            return Err(Error::team(format!(
                "need {total} players for this configuration, have {player_count}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub player: String,
    pub from_pot: usize,
    pub to_team: String,
    pub final_team: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedTeams {
    pub teams: Teams,
    pub draw_history: Vec<DrawRecord>,
    pub score: f64,
    pub iterations: u32,
}

/// Resolves a player's effective rating for seeding. `established` gives the
/// raw values of every established player in the pool (for the same rating
/// dimension) used to compute the provisional anchor.
///
/// Also reused by the rankings engine (spec §4.E.7) to interpolate
/// attacking/control ratings for not-yet-established players, since §4.C
/// defines this formula once and §4.E explicitly reuses it.
pub(crate) fn effective_rating(
    actual: f64,
    games_played: u32,
    games_threshold: u32,
    established: &[f64],
    baseline: f64,
) -> f64 {
    if games_played >= games_threshold {
        return actual;
    }
    let anchor = match established.iter().cloned().fold(None, |min, v| {
        Some(min.map_or(v, |m: f64| m.min(v)))
    }) {
        Some(weakest) => 0.99 * weakest,
        None => baseline,
    };
    let pull = games_played as f64 / games_threshold as f64;
    anchor + (actual - anchor) * pull
}

struct ResolvedPlayer {
    name: String,
    effective_elo: f64,
    ranking_points: f64,
    appearances: u32,
}

fn resolve_players(ratings: &[PlayerRating], settings: &Settings) -> Vec<ResolvedPlayer> {
    let threshold = settings.elo.games_threshold;
    let baseline = settings.elo.baseline;
    let established_elos: Vec<f64> = ratings
        .iter()
        .filter(|r| r.elo_games_played >= threshold)
        .map(|r| r.elo)
        .collect();

    ratings
        .iter()
        .map(|r| ResolvedPlayer {
            name: r.name.clone(),
            effective_elo: effective_rating(
                r.elo,
                r.elo_games_played,
                threshold,
                &established_elos,
                baseline,
            ),
            ranking_points: r.ranking_points,
            appearances: r.appearances,
        })
        .collect()
}

/// A single pot-draft pass: sort, partition into pots of `2 * team_count`,
/// shuffle each pot, snake-draft across teams.
fn draft_once(
    players: &[ResolvedPlayer],
    team_count: usize,
    rng: &mut impl Rng,
) -> (Vec<Vec<usize>>, Vec<usize>) {
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| {
        let pa = &players[a];
        let pb = &players[b];
        pb.effective_elo
            .partial_cmp(&pa.effective_elo)
            .unwrap()
            .then_with(|| pb.ranking_points.partial_cmp(&pa.ranking_points).unwrap())
            .then_with(|| pb.appearances.cmp(&pa.appearances))
            .then_with(|| pa.name.cmp(&pb.name))
    });

    let pot_size = 2 * team_count;
    let mut assignment = vec![0usize; players.len()];
    let mut pot_of = vec![0usize; players.len()];
    let mut teams: Vec<Vec<usize>> = vec![Vec::new(); team_count];

    for (pot_index, pot) in order.chunks(pot_size).enumerate() {
        let mut pot = pot.to_vec();
        pot.shuffle(rng);
        for (slot, &player_idx) in pot.iter().enumerate() {
            let team = if pot_index % 2 == 0 {
                slot % team_count
            } else {
                team_count - 1 - (slot % team_count)
            };
            teams[team].push(player_idx);
            assignment[player_idx] = team;
            pot_of[player_idx] = pot_index;
        }
    }

    (teams, pot_of)
}

fn team_avg(players: &[ResolvedPlayer], team: &[usize]) -> f64 {
    if team.is_empty() {
        return 0.0;
    }
    team.iter().map(|&i| players[i].effective_elo).sum::<f64>() / team.len() as f64
}

fn violates_pair_history(history: &mut PairHistory, players: &[ResolvedPlayer], teams: &[Vec<usize>]) -> bool {
    for team in teams {
        for i in 0..team.len() {
            for j in (i + 1)..team.len() {
                let count = history.pair_count(&players[team[i]].name, &players[team[j]].name);
                if count >= MAX_PAIR_REPEATS {
                    return true;
                }
            }
        }
    }
    false
}

fn pool_elo_range(players: &[ResolvedPlayer]) -> f64 {
    let min = players
        .iter()
        .map(|p| p.effective_elo)
        .fold(f64::INFINITY, f64::min);
    let max = players
        .iter()
        .map(|p| p.effective_elo)
        .fold(f64::NEG_INFINITY, f64::max);
    (max - min).max(1.0)
}

fn violates_elo_delta(players: &[ResolvedPlayer], teams: &[Vec<usize>], pool_range: f64) -> bool {
    let avgs: Vec<f64> = teams.iter().map(|t| team_avg(players, t)).collect();
    let spread = avgs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - avgs.iter().cloned().fold(f64::INFINITY, f64::min);
    spread > (60.0_f64).max(0.15 * pool_range)
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn normalized_score(
    players: &[ResolvedPlayer],
    teams: &[Vec<usize>],
    pool_range: f64,
    history: &mut PairHistory,
) -> f64 {
    let avgs: Vec<f64> = teams.iter().map(|t| team_avg(players, t)).collect();
    let elo_spread = avgs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - avgs.iter().cloned().fold(f64::INFINITY, f64::min);
    let n_elo = 1.0 - (elo_spread / pool_range).clamp(0.0, 1.0);

    let distribution_scores: Vec<f64> = teams
        .iter()
        .map(|team| {
            let elos: Vec<f64> = team.iter().map(|&i| players[i].effective_elo).collect();
            let max = elos.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min = elos.iter().cloned().fold(f64::INFINITY, f64::min);
            1.0 * median(elos) + 0.6 * max + 0.4 * min
        })
        .collect();
    let dist_spread = distribution_scores
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        - distribution_scores
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
    let lower = pool_range * 0.5;
    let upper = pool_range * 1.5;
    let n_spread = 1.0 - (((dist_spread - lower) / (upper - lower)).clamp(0.0, 1.0));

    let mut pair_sum = 0.0;
    let mut pair_total = 0u32;
    for team in teams {
        for i in 0..team.len() {
            for j in (i + 1)..team.len() {
                let count = history.pair_count(&players[team[i]].name, &players[team[j]].name);
                pair_sum += (count + 1) as f64;
                pair_total += 1;
            }
        }
    }
    let pair_upper = (pair_total.max(1)) as f64 * (PAIR_HISTORY_WINDOW + 1) as f64;
    let n_pair = 1.0 - (pair_sum / pair_upper).clamp(0.0, 1.0);

    (WEIGHT_ELO * n_elo + WEIGHT_SPREAD * n_spread + WEIGHT_PAIR * n_pair)
        / (WEIGHT_ELO + WEIGHT_SPREAD + WEIGHT_PAIR)
}

fn team_names(count: usize, rng: &mut impl Rng) -> Vec<String> {
    let mut colors = COLORS.to_vec();
    colors.shuffle(rng);
    let mut nouns = NOUNS.to_vec();
    nouns.shuffle(rng);
    (0..count)
        .map(|i| format!("{} {}", colors[i % colors.len()], nouns[i % nouns.len()]))
        .collect()
}

/// Generates balanced teams for a session roster.
///
/// `history` accumulates pair counts across calls; callers typically load it
/// once per league from the last 12 session documents.
pub fn generate_teams(
    players_in_order: &[String],
    ratings: &HashMap<String, PlayerRating>,
    settings: &Settings,
    config: &TeamConfig,
    history: &mut PairHistory,
    cancellation: &CancellationToken,
) -> Result<GeneratedTeams> {
    config.validate(players_in_order.len())?;
    if config.team_count == 0 {
        return Err(Error::team("team count must be at least 1"));
    }

    let rating_rows: Vec<PlayerRating> = players_in_order
        .iter()
        .map(|name| {
            ratings
                .get(name)
                .cloned()
                .unwrap_or_else(|| PlayerRating::unranked(name.clone(), settings.elo.baseline))
        })
        .collect();
    let resolved = resolve_players(&rating_rows, settings);
    let pool_range = pool_elo_range(&resolved);

    let mut rng = rand::thread_rng();
    let mut best: Option<(Vec<Vec<usize>>, Vec<usize>, f64)> = None;
    let mut iterations = 0u32;

    while iterations < MAX_ITER {
        if cancellation.is_cancelled() {
            break;
        }
        iterations += 1;

        let (teams, pot_of) = draft_once(&resolved, config.team_count as usize, &mut rng);

        if violates_pair_history(history, &resolved, &teams) {
            continue;
        }
        if violates_elo_delta(&resolved, &teams, pool_range) {
            continue;
        }

        let score = normalized_score(&resolved, &teams, pool_range, history);
        let is_better = match &best {
            Some((_, _, best_score)) => score > *best_score,
            None => true,
        };
        if is_better {
            best = Some((teams, pot_of, score));
        }

        if iterations > EARLY_EXIT_AFTER {
            if let Some((_, _, best_score)) = &best {
                if *best_score <= EARLY_EXIT_SCORE {
                    break;
                }
            }
        }
    }

    let (team_assignment, pot_of, score) = best.ok_or_else(|| {
        Error::team("unable to find a team split satisfying balance constraints")
    })?;

    let names = team_names(config.team_count as usize, &mut rng);
    let mut teams: Teams = Vec::new();
    let mut draw_history = Vec::new();

    for (team_idx, member_indices) in team_assignment.iter().enumerate() {
        let size = config
            .team_sizes
            .get(team_idx)
            .copied()
            .unwrap_or(member_indices.len() as u32) as usize;
        let mut team = Team::new(names[team_idx].clone(), size.max(member_indices.len()));
        for (slot, &player_idx) in member_indices.iter().enumerate() {
            team.slots[slot] = Some(resolved[player_idx].name.clone());
            draw_history.push(DrawRecord {
                player: resolved[player_idx].name.clone(),
                from_pot: pot_of[player_idx],
                to_team: names[team_idx].clone(),
                final_team: names[team_idx].clone(),
            });
        }
        teams.push(team);
    }

    Ok(GeneratedTeams {
        teams,
        draw_history,
        score,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn effective_rating_matches_provisional_pull_example() {
        // weakest established 900 -> anchor 891, actual 1100, gamesPlayed 14/35
        let effective = effective_rating(1100.0, 14, 35, &[900.0, 950.0], 1000.0);
        assert!((effective - 975.0).abs() < 1e-9);
    }

    #[test]
    fn effective_rating_uses_actual_once_established() {
        let effective = effective_rating(1234.0, 40, 35, &[900.0], 1000.0);
        assert_eq!(effective, 1234.0);
    }

    #[test]
    fn generate_teams_splits_eight_players_into_two_balanced_teams() {
        let names: Vec<String> = vec![
            "P1300", "P1250", "P1200", "P1150", "P1100", "P1050", "P1000", "P950",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let elos = [1300.0, 1250.0, 1200.0, 1150.0, 1100.0, 1050.0, 1000.0, 950.0];

        let mut ratings = HashMap::new();
        for (name, elo) in names.iter().zip(elos.iter()) {
            ratings.insert(
                name.clone(),
                PlayerRating {
                    name: name.clone(),
                    elo: *elo,
                    elo_games_played: 35,
                    attacking_rating: 0.0,
                    attacking_established: true,
                    control_rating: 0.0,
                    control_established: true,
                    ranking_points: 0.0,
                    appearances: 10,
                },
            );
        }

        let config = TeamConfig {
            team_count: 2,
            team_sizes: vec![4, 4],
        };
        let mut history = PairHistory::new();
        let cancellation = CancellationToken::new();

        let result = generate_teams(&names, &ratings, &settings(), &config, &mut history, &cancellation)
            .unwrap();

        assert_eq!(result.teams.len(), 2);
        let avg_a: f64 = result.teams[0]
            .members()
            .map(|n| ratings[n].elo)
            .sum::<f64>()
            / 4.0;
        let avg_b: f64 = result.teams[1]
            .members()
            .map(|n| ratings[n].elo)
            .sum::<f64>()
            / 4.0;
        assert!((avg_a - avg_b).abs() <= 60.0);
    }

    #[test]
    fn generate_teams_rejects_mismatched_config() {
        let names = vec!["Ada".to_string(), "Bo".to_string()];
        let config = TeamConfig {
            team_count: 2,
            team_sizes: vec![1, 1, 1],
        };
        let mut history = PairHistory::new();
        let cancellation = CancellationToken::new();
        let err = generate_teams(
            &names,
            &HashMap::new(),
            &settings(),
            &config,
            &mut history,
            &cancellation,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Team(_)));
    }
}
