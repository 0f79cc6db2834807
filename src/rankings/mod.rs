//! Yearly rankings engine: per-session scoring, ELO update with decay and
//! margin multiplier, provisional attacking/control ratings, and rank
//! movement tracking (spec §4.E).

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::cancellation::CancellationToken;
use crate::domain::rankings::{
    CupProgress, EloState, PlayerYearRecord, RankingDetail, RankingMetadata, RankingsYear,
};
use crate::domain::session::{KnockoutRound, Match, SessionDoc};
use crate::domain::Settings;
use crate::error::Result;
use crate::schedule;
use crate::teams::effective_rating;

const GAMMA: f64 = 0.5;

fn margin_multiplier(abs_goal_diff: u32) -> f64 {
    match abs_goal_diff {
        0 | 1 => 1.0,
        2 => 1.15,
        3 => 1.25,
        _ => 1.30,
    }
}

fn apply_decay(elo: &mut EloState, baseline: f64, decay_rate_per_week: f64, match_date: NaiveDate) {
    if let Some(last) = elo.last_decay_at.as_deref() {
        if let Ok(last_date) = NaiveDate::parse_from_str(last, "%Y-%m-%d") {
            let days = (match_date - last_date).num_days();
            if days > 0 {
                let weeks = days as f64 / 7.0;
                elo.rating = baseline + (elo.rating - baseline) * (1.0 - decay_rate_per_week).powf(weeks);
            }
        }
    }
    elo.last_decay_at = Some(match_date.format("%Y-%m-%d").to_string());
}

struct RatedMatch<'a> {
    home_team: &'a str,
    away_team: &'a str,
    home_score: u32,
    away_score: u32,
    k_factor: f64,
}

fn rated_matches_in_order<'a>(doc: &'a SessionDoc, settings: &Settings) -> Vec<RatedMatch<'a>> {
    let mut matches = Vec::new();
    for round in &doc.games.rounds {
        for m in round {
            if let Match::Play {
                home,
                away,
                home_score: Some(hs),
                away_score: Some(as_),
                ..
            } = m
            {
                matches.push(RatedMatch {
                    home_team: home,
                    away_team: away,
                    home_score: *hs,
                    away_score: *as_,
                    k_factor: settings.elo.k_league,
                });
            }
        }
    }
    if let Some(knockout) = &doc.games.knockout {
        let mut bracket: Vec<_> = knockout.bracket.iter().collect();
        bracket.sort_by_key(|m| (m.round, m.match_index));
        for m in bracket {
            if let (Some(home), Some(away), Some(hs), Some(as_)) =
                (&m.home, &m.away, m.home_score, m.away_score)
            {
                matches.push(RatedMatch {
                    home_team: home,
                    away_team: away,
                    home_score: hs,
                    away_score: as_,
                    k_factor: settings.elo.k_cup,
                });
            }
        }
    }
    matches
}

fn team_members<'a>(doc: &'a SessionDoc, team_name: &str) -> Vec<&'a str> {
    doc.teams
        .iter()
        .find(|t| t.name == team_name)
        .map(|t| t.members().collect())
        .unwrap_or_default()
}

fn team_goal_totals(doc: &SessionDoc, team_name: &str) -> (u32, u32) {
    let mut for_goals = 0u32;
    let mut against_goals = 0u32;
    for round in &doc.games.rounds {
        for m in round {
            if let Match::Play {
                home,
                away,
                home_score: Some(hs),
                away_score: Some(as_),
                ..
            } = m
            {
                if home == team_name {
                    for_goals += hs;
                    against_goals += as_;
                } else if away == team_name {
                    for_goals += as_;
                    against_goals += hs;
                }
            }
        }
    }
    if let Some(knockout) = &doc.games.knockout {
        for m in &knockout.bracket {
            if let (Some(hs), Some(as_)) = (m.home_score, m.away_score) {
                if m.home.as_deref() == Some(team_name) {
                    for_goals += hs;
                    against_goals += as_;
                } else if m.away.as_deref() == Some(team_name) {
                    for_goals += as_;
                    against_goals += hs;
                }
            }
        }
    }
    (for_goals, against_goals)
}

struct WorkingPlayer {
    record: PlayerYearRecord,
    goals_for_sum: f64,
    goals_against_sum: f64,
}

/// Rebuilds one year's rankings from every session document in that year,
/// processed in ascending date order. `previous_year`, if given, supplies
/// ELO carry-over for players appearing for the first time in `year`.
pub fn rebuild_year(
    year: i32,
    sessions: &[(NaiveDate, SessionDoc)],
    previous_year: Option<&RankingsYear>,
    settings: &Settings,
    cancellation: &CancellationToken,
) -> Result<RankingsYear> {
    let mut ordered: Vec<&(NaiveDate, SessionDoc)> = sessions.iter().collect();
    ordered.sort_by_key(|(date, _)| *date);

    let baseline = settings.elo.baseline;
    let threshold = settings.elo.games_threshold;
    let decay_rate = settings.elo.decay_rate_per_week;

    let mut players: HashMap<String, WorkingPlayer> = HashMap::new();

    let ensure_player = |players: &mut HashMap<String, WorkingPlayer>, name: &str| {
        if !players.contains_key(name) {
            let record = match previous_year.and_then(|py| py.players.get(name)) {
                Some(prev) => {
                    let mut record = PlayerYearRecord::new(baseline);
                    record.elo = prev.elo.clone();
                    record
                }
                None => PlayerYearRecord::new(baseline),
            };
            players.insert(
                name.to_string(),
                WorkingPlayer {
                    record,
                    goals_for_sum: 0.0,
                    goals_against_sum: 0.0,
                },
            );
        }
    };

    for (date, doc) in ordered {
        if cancellation.is_cancelled() {
            break;
        }
        let date_str = date.format("%Y-%m-%d").to_string();

        let mut team_of: HashMap<String, String> = HashMap::new();
        for team in &doc.teams {
            for member in team.members() {
                team_of.insert(member.to_string(), team.name.clone());
                ensure_player(&mut players, member);
            }
        }
        let standings = schedule::league_standings(&doc.games.rounds);
        let league_winner_team = standings.first().map(|s| s.team.clone());
        let second_place_team = standings.get(1).map(|s| s.team.clone());
        let league_position_of: HashMap<&str, u32> = standings
            .iter()
            .enumerate()
            .map(|(i, row)| (row.team.as_str(), (i + 1) as u32))
            .collect();

        let cup_winner_team = doc.games.knockout.as_ref().map(schedule::cup_winner).flatten();

        // match points
        let mut match_points: HashMap<String, f64> = HashMap::new();
        for round in &doc.games.rounds {
            for m in round {
                if let Match::Play {
                    home,
                    away,
                    home_score: Some(hs),
                    away_score: Some(as_),
                    ..
                } = m
                {
                    let (home_pts, away_pts) = if hs > as_ {
                        (3.0, 0.0)
                    } else if hs < as_ {
                        (0.0, 3.0)
                    } else {
                        (1.0, 1.0)
                    };
                    for member in team_members(doc, home) {
                        *match_points.entry(member.to_string()).or_insert(0.0) += home_pts;
                    }
                    for member in team_members(doc, away) {
                        *match_points.entry(member.to_string()).or_insert(0.0) += away_pts;
                    }
                }
            }
        }

        // bonus points
        let mut bonus_points: HashMap<String, f64> = HashMap::new();
        if let Some(first) = &league_winner_team {
            for member in team_members(doc, first) {
                *bonus_points.entry(member.to_string()).or_insert(0.0) += 2.0;
            }
        }
        if let Some(second) = &second_place_team {
            for member in team_members(doc, second) {
                *bonus_points.entry(member.to_string()).or_insert(0.0) += 1.0;
            }
        }

        // knockout points
        let mut knockout_points: HashMap<String, f64> = HashMap::new();
        let mut team_knockout_matches_won: HashMap<String, u32> = HashMap::new();
        let mut team_played_knockout: std::collections::HashSet<String> = Default::default();
        if let Some(knockout) = &doc.games.knockout {
            for m in &knockout.bracket {
                if let Some(home) = &m.home {
                    team_played_knockout.insert(home.clone());
                }
                if let Some(away) = &m.away {
                    team_played_knockout.insert(away.clone());
                }
                if let Some(winner) = m.winner() {
                    *team_knockout_matches_won
                        .entry(winner.to_string())
                        .or_insert(0) += 1;
                }
            }
        }
        for (team, wins) in &team_knockout_matches_won {
            for member in team_members(doc, team) {
                *knockout_points.entry(member.to_string()).or_insert(0.0) += 4.0 * (*wins as f64);
            }
        }

        // goal totals per team, attributed to every member
        let mut team_goals_cache: HashMap<String, (u32, u32)> = HashMap::new();
        for team in &doc.teams {
            team_goals_cache.insert(team.name.clone(), team_goal_totals(doc, &team.name));
        }

        // rating updates (ELO), in match order
        let rated = rated_matches_in_order(doc, settings);
        for rm in &rated {
            let home_members: Vec<String> = team_members(doc, rm.home_team)
                .into_iter()
                .map(String::from)
                .collect();
            let away_members: Vec<String> = team_members(doc, rm.away_team)
                .into_iter()
                .map(String::from)
                .collect();

            for name in home_members.iter().chain(away_members.iter()) {
                ensure_player(&mut players, name);
                let wp = players.get_mut(name).unwrap();
                apply_decay(&mut wp.record.elo, baseline, decay_rate, *date);
            }

            let home_avg: f64 = if home_members.is_empty() {
                baseline
            } else {
                home_members
                    .iter()
                    .map(|n| players[n].record.elo.rating)
                    .sum::<f64>()
                    / home_members.len() as f64
            };
            let away_avg: f64 = if away_members.is_empty() {
                baseline
            } else {
                away_members
                    .iter()
                    .map(|n| players[n].record.elo.rating)
                    .sum::<f64>()
                    / away_members.len() as f64
            };

            let diff = rm.home_score.abs_diff(rm.away_score);
            let margin = margin_multiplier(diff);
            let k_eff = rm.k_factor * margin;
            let e_home = 1.0 / (1.0 + 10f64.powf((away_avg - home_avg) / 400.0));
            let e_away = 1.0 - e_home;

            let (actual_home, actual_away) = if rm.home_score > rm.away_score {
                (1.0, 0.0)
            } else if rm.home_score < rm.away_score {
                (0.0, 1.0)
            } else {
                (0.5, 0.5)
            };

            for name in &home_members {
                let wp = players.get_mut(name).unwrap();
                wp.record.elo.rating += k_eff * (actual_home - e_home);
                wp.record.elo.games_played += 1;
            }
            for name in &away_members {
                let wp = players.get_mut(name).unwrap();
                wp.record.elo.rating += k_eff * (actual_away - e_away);
                wp.record.elo.games_played += 1;
            }
        }

        // goals-for/against running averages
        for (name, team) in &team_of {
            let (gf, ga) = team_goals_cache.get(team).copied().unwrap_or((0, 0));
            let wp = players.get_mut(name).unwrap();
            wp.goals_for_sum += gf as f64;
            wp.goals_against_sum += ga as f64;
        }

        // attacking/control normalization across the active pool
        let established_names: Vec<String> = players
            .iter()
            .filter(|(_, wp)| wp.record.elo.is_established(threshold))
            .map(|(n, _)| n.clone())
            .collect();

        let appearances_after = |wp: &WorkingPlayer, name: &str| {
            wp.record
                .ranking_detail
                .values()
                .filter(|d| d.team.is_some())
                .count()
                + if team_of.contains_key(name) { 1 } else { 0 }
        };

        let raw_attacking: HashMap<String, f64> = players
            .iter()
            .map(|(n, wp)| {
                let apps = appearances_after(wp, n).max(1) as f64;
                (n.clone(), wp.goals_for_sum / apps)
            })
            .collect();
        let raw_control: HashMap<String, f64> = players
            .iter()
            .map(|(n, wp)| {
                let apps = appearances_after(wp, n).max(1) as f64;
                (n.clone(), wp.goals_against_sum / apps)
            })
            .collect();

        let minmax = |values: &[f64]| -> (f64, f64) {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (min, (max - min).max(1e-9))
        };
        let established_attacking: Vec<f64> = established_names
            .iter()
            .map(|n| raw_attacking[n])
            .collect();
        let established_control: Vec<f64> = established_names
            .iter()
            .map(|n| raw_control[n])
            .collect();
        let (att_min, att_range) = if established_attacking.is_empty() {
            (0.0, 1.0)
        } else {
            minmax(&established_attacking)
        };
        let (ctrl_min, ctrl_range) = if established_control.is_empty() {
            (0.0, 1.0)
        } else {
            minmax(&established_control)
        };

        let normalize_attacking = |raw: f64| -> f64 { ((raw - att_min) / att_range).clamp(0.0, 1.0) };
        // lower goals-against is better control; invert after normalizing
        let normalize_control = |raw: f64| -> f64 { 1.0 - ((raw - ctrl_min) / ctrl_range).clamp(0.0, 1.0) };

        let established_attacking_norm: Vec<f64> = established_attacking
            .iter()
            .map(|v| normalize_attacking(*v))
            .collect();
        let established_control_norm: Vec<f64> = established_control
            .iter()
            .map(|v| normalize_control(*v))
            .collect();

        for (name, wp) in players.iter_mut() {
            let games_played = wp.record.elo.games_played;
            let naive_attacking = normalize_attacking(raw_attacking[name]);
            let naive_control = normalize_control(raw_control[name]);
            wp.record.attacking_rating = effective_rating(
                naive_attacking,
                games_played,
                threshold,
                &established_attacking_norm,
                0.0,
            );
            wp.record.control_rating = effective_rating(
                naive_control,
                games_played,
                threshold,
                &established_control_norm,
                0.0,
            );
        }

        // per-date detail, points, and cup progress for every active player
        for (name, wp) in players.iter_mut() {
            let is_participant = team_of.contains_key(name);
            let appearance_points = if is_participant { 1.0 } else { 0.0 };
            let mp = match_points.get(name).copied().unwrap_or(0.0);
            let bp = bonus_points.get(name).copied().unwrap_or(0.0);
            let kp = knockout_points.get(name).copied().unwrap_or(0.0);
            let total = appearance_points + mp + bp + kp;

            let team = team_of.get(name).cloned();
            let league_position = team
                .as_deref()
                .and_then(|t| league_position_of.get(t))
                .copied();
            let league_winner = team.as_deref() == league_winner_team.as_deref() && team.is_some();
            let cup_winner = team.is_some() && team.as_deref() == cup_winner_team;

            let cup_progress = if doc.games.knockout.is_none() {
                None
            } else if !is_participant {
                None
            } else {
                let team_name = team.clone().unwrap();
                if !team_played_knockout.contains(&team_name) {
                    Some(CupProgress::DidNotPlay)
                } else if cup_winner {
                    Some(CupProgress::Winner)
                } else {
                    let furthest = doc
                        .games
                        .knockout
                        .as_ref()
                        .unwrap()
                        .bracket
                        .iter()
                        .filter(|m| {
                            m.home.as_deref() == Some(team_name.as_str())
                                || m.away.as_deref() == Some(team_name.as_str())
                        })
                        .map(|m| m.round)
                        .max();
                    furthest.map(CupProgress::Reached)
                }
            };

            wp.record.ranking_detail.insert(
                date_str.clone(),
                RankingDetail {
                    team,
                    appearance_points,
                    match_points: mp,
                    bonus_points: bp,
                    knockout_points: kp,
                    total_points: total,
                    rank: None,
                    total_players: 0,
                    elo_rating: wp.record.elo.rating,
                    elo_games: wp.record.elo.games_played,
                    attacking_rating: wp.record.attacking_rating,
                    control_rating: wp.record.control_rating,
                    league_winner,
                    cup_winner,
                    league_position,
                    cup_progress,
                },
            );

            if wp.record.ranking_detail.len() == 1 {
                wp.record.is_new = true;
            } else {
                wp.record.is_new = false;
            }
            wp.record.appearances = wp
                .record
                .ranking_detail
                .values()
                .filter(|d| d.team.is_some())
                .count() as u32;
            wp.record.points = wp
                .record
                .ranking_detail
                .values()
                .map(|d| d.total_points)
                .sum();
            if league_winner {
                wp.record.league_wins += 1;
            }
            if cup_winner {
                wp.record.cup_wins += 1;
            }
            wp.record.goals_for_per_session = wp.goals_for_sum / wp.record.appearances.max(1) as f64;
            wp.record.goals_against_per_session =
                wp.goals_against_sum / wp.record.appearances.max(1) as f64;
        }

        // ranking points + rank determination over every player active so far
        let max_appearances = players
            .values()
            .map(|wp| wp.record.appearances)
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        for wp in players.values_mut() {
            wp.record.ranking_points = wp.record.points
                * (wp.record.appearances as f64 / max_appearances).powf(GAMMA);
        }

        let mut active: Vec<&String> = players.keys().collect();
        active.sort_by(|a, b| {
            let pa = &players[*a].record;
            let pb = &players[*b].record;
            pb.ranking_points
                .partial_cmp(&pa.ranking_points)
                .unwrap()
                .then_with(|| pb.elo.rating.partial_cmp(&pa.elo.rating).unwrap())
                .then_with(|| a.cmp(b))
        });
        let total_players = active.len() as u32;
        let ranks: HashMap<String, u32> = active
            .iter()
            .enumerate()
            .map(|(i, name)| ((*name).clone(), (i + 1) as u32))
            .collect();

        for (name, rank) in &ranks {
            let wp = players.get_mut(name).unwrap();
            let old_rank = wp.record.rank;
            wp.record.previous_rank = old_rank;
            wp.record.rank = Some(*rank);
            wp.record.rank_movement = old_rank.map(|old| old as i32 - *rank as i32);
            if let Some(detail) = wp.record.ranking_detail.get_mut(&date_str) {
                detail.rank = Some(*rank);
                detail.total_players = total_players;
            }
        }
    }

    let global_average = if players.is_empty() {
        0.0
    } else {
        players.values().map(|wp| wp.record.ranking_points).sum::<f64>() / players.len() as f64
    };

    let mut year_doc = RankingsYear::new(year);
    year_doc.metadata = RankingMetadata {
        gamma: GAMMA,
        global_average,
    };
    for (name, wp) in players {
        year_doc.players.insert(name, wp.record);
    }
    Ok(year_doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{PlayerLists, SessionGames, Team};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn session_with_match(home: &str, away: &str, hs: u32, as_: u32, members: [&str; 4]) -> SessionDoc {
        let mut home_team = Team::new(home, 2);
        home_team.slots[0] = Some(members[0].to_string());
        home_team.slots[1] = Some(members[1].to_string());
        let mut away_team = Team::new(away, 2);
        away_team.slots[0] = Some(members[2].to_string());
        away_team.slots[1] = Some(members[3].to_string());

        SessionDoc {
            players: PlayerLists {
                available: members.iter().map(|s| s.to_string()).collect(),
                waiting_list: vec![],
            },
            teams: vec![home_team, away_team],
            games: SessionGames {
                rounds: vec![vec![Match::Play {
                    home: home.to_string(),
                    away: away.to_string(),
                    home_score: Some(hs),
                    away_score: Some(as_),
                    home_scorers: Default::default(),
                    away_scorers: Default::default(),
                }]],
                knockout: None,
            },
            settings: None,
            meta: None,
        }
    }

    #[test]
    fn margin_multiplier_matches_examples() {
        assert_eq!(margin_multiplier(0), 1.0);
        assert_eq!(margin_multiplier(1), 1.0);
        assert_eq!(margin_multiplier(2), 1.15);
        assert_eq!(margin_multiplier(3), 1.25);
        assert_eq!(margin_multiplier(4), 1.30);
    }

    #[test]
    fn decay_matches_five_week_break_example() {
        let mut elo = EloState {
            rating: 1200.0,
            games_played: 10,
            last_decay_at: Some("2025-12-21".to_string()),
        };
        apply_decay(&mut elo, 1000.0, 0.02, date("2026-01-25"));
        assert!((elo.rating - 1180.8).abs() < 0.2);
    }

    #[test]
    fn rebuild_year_applies_elo_margin_update() {
        let settings = Settings::default();
        let doc = session_with_match("Red", "Blue", 3, 0, ["A", "B", "C", "D"]);
        let cancellation = CancellationToken::new();

        let year = rebuild_year(2026, &[(date("2026-01-01"), doc)], None, &settings, &cancellation)
            .unwrap();

        let a = &year.players["A"];
        let c = &year.players["C"];
        // margin 3 -> multiplier 1.25, K=24*1.25=30, even avgs -> E=0.5, delta = 15
        assert!((a.elo.rating - 1015.0).abs() < 1e-6);
        assert!((c.elo.rating - 985.0).abs() < 1e-6);
        assert_eq!(a.elo.games_played, 1);
        assert_eq!(a.appearances, 1);
        assert_eq!(a.rank, Some(1));
    }

    #[test]
    fn rebuild_year_is_idempotent() {
        let settings = Settings::default();
        let doc = session_with_match("Red", "Blue", 2, 1, ["A", "B", "C", "D"]);
        let cancellation = CancellationToken::new();

        let first = rebuild_year(
            2026,
            &[(date("2026-01-01"), doc.clone())],
            None,
            &settings,
            &cancellation,
        )
        .unwrap();
        let second = rebuild_year(2026, &[(date("2026-01-01"), doc)], None, &settings, &cancellation)
            .unwrap();

        assert_eq!(first.players["A"].elo.games_played, second.players["A"].elo.games_played);
        assert!((first.players["A"].elo.rating - second.players["A"].elo.rating).abs() < 1e-9);
    }
}
