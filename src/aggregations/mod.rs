//! Read-only rollups over rankings and session documents: champions,
//! golden boot, and year-in-review (spec §4.G).

use std::collections::HashMap;

use crate::domain::rankings::RankingsYear;
use crate::domain::session::{Match, SessionDoc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrophyType {
    League,
    Cup,
}

/// Every date (within the year) on which `player`'s team won the named
/// trophy, most recent first.
pub fn champion_dates(year: &RankingsYear, player: &str, trophy: TrophyType) -> Vec<String> {
    let Some(record) = year.players.get(player) else {
        return Vec::new();
    };
    let mut dates: Vec<String> = record
        .ranking_detail
        .iter()
        .filter(|(_, detail)| match trophy {
            TrophyType::League => detail.league_winner,
            TrophyType::Cup => detail.cup_winner,
        })
        .map(|(date, _)| date.clone())
        .collect();
    dates.sort();
    dates.reverse();
    dates
}

/// Sum of a player's non-reserved scorer counts across every match in
/// `sessions` (league and knockout).
pub fn golden_boot(sessions: &[SessionDoc]) -> HashMap<String, u32> {
    let mut totals: HashMap<String, u32> = HashMap::new();
    for doc in sessions {
        for round in &doc.games.rounds {
            for m in round {
                if let Match::Play {
                    home_scorers,
                    away_scorers,
                    ..
                } = m
                {
                    accumulate_scorers(&mut totals, home_scorers);
                    accumulate_scorers(&mut totals, away_scorers);
                }
            }
        }
        if let Some(knockout) = &doc.games.knockout {
            for m in &knockout.bracket {
                accumulate_scorers(&mut totals, &m.home_scorers);
                accumulate_scorers(&mut totals, &m.away_scorers);
            }
        }
    }
    totals
}

fn accumulate_scorers(totals: &mut HashMap<String, u32>, scorers: &HashMap<String, u32>) {
    for (name, count) in scorers {
        if name == crate::domain::session::OWN_GOAL_KEY || name == crate::domain::session::UNASSIGNED_KEY {
            continue;
        }
        *totals.entry(name.clone()).or_insert(0) += count;
    }
}

#[derive(Debug, Clone)]
pub struct IronMan {
    pub player: String,
    pub appearances: u32,
}

#[derive(Debug, Clone)]
pub struct MostImproved {
    pub player: String,
    pub rank_delta: i32,
}

#[derive(Debug, Clone)]
pub struct KingOfKings {
    pub player: String,
    pub trophies: u32,
}

#[derive(Debug, Clone)]
pub struct PlayerOfYear {
    pub player: String,
    pub ranking_points: f64,
}

#[derive(Debug, Clone)]
pub struct TeamOfYearMember {
    pub player: String,
    pub ranking_points: f64,
}

#[derive(Debug, Clone)]
pub struct SessionTeamResult {
    pub date: String,
    pub team: String,
    pub points_percentage: f64,
    pub goal_difference: i64,
}

#[derive(Debug, Clone)]
pub struct MatchHighlight {
    pub date: String,
    pub home: String,
    pub away: String,
    pub home_score: u32,
    pub away_score: u32,
}

#[derive(Debug, Clone)]
pub struct SessionGoalCount {
    pub date: String,
    pub total_goals: u32,
}

#[derive(Debug, Clone, Default)]
pub struct YearInReview {
    pub iron_man: Vec<IronMan>,
    pub most_improved: Option<MostImproved>,
    pub king_of_kings: Option<KingOfKings>,
    pub player_of_year: Option<PlayerOfYear>,
    pub team_of_year: Vec<TeamOfYearMember>,
    pub best_session_team: Option<SessionTeamResult>,
    pub worst_session_team: Option<SessionTeamResult>,
    pub highest_scoring_match: Option<MatchHighlight>,
    pub biggest_margin: Option<MatchHighlight>,
    pub highest_scoring_session: Option<SessionGoalCount>,
    pub lowest_scoring_session: Option<SessionGoalCount>,
}

/// Builds the year-in-review rollups from one year's rankings plus the raw
/// session documents underlying it (`(date, doc)` pairs, any order).
pub fn year_in_review(year: &RankingsYear, sessions: &[(String, SessionDoc)]) -> YearInReview {
    let mut review = YearInReview::default();

    let mut iron_man: Vec<IronMan> = year
        .players
        .iter()
        .map(|(name, record)| IronMan {
            player: name.clone(),
            appearances: record.appearances,
        })
        .collect();
    iron_man.sort_by(|a, b| b.appearances.cmp(&a.appearances).then_with(|| a.player.cmp(&b.player)));
    review.iron_man = iron_man.into_iter().take(3).collect();

    review.most_improved = year
        .players
        .iter()
        .filter_map(|(name, record)| {
            record
                .rank_movement
                .map(|delta| MostImproved {
                    player: name.clone(),
                    rank_delta: delta,
                })
        })
        .max_by_key(|m| m.rank_delta);

    review.king_of_kings = year
        .players
        .iter()
        .map(|(name, record)| KingOfKings {
            player: name.clone(),
            trophies: record.league_wins + record.cup_wins,
        })
        .max_by_key(|k| k.trophies);

    review.player_of_year = year
        .players
        .iter()
        .map(|(name, record)| PlayerOfYear {
            player: name.clone(),
            ranking_points: record.ranking_points,
        })
        .max_by(|a, b| a.ranking_points.partial_cmp(&b.ranking_points).unwrap());

    let mut by_points: Vec<TeamOfYearMember> = year
        .players
        .iter()
        .map(|(name, record)| TeamOfYearMember {
            player: name.clone(),
            ranking_points: record.ranking_points,
        })
        .collect();
    by_points.sort_by(|a, b| b.ranking_points.partial_cmp(&a.ranking_points).unwrap());
    review.team_of_year = by_points.into_iter().take(6).collect();

    let mut session_teams: Vec<SessionTeamResult> = Vec::new();
    let mut highest_scoring_match: Option<MatchHighlight> = None;
    let mut biggest_margin: Option<MatchHighlight> = None;
    let mut goal_counts: Vec<SessionGoalCount> = Vec::new();

    for (date, doc) in sessions {
        let standings = crate::schedule::league_standings(&doc.games.rounds);
        let mut session_total_goals = 0u32;

        for row in &standings {
            if row.played == 0 {
                continue;
            }
            let max_points = row.played * 3;
            let points_percentage = if max_points == 0 {
                0.0
            } else {
                row.points as f64 / max_points as f64
            };
            session_teams.push(SessionTeamResult {
                date: date.clone(),
                team: row.team.clone(),
                points_percentage,
                goal_difference: row.goals_for as i64 - row.goals_against as i64,
            });
        }

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
                    session_total_goals += hs + as_;
                    let highlight = MatchHighlight {
                        date: date.clone(),
                        home: home.clone(),
                        away: away.clone(),
                        home_score: *hs,
                        away_score: *as_,
                    };
                    if highest_scoring_match
                        .as_ref()
                        .map(|h| hs + as_ > h.home_score + h.away_score)
                        .unwrap_or(true)
                    {
                        highest_scoring_match = Some(highlight.clone());
                    }
                    let margin = hs.abs_diff(*as_);
                    if biggest_margin
                        .as_ref()
                        .map(|h| margin > h.home_score.abs_diff(h.away_score))
                        .unwrap_or(true)
                    {
                        biggest_margin = Some(highlight);
                    }
                }
            }
        }

        goal_counts.push(SessionGoalCount {
            date: date.clone(),
            total_goals: session_total_goals,
        });
    }

    session_teams.sort_by(|a, b| {
        b.points_percentage
            .partial_cmp(&a.points_percentage)
            .unwrap()
            .then_with(|| b.goal_difference.cmp(&a.goal_difference))
    });
    review.best_session_team = session_teams.first().cloned();
    review.worst_session_team = session_teams.last().cloned();

    review.highest_scoring_match = highest_scoring_match;
    review.biggest_margin = biggest_margin;

    goal_counts.sort_by_key(|g| g.total_goals);
    review.lowest_scoring_session = goal_counts.first().cloned();
    review.highest_scoring_session = goal_counts.last().cloned();

    review
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rankings::{PlayerYearRecord, RankingDetail};

    fn year_with_league_winner(player: &str, date: &str) -> RankingsYear {
        let mut year = RankingsYear::new(2026);
        let mut record = PlayerYearRecord::new(1000.0);
        record.ranking_detail.insert(
            date.to_string(),
            RankingDetail {
                team: Some("Blue".to_string()),
                appearance_points: 1.0,
                match_points: 3.0,
                bonus_points: 2.0,
                knockout_points: 0.0,
                total_points: 6.0,
                rank: Some(1),
                total_players: 1,
                elo_rating: 1000.0,
                elo_games: 1,
                attacking_rating: 0.0,
                control_rating: 0.0,
                league_winner: true,
                cup_winner: false,
                league_position: Some(1),
                cup_progress: None,
            },
        );
        year.players.insert(player.to_string(), record);
        year
    }

    #[test]
    fn champion_dates_filters_by_trophy() {
        let year = year_with_league_winner("Ada", "2026-01-01");
        assert_eq!(champion_dates(&year, "Ada", TrophyType::League), vec!["2026-01-01"]);
        assert!(champion_dates(&year, "Ada", TrophyType::Cup).is_empty());
    }

    #[test]
    fn golden_boot_excludes_reserved_keys() {
        let mut doc = SessionDoc::default();
        let mut scorers = HashMap::new();
        scorers.insert("Ada".to_string(), 2);
        scorers.insert(crate::domain::session::OWN_GOAL_KEY.to_string(), 1);
        doc.games.rounds.push(vec![Match::Play {
            home: "Blue".to_string(),
            away: "Red".to_string(),
            home_score: Some(2),
            away_score: Some(0),
            home_scorers: scorers,
            away_scorers: HashMap::new(),
        }]);

        let totals = golden_boot(&[doc]);
        assert_eq!(totals.get("Ada"), Some(&2));
        assert!(!totals.contains_key(crate::domain::session::OWN_GOAL_KEY));
    }
}
