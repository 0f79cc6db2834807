//! Yearly rankings entities (spec §3, §4.E).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Furthest knockout progress a player's team reached in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CupProgress {
    DidNotPlay,
    Reached(super::session::KnockoutRound),
    Winner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloState {
    pub rating: f64,
    pub games_played: u32,
    /// Date of the last match a decay step was applied through, `YYYY-MM-DD`.
    #[serde(default)]
    pub last_decay_at: Option<String>,
}

impl EloState {
    pub fn new(baseline: f64) -> Self {
        EloState {
            rating: baseline,
            games_played: 0,
            last_decay_at: None,
        }
    }

    pub fn is_established(&self, games_threshold: u32) -> bool {
        self.games_played >= games_threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingDetail {
    pub team: Option<String>,
    pub appearance_points: f64,
    pub match_points: f64,
    pub bonus_points: f64,
    pub knockout_points: f64,
    pub total_points: f64,
    pub rank: Option<u32>,
    pub total_players: u32,
    pub elo_rating: f64,
    pub elo_games: u32,
    pub attacking_rating: f64,
    pub control_rating: f64,
    pub league_winner: bool,
    pub cup_winner: bool,
    #[serde(default)]
    pub league_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cup_progress: Option<CupProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerYearRecord {
    pub points: f64,
    pub appearances: u32,
    pub ranking_points: f64,
    pub league_wins: u32,
    pub cup_wins: u32,
    pub attacking_rating: f64,
    pub control_rating: f64,
    pub goals_for_per_session: f64,
    pub goals_against_per_session: f64,
    pub rank: Option<u32>,
    pub previous_rank: Option<u32>,
    pub rank_movement: Option<i32>,
    pub is_new: bool,
    pub elo: EloState,
    /// Keyed by session date `YYYY-MM-DD`, in date order.
    pub ranking_detail: BTreeMap<String, RankingDetail>,
}

impl PlayerYearRecord {
    pub fn new(baseline: f64) -> Self {
        PlayerYearRecord {
            points: 0.0,
            appearances: 0,
            ranking_points: 0.0,
            league_wins: 0,
            cup_wins: 0,
            attacking_rating: 0.0,
            control_rating: 0.0,
            goals_for_per_session: 0.0,
            goals_against_per_session: 0.0,
            rank: None,
            previous_rank: None,
            rank_movement: None,
            is_new: true,
            elo: EloState::new(baseline),
            ranking_detail: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingMetadata {
    pub gamma: f64,
    pub global_average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsYear {
    pub year: i32,
    pub players: BTreeMap<String, PlayerYearRecord>,
    pub metadata: RankingMetadata,
}

impl RankingsYear {
    pub fn new(year: i32) -> Self {
        RankingsYear {
            year,
            players: BTreeMap::new(),
            metadata: RankingMetadata {
                gamma: 0.5,
                global_average: 0.0,
            },
        }
    }
}
