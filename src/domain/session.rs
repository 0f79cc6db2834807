//! Per-session entities: player lists, team rosters, and games (spec §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Settings;

/// Reserved scorer keys (spec §4.H).
pub const OWN_GOAL_KEY: &str = "__ownGoal__";
pub const UNASSIGNED_KEY: &str = "__unassigned__";
pub const MAX_OWN_GOALS_PER_TEAM: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerLists {
    pub available: Vec<String>,
    pub waiting_list: Vec<String>,
}

/// A team's fixed-length roster; empty slots are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub slots: Vec<Option<String>>,
}

impl Team {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Team {
            name: name.into(),
            slots: vec![None; size],
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| s.as_deref())
    }

    pub fn has_open_slot(&self) -> bool {
        self.slots.iter().any(|s| s.is_none())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.as_deref() == Some(name))
    }
}

/// Ordered collection of teams for a session; order is display order, not
/// semantically meaningful to invariants.
pub type Teams = Vec<Team>;

/// A single round-robin fixture, or a bye for an odd team count out (spec §4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Match {
    Bye {
        bye: String,
    },
    Play {
        home: String,
        away: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        home_score: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        away_score: Option<u32>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        home_scorers: HashMap<String, u32>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        away_scorers: HashMap<String, u32>,
    },
}

impl Match {
    pub fn new_play(home: impl Into<String>, away: impl Into<String>) -> Self {
        Match::Play {
            home: home.into(),
            away: away.into(),
            home_score: None,
            away_score: None,
            home_scorers: HashMap::new(),
            away_scorers: HashMap::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Match::Play {
                home_score: Some(_),
                away_score: Some(_),
                ..
            }
        )
    }

    /// Winner team name, or `None` for a draw / incomplete / bye match.
    pub fn winner(&self) -> Option<&str> {
        match self {
            Match::Play {
                home,
                away,
                home_score: Some(h),
                away_score: Some(a),
                ..
            } if h != a => Some(if h > a { home } else { away }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnockoutRound {
    #[serde(rename = "round-of-32")]
    RoundOf32,
    #[serde(rename = "round-of-16")]
    RoundOf16,
    #[serde(rename = "quarter")]
    Quarter,
    #[serde(rename = "semi")]
    Semi,
    #[serde(rename = "final")]
    Final,
}

impl KnockoutRound {
    /// The sequence of rounds needed for `team_count` bracket entrants,
    /// starting with the first round played, ending with the final.
    pub fn sequence_for(team_count: usize) -> Vec<KnockoutRound> {
        let all = [
            KnockoutRound::RoundOf32,
            KnockoutRound::RoundOf16,
            KnockoutRound::Quarter,
            KnockoutRound::Semi,
            KnockoutRound::Final,
        ];
        let slots = team_count.next_power_of_two().max(2);
        let rounds_needed = slots.trailing_zeros() as usize;
        let start = all.len().saturating_sub(rounds_needed);
        all[start..].to_vec()
    }

    pub fn next(&self) -> Option<KnockoutRound> {
        match self {
            KnockoutRound::RoundOf32 => Some(KnockoutRound::RoundOf16),
            KnockoutRound::RoundOf16 => Some(KnockoutRound::Quarter),
            KnockoutRound::Quarter => Some(KnockoutRound::Semi),
            KnockoutRound::Semi => Some(KnockoutRound::Final),
            KnockoutRound::Final => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketMatch {
    pub round: KnockoutRound,
    #[serde(rename = "match")]
    pub match_index: u32,
    pub home: Option<String>,
    pub away: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub home_scorers: HashMap<String, u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub away_scorers: HashMap<String, u32>,
}

impl BracketMatch {
    pub fn is_complete(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    pub fn winner(&self) -> Option<&str> {
        match (&self.home, &self.away, self.home_score, self.away_score) {
            (Some(h), Some(a), Some(hs), Some(as_)) if hs != as_ => {
                Some(if hs > as_ { h.as_str() } else { a.as_str() })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Knockout {
    pub bracket: Vec<BracketMatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionGames {
    pub rounds: Vec<Vec<Match>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knockout: Option<Knockout>,
}

/// The typed projection of one `<YYYY-MM-DD>.json` session document
/// (spec §6, §9 "typed projections internally").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDoc {
    #[serde(default)]
    pub players: PlayerLists,
    #[serde(default)]
    pub teams: Teams,
    #[serde(default)]
    pub games: SessionGames,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl Default for SessionDoc {
    fn default() -> Self {
        SessionDoc {
            players: PlayerLists::default(),
            teams: Vec::new(),
            games: SessionGames::default(),
            settings: None,
            meta: None,
        }
    }
}
