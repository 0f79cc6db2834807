//! Core data model (spec §3): leagues, effective settings, and the
//! sub-entities defined in [`session`], [`rankings`] and [`discipline`].
//!
//! Settings keep an `extra` bag of unrecognized keys so that documents
//! written by a newer schema round-trip untouched through an older build of
//! this engine (spec §9 "dynamic typing in source").

pub mod discipline;
pub mod rankings;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub access_code_hash: String,
    #[serde(default)]
    pub owner_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGenerationSettings {
    #[serde(default = "TeamGenerationSettings::default_min_teams")]
    pub min_teams: u32,
    #[serde(default = "TeamGenerationSettings::default_max_teams")]
    pub max_teams: u32,
    #[serde(default = "TeamGenerationSettings::default_min_players_per_team")]
    pub min_players_per_team: u32,
    #[serde(default = "TeamGenerationSettings::default_max_players_per_team")]
    pub max_players_per_team: u32,
}

impl TeamGenerationSettings {
    fn default_min_teams() -> u32 {
        2
    }
    fn default_max_teams() -> u32 {
        6
    }
    fn default_min_players_per_team() -> u32 {
        4
    }
    fn default_max_players_per_team() -> u32 {
        8
    }
}

impl Default for TeamGenerationSettings {
    fn default() -> Self {
        TeamGenerationSettings {
            min_teams: Self::default_min_teams(),
            max_teams: Self::default_max_teams(),
            min_players_per_team: Self::default_min_players_per_team(),
            max_players_per_team: Self::default_max_players_per_team(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineSettings {
    #[serde(default = "DisciplineSettings::default_enabled")]
    pub enabled: bool,
    #[serde(default = "DisciplineSettings::default_threshold")]
    pub no_show_threshold: u32,
}

impl DisciplineSettings {
    fn default_enabled() -> bool {
        true
    }
    fn default_threshold() -> u32 {
        2
    }
}

impl Default for DisciplineSettings {
    fn default() -> Self {
        DisciplineSettings {
            enabled: Self::default_enabled(),
            no_show_threshold: Self::default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistrationWindowSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub opens_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloSettings {
    #[serde(default = "EloSettings::default_k_league")]
    pub k_league: f64,
    #[serde(default = "EloSettings::default_k_cup")]
    pub k_cup: f64,
    #[serde(default = "EloSettings::default_decay_rate_per_week")]
    pub decay_rate_per_week: f64,
    #[serde(default = "EloSettings::default_baseline")]
    pub baseline: f64,
    #[serde(default = "EloSettings::default_games_threshold")]
    pub games_threshold: u32,
}

impl EloSettings {
    fn default_k_league() -> f64 {
        24.0
    }
    fn default_k_cup() -> f64 {
        15.0
    }
    fn default_decay_rate_per_week() -> f64 {
        0.02
    }
    fn default_baseline() -> f64 {
        1000.0
    }
    fn default_games_threshold() -> u32 {
        35
    }
}

impl Default for EloSettings {
    fn default() -> Self {
        EloSettings {
            k_league: Self::default_k_league(),
            k_cup: Self::default_k_cup(),
            decay_rate_per_week: Self::default_decay_rate_per_week(),
            baseline: Self::default_baseline(),
            games_threshold: Self::default_games_threshold(),
        }
    }
}

fn default_player_limit() -> u32 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_player_limit")]
    pub player_limit: u32,
    #[serde(default)]
    pub team_generation: TeamGenerationSettings,
    #[serde(default)]
    pub discipline: DisciplineSettings,
    #[serde(default)]
    pub registration_window: RegistrationWindowSettings,
    #[serde(default)]
    pub elo: EloSettings,
    /// Unrecognized keys, preserved verbatim for forward compatibility.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            player_limit: default_player_limit(),
            team_generation: TeamGenerationSettings::default(),
            discipline: DisciplineSettings::default(),
            registration_window: RegistrationWindowSettings::default(),
            elo: EloSettings::default(),
            extra: serde_json::Map::new(),
        }
    }
}

/// `name -> owner token` map (spec §4.B renamePlayer, §6 `playerOwners.json`).
pub type PlayerOwners = std::collections::BTreeMap<String, String>;
