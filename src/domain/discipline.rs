//! Discipline (no-show) ledger entities (spec §3, §4.F).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearedNoShow {
    pub date: String,
    pub cleared_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suspension {
    pub date: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisciplineRecord {
    /// Ordered (ascending) dates of uncleared no-shows.
    pub active_no_shows: Vec<String>,
    pub cleared_no_shows: Vec<ClearedNoShow>,
    pub suspensions: Vec<Suspension>,
    pub total_suspensions: u32,
}

/// `discipline.json`: one record per player, keyed by player name.
pub type DisciplineLedger = BTreeMap<String, DisciplineRecord>;
