//! Last-12-session teammate-pair history: a bounded ring buffer of session
//! rosters plus a lazily-rebuilt `(unordered pair) -> count` index
//! (spec §9 "Graph of teammates").

use std::collections::{HashMap, VecDeque};

const WINDOW: usize = 12;

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone)]
struct SessionRosters {
    date: String,
    rosters: Vec<Vec<String>>,
}

/// Tracks which players have shared a team in each of the last 12
/// sessions played, in order to discourage repeatedly re-pairing the same
/// players during team generation.
#[derive(Debug, Default)]
pub struct PairHistory {
    sessions: VecDeque<SessionRosters>,
    counts: HashMap<(String, String), u32>,
    dirty: bool,
}

impl PairHistory {
    pub fn new() -> Self {
        PairHistory {
            sessions: VecDeque::new(),
            counts: HashMap::new(),
            dirty: false,
        }
    }

    /// Builds history from ordered `(date, rosters)` pairs, oldest first,
    /// keeping only the most recent [`WINDOW`] sessions.
    pub fn from_sessions(sessions: impl IntoIterator<Item = (String, Vec<Vec<String>>)>) -> Self {
        let mut history = PairHistory::new();
        for (date, rosters) in sessions {
            history.push_session(date, rosters);
        }
        history
    }

    pub fn push_session(&mut self, date: String, rosters: Vec<Vec<String>>) {
        self.sessions.push_back(SessionRosters { date, rosters });
        while self.sessions.len() > WINDOW {
            self.sessions.pop_front();
        }
        self.dirty = true;
    }

    fn rebuild_if_needed(&mut self) {
        if !self.dirty {
            return;
        }
        self.counts.clear();
        for session in &self.sessions {
            for roster in &session.rosters {
                for i in 0..roster.len() {
                    for j in (i + 1)..roster.len() {
                        *self
                            .counts
                            .entry(pair_key(&roster[i], &roster[j]))
                            .or_insert(0) += 1;
                    }
                }
            }
        }
        self.dirty = false;
    }

    /// Number of sessions in the last 12 in which `a` and `b` shared a team.
    pub fn pair_count(&mut self, a: &str, b: &str) -> u32 {
        self.rebuild_if_needed();
        self.counts.get(&pair_key(a, b)).copied().unwrap_or(0)
    }
}
