//! Per-(league, date) settings cache with a 5 minute TTL (spec §4.I).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::Settings;
use crate::error::Result;

const TTL: Duration = Duration::from_secs(5 * 60);

struct Entry {
    value: Settings,
    inserted_at: Instant,
}

/// Caches resolved, effective settings per `(league, date)`. Always returns
/// deep clones so callers cannot mutate the cached copy.
pub struct SettingsCache {
    entries: Mutex<HashMap<(String, String), Entry>>,
}

impl SettingsCache {
    pub fn new() -> Self {
        SettingsCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached settings if fresh, otherwise calls `loader`,
    /// caches the result, and returns it.
    pub fn get_or_load<F>(&self, league_id: &str, date: &str, loader: F) -> Result<Settings>
    where
        F: FnOnce() -> Result<Settings>,
    {
        let key = (league_id.to_string(), date.to_string());

        {
            let mut entries = self.entries.lock().expect("settings cache poisoned");
            if let Some(entry) = entries.get(&key) {
                if entry.inserted_at.elapsed() < TTL {
                    return Ok(entry.value.clone());
                }
                entries.remove(&key);
            }
        }

        let value = loader()?;
        let mut entries = self.entries.lock().expect("settings cache poisoned");
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Invalidates one `(league, date)` entry. Called after any `setMany`
    /// that touches `settings` within that session.
    pub fn invalidate(&self, league_id: &str, date: &str) {
        let mut entries = self.entries.lock().expect("settings cache poisoned");
        entries.remove(&(league_id.to_string(), date.to_string()));
    }

    /// Invalidates every entry for a league. Called on a league-wide
    /// settings write to a stable document.
    pub fn invalidate_league(&self, league_id: &str) {
        let mut entries = self.entries.lock().expect("settings cache poisoned");
        entries.retain(|(id, _), _| id != league_id);
    }
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn caches_after_first_load() {
        let cache = SettingsCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let settings = cache
                .get_or_load("acme", "2026-01-01", || {
                    calls.set(calls.get() + 1);
                    Ok(Settings::default())
                })
                .unwrap();
            assert_eq!(settings.player_limit, 24);
        }

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let cache = SettingsCache::new();
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            Ok(Settings::default())
        };

        cache.get_or_load("acme", "2026-01-01", load).unwrap();
        cache.invalidate("acme", "2026-01-01");
        cache.get_or_load("acme", "2026-01-01", load).unwrap();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn invalidate_league_clears_all_dates() {
        let cache = SettingsCache::new();
        cache
            .get_or_load("acme", "2026-01-01", || Ok(Settings::default()))
            .unwrap();
        cache
            .get_or_load("acme", "2026-01-08", || Ok(Settings::default()))
            .unwrap();

        cache.invalidate_league("acme");

        let calls = Cell::new(0);
        cache
            .get_or_load("acme", "2026-01-01", || {
                calls.set(calls.get() + 1);
                Ok(Settings::default())
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
    }
}
