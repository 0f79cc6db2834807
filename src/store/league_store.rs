//! Per-league JSON persistence with atomic multi-key transactions
//! (spec §4.A, §5, §6 "Persisted state layout").

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::document::{self, SetOp};

/// Identifies one JSON document within a league's directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocKey {
    /// `<YYYY-MM-DD>.json`
    Session(String),
    /// `settings.json`
    Settings,
    /// `leagues.json`
    League,
    /// `playerOwners.json`
    PlayerOwners,
    /// `discipline.json`
    Discipline,
    /// `rankings-<YYYY>.json`
    RankingsYear(i32),
}

impl DocKey {
    fn filename(&self) -> Result<String> {
        match self {
            DocKey::Session(date) => {
                parse_session_date(date)?;
                Ok(format!("{date}.json"))
            }
            DocKey::Settings => Ok("settings.json".to_string()),
            DocKey::League => Ok("leagues.json".to_string()),
            DocKey::PlayerOwners => Ok("playerOwners.json".to_string()),
            DocKey::Discipline => Ok("discipline.json".to_string()),
            DocKey::RankingsYear(year) => Ok(format!("rankings-{year}.json")),
        }
    }
}

fn parse_session_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| Error::store(format!("malformed session date '{date}', expected YYYY-MM-DD")))
}

fn validate_league_id(league_id: &str) -> Result<()> {
    if crate::validation::is_valid_subdomain(league_id) {
        Ok(())
    } else {
        Err(Error::store(format!("invalid league id '{league_id}'")))
    }
}

/// Per-league, per-document keyed JSON store with a temp-file + rename
/// write path and a per-document mutex held across read-modify-write.
pub struct LeagueStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LeagueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LeagueStore {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn league_dir(&self, league_id: &str) -> Result<PathBuf> {
        validate_league_id(league_id)?;
        Ok(self.root.join(league_id))
    }

    fn doc_path(&self, league_id: &str, doc: &DocKey) -> Result<PathBuf> {
        Ok(self.league_dir(league_id)?.join(doc.filename()?))
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn league_exists(&self, league_id: &str) -> Result<bool> {
        Ok(self.league_dir(league_id)?.is_dir())
    }

    /// Creates the league's directory and its `leagues.json` stable document.
    /// Fails with `Conflict` if the league already exists.
    pub fn create_league(&self, league: &crate::domain::League) -> Result<()> {
        let dir = self.league_dir(&league.id)?;
        if dir.is_dir() {
            return Err(Error::conflict(format!(
                "league '{}' already exists",
                league.id
            )));
        }
        fs::create_dir_all(&dir)?;
        self.write_doc(&league.id, &DocKey::League, league)
    }

    fn read_value(&self, path: &Path) -> Result<Value> {
        if !path.exists() {
            return Ok(Value::Null);
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::store(format!("corrupt JSON at {}: {e}", path.display())))
    }

    fn write_value_atomic(&self, path: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or("json")
        ));
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Reads the value at a dotted path inside `doc`.
    pub fn get(&self, league_id: &str, doc: &DocKey, key: &str) -> Result<Option<Value>> {
        if !self.league_exists(league_id)? {
            return Err(Error::not_found(format!("unknown league '{league_id}'")));
        }
        let path = self.doc_path(league_id, doc)?;
        let _guard = self.lock_for(&path).lock().map_err(|_| Error::store("lock poisoned"))?;
        let value = self.read_value(&path)?;
        Ok(document::get(&value, key).cloned())
    }

    /// Applies a single `set` operation as a one-op transaction.
    pub fn set(&self, league_id: &str, doc: &DocKey, op: SetOp) -> Result<()> {
        self.set_many(league_id, doc, vec![op])
    }

    /// The atomic primitive: loads `doc` once, applies every op against the
    /// in-memory copy in order, then writes through temp-file + rename. On
    /// any error the original document is untouched (spec §4.A).
    pub fn set_many(&self, league_id: &str, doc: &DocKey, ops: Vec<SetOp>) -> Result<()> {
        if !self.league_exists(league_id)? {
            return Err(Error::not_found(format!("unknown league '{league_id}'")));
        }
        let path = self.doc_path(league_id, doc)?;
        let lock = self.lock_for(&path);
        let _guard = lock.lock().map_err(|_| Error::store("lock poisoned"))?;

        let mut value = self.read_value(&path)?;
        for op in &ops {
            document::set(&mut value, op)?;
        }
        self.write_value_atomic(&path, &value)?;
        Ok(())
    }

    /// Reads a whole document and decodes it into a typed projection,
    /// defaulting to `T::default()` when the document does not exist yet.
    pub fn read_doc<T>(&self, league_id: &str, doc: &DocKey) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if !self.league_exists(league_id)? {
            return Err(Error::not_found(format!("unknown league '{league_id}'")));
        }
        let path = self.doc_path(league_id, doc)?;
        let _guard = self.lock_for(&path).lock().map_err(|_| Error::store("lock poisoned"))?;
        let value = self.read_value(&path)?;
        if value.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(value).map_err(|e| Error::store(e.to_string()))
    }

    /// Overwrites a whole document with a typed value, atomically. Used for
    /// documents whose writers already hold the full, validated value (e.g.
    /// a rankings rebuild) rather than incremental per-key ops.
    pub fn write_doc<T: Serialize>(&self, league_id: &str, doc: &DocKey, value: &T) -> Result<()> {
        if !self.league_exists(league_id)? && !matches!(doc, DocKey::League) {
            return Err(Error::not_found(format!("unknown league '{league_id}'")));
        }
        let path = self.doc_path(league_id, doc)?;
        let lock = self.lock_for(&path);
        let _guard = lock.lock().map_err(|_| Error::store("lock poisoned"))?;
        let json = serde_json::to_value(value)?;
        self.write_value_atomic(&path, &json)?;
        Ok(())
    }
}
