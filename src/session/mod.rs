//! Session player-list and team-assignment state transitions (spec §4.B).
//!
//! A [`PlayerState`] is treated as immutable-by-convention: every mutator
//! takes `&mut self`, but callers are expected to clone a candidate, mutate
//! it, call [`PlayerState::validate`], and only then commit it through the
//! store — mirroring the "validate before commit" flow the store's
//! `set_many` enforces at the document layer.

use crate::domain::session::{PlayerLists, Teams};
use crate::domain::{PlayerOwners, Settings};
use crate::error::{Error, Result};
use crate::validation;

/// Where a player lives, or should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListName {
    Available,
    WaitingList,
}

/// Requested destination for [`PlayerState::add_player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddTarget {
    Available,
    WaitingList,
    /// Route to `available` unless it is full, then `waitingList`.
    Auto,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub players: PlayerLists,
    pub teams: Teams,
    pub settings: Settings,
}

impl PlayerState {
    pub fn new(settings: Settings) -> Self {
        PlayerState {
            players: PlayerLists::default(),
            teams: Vec::new(),
            settings,
        }
    }

    /// Invariants 1-3 of spec §3.
    pub fn validate(&self) -> Result<()> {
        for name in &self.players.available {
            if self.players.waiting_list.contains(name) {
                return Err(Error::conflict(format!(
                    "'{name}' is in both available and waitingList"
                )));
            }
        }

        if self.players.available.len() as u32 > self.settings.player_limit {
            return Err(Error::conflict(format!(
                "available roster ({}) exceeds playerLimit ({})",
                self.players.available.len(),
                self.settings.player_limit
            )));
        }

        for team in &self.teams {
            for name in team.members() {
                if !self.players.available.contains(&name.to_string()) {
                    return Err(Error::conflict(format!(
                        "team '{}' slot holds '{name}' which is not in available",
                        team.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn is_member(&self, name: &str) -> bool {
        self.players.available.iter().any(|n| n == name)
            || self.players.waiting_list.iter().any(|n| n == name)
    }

    fn clear_team_slot(&mut self, name: &str) {
        for team in &mut self.teams {
            for slot in &mut team.slots {
                if slot.as_deref() == Some(name) {
                    *slot = None;
                }
            }
        }
    }

    fn is_available_full(&self) -> bool {
        self.players.available.len() as u32 >= self.settings.player_limit
    }

    /// Rejects an exact-case duplicate across both lists. `Auto` (and
    /// `Available` when the roster is full) redirects to the waiting list.
    pub fn add_player(&mut self, name: &str, target: AddTarget) -> Result<()> {
        let name = validation::validate_player_name(name)?;
        if self.is_member(&name) {
            return Err(Error::conflict(format!("'{name}' is already registered")));
        }

        let effective_target = match target {
            AddTarget::WaitingList => ListName::WaitingList,
            AddTarget::Available | AddTarget::Auto => {
                if self.is_available_full() {
                    ListName::WaitingList
                } else {
                    ListName::Available
                }
            }
        };

        match effective_target {
            ListName::Available => self.players.available.push(name),
            ListName::WaitingList => self.players.waiting_list.push(name),
        }
        self.validate()
    }

    /// Removes a player from whichever list holds them and nulls any team
    /// slot assigned to them. Fails if the player is not present.
    pub fn remove_player(&mut self, name: &str) -> Result<()> {
        let removed_available = remove_first(&mut self.players.available, name);
        let removed_waiting = remove_first(&mut self.players.waiting_list, name);
        if !removed_available && !removed_waiting {
            return Err(Error::not_found(format!("'{name}' is not registered")));
        }
        self.clear_team_slot(name);
        self.validate()
    }

    /// `waitingList -> available` requires spare capacity; `available ->
    /// waitingList` also clears any team assignment.
    pub fn move_player(&mut self, name: &str, from: ListName, to: ListName) -> Result<()> {
        if from == to {
            return Ok(());
        }

        let source = match from {
            ListName::Available => &mut self.players.available,
            ListName::WaitingList => &mut self.players.waiting_list,
        };
        if !remove_first(source, name) {
            return Err(Error::not_found(format!(
                "'{name}' is not in the source list"
            )));
        }

        if to == ListName::Available && self.is_available_full() {
            // put it back where it came from before reporting the error
            match from {
                ListName::Available => self.players.available.push(name.to_string()),
                ListName::WaitingList => self.players.waiting_list.push(name.to_string()),
            }
            return Err(Error::conflict("available roster is at playerLimit"));
        }

        match to {
            ListName::Available => self.players.available.push(name.to_string()),
            ListName::WaitingList => {
                self.players.waiting_list.push(name.to_string());
                self.clear_team_slot(name);
            }
        }
        self.validate()
    }

    /// Assigns a player into a named team's first open slot. Promotes from
    /// the waiting list first (capacity-checked) if needed.
    pub fn move_player_to_team(&mut self, name: &str, team_name: &str) -> Result<()> {
        if self.players.waiting_list.iter().any(|n| n == name) {
            self.move_player(name, ListName::WaitingList, ListName::Available)?;
        } else if !self.players.available.iter().any(|n| n == name) {
            return Err(Error::not_found(format!("'{name}' is not registered")));
        }

        self.clear_team_slot(name);

        let team = self
            .teams
            .iter_mut()
            .find(|t| t.name == team_name)
            .ok_or_else(|| Error::not_found(format!("no team named '{team_name}'")))?;
        let slot = team
            .slots
            .iter_mut()
            .find(|s| s.is_none())
            .ok_or_else(|| Error::conflict(format!("team '{team_name}' has no open slot")))?;
        *slot = Some(name.to_string());

        self.validate()
    }

    /// Inverse of [`Self::move_player_to_team`]: clears any team slot and
    /// leaves the player in `available`.
    pub fn move_player_to_waiting(&mut self, name: &str) -> Result<()> {
        self.move_player(name, ListName::Available, ListName::WaitingList)
    }

    /// Renames a player everywhere: both lists, every team slot, and the
    /// league-wide owner map (committed by the caller in the same
    /// transaction as this state).
    pub fn rename_player(
        &mut self,
        old: &str,
        new: &str,
        owners: &mut PlayerOwners,
    ) -> Result<()> {
        let new = validation::validate_player_name(new)?;
        if !self.is_member(old) {
            return Err(Error::not_found(format!("'{old}' is not registered")));
        }
        if old != new && self.is_member(&new) {
            return Err(Error::conflict(format!(
                "'{new}' is already registered"
            )));
        }

        for entry in self.players.available.iter_mut() {
            if entry == old {
                *entry = new.clone();
            }
        }
        for entry in self.players.waiting_list.iter_mut() {
            if entry == old {
                *entry = new.clone();
            }
        }
        for team in &mut self.teams {
            for slot in &mut team.slots {
                if slot.as_deref() == Some(old) {
                    *slot = Some(new.clone());
                }
            }
        }

        if let Some(owner) = owners.remove(old) {
            owners.insert(new.clone(), owner);
        }

        self.validate()
    }
}

fn remove_first(list: &mut Vec<String>, name: &str) -> bool {
    if let Some(idx) = list.iter().position(|n| n == name) {
        list.remove(idx);
        true
    } else {
        false
    }
}
