//! Validation rules (spec §4.H): subdomains, player names, scores, and
//! scorer maps.

use std::collections::HashMap;

use crate::domain::session::{MAX_OWN_GOALS_PER_TEAM, OWN_GOAL_KEY};
use crate::error::{Error, Result};

const MAX_PLAYER_NAME_LEN: usize = 40;
const RESERVED_PREFIX: &str = "__";
const MAX_SCORE: u32 = 99;

/// `^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$`
pub fn is_valid_subdomain(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !is_alnum(bytes[0]) {
        return false;
    }
    if bytes.len() == 1 {
        return true;
    }
    if !is_alnum(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes[1..bytes.len() - 1]
        .iter()
        .all(|&b| is_alnum(b) || b == b'-')
}

/// Trims, then checks length, control characters, and the reserved `__` prefix.
pub fn validate_player_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::validation("player name must not be empty"));
    }
    if name.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(Error::validation(format!(
            "player name must be at most {MAX_PLAYER_NAME_LEN} characters"
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::validation(
            "player name must not contain control characters",
        ));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(Error::validation(format!(
            "player name must not start with reserved prefix '{RESERVED_PREFIX}'"
        )));
    }
    Ok(name.to_string())
}

pub fn validate_score(score: u32) -> Result<u32> {
    if score > MAX_SCORE {
        return Err(Error::validation(format!(
            "score must be in [0,{MAX_SCORE}]"
        )));
    }
    Ok(score)
}

/// Validates a team's scorer map against its recorded score and roster.
///
/// `roster` is the set of names currently on the team (reserved keys are
/// always allowed in addition). The non-own-goal total must not exceed
/// `team_score`, and own-goal count is capped at
/// [`MAX_OWN_GOALS_PER_TEAM`].
pub fn validate_scorers(
    scorers: &HashMap<String, u32>,
    roster: &[&str],
    team_score: u32,
) -> Result<()> {
    let mut non_own_goal_total: u32 = 0;

    for (name, &count) in scorers {
        if count == 0 {
            return Err(Error::validation(format!(
                "scorer count for '{name}' must be positive"
            )));
        }
        if name == OWN_GOAL_KEY {
            if count > MAX_OWN_GOALS_PER_TEAM {
                return Err(Error::validation(format!(
                    "own goals cannot exceed {MAX_OWN_GOALS_PER_TEAM} per team per match"
                )));
            }
            continue;
        }
        if name.starts_with("__") && name != crate::domain::session::UNASSIGNED_KEY {
            return Err(Error::validation(format!(
                "unrecognized reserved scorer key '{name}'"
            )));
        }
        if name != crate::domain::session::UNASSIGNED_KEY && !roster.contains(&name.as_str()) {
            return Err(Error::validation(format!(
                "scorer '{name}' is not on the team roster"
            )));
        }
        non_own_goal_total += count;
    }

    if non_own_goal_total > team_score {
        return Err(Error::validation(format!(
            "scorer total {non_own_goal_total} exceeds recorded team score {team_score}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_accepts_lowercase_alnum_and_hyphens() {
        assert!(is_valid_subdomain("acme"));
        assert!(is_valid_subdomain("acme-fc-2026"));
        assert!(is_valid_subdomain("a"));
        assert!(is_valid_subdomain("a1"));
    }

    #[test]
    fn subdomain_rejects_bad_shapes() {
        assert!(!is_valid_subdomain(""));
        assert!(!is_valid_subdomain("-acme"));
        assert!(!is_valid_subdomain("acme-"));
        assert!(!is_valid_subdomain("ACME"));
        assert!(!is_valid_subdomain("acme_fc"));
    }

    #[test]
    fn player_name_trims_and_rejects_reserved_prefix() {
        assert_eq!(validate_player_name("  Ada  ").unwrap(), "Ada");
        assert!(validate_player_name("__system__").is_err());
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name(&"x".repeat(41)).is_err());
    }

    #[test]
    fn score_range_enforced() {
        assert!(validate_score(0).is_ok());
        assert!(validate_score(99).is_ok());
        assert!(validate_score(100).is_err());
    }

    #[test]
    fn scorers_must_not_exceed_team_score() {
        let mut scorers = HashMap::new();
        scorers.insert("Ada".to_string(), 2);
        scorers.insert("Bo".to_string(), 1);
        assert!(validate_scorers(&scorers, &["Ada", "Bo"], 3).is_ok());
        assert!(validate_scorers(&scorers, &["Ada", "Bo"], 2).is_err());
    }

    #[test]
    fn own_goal_capped_at_two_and_excluded_from_total_check() {
        let mut scorers = HashMap::new();
        scorers.insert(OWN_GOAL_KEY.to_string(), 2);
        assert!(validate_scorers(&scorers, &["Ada"], 0).is_ok());

        scorers.insert(OWN_GOAL_KEY.to_string(), 3);
        assert!(validate_scorers(&scorers, &["Ada"], 0).is_err());
    }

    #[test]
    fn scorer_must_be_on_roster() {
        let mut scorers = HashMap::new();
        scorers.insert("Stranger".to_string(), 1);
        assert!(validate_scorers(&scorers, &["Ada"], 1).is_err());
    }
}
