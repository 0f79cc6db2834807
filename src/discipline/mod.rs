//! No-show discipline ledger: accumulation, clearing on appearance, and
//! threshold-triggered suspension (spec §4.F).

use crate::domain::discipline::{ClearedNoShow, DisciplineLedger, DisciplineRecord, Suspension};
use crate::domain::DisciplineSettings;

/// Result of checking whether a player should be suspended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspensionCheck {
    pub should_suspend: bool,
    pub reason: Option<String>,
}

/// Outcome of evaluating a signup against the discipline ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupEvaluation {
    /// The player is blocked from signing up for this session.
    pub suspended: bool,
    /// A new suspension was just applied as part of this evaluation.
    pub new_suspension: bool,
}

/// Appends `date` to the player's active no-shows, unless already present.
pub fn record_no_show(ledger: &mut DisciplineLedger, player: &str, date: &str) {
    let record = ledger.entry(player.to_string()).or_default();
    if !record.active_no_shows.iter().any(|d| d == date) {
        record.active_no_shows.push(date.to_string());
        record.active_no_shows.sort();
    }
}

/// Clears every active no-show into `clearedNoShows` if the player actually
/// showed up on a date after their most recent no-show. No-op otherwise.
pub fn clear_no_shows_if_appeared(ledger: &mut DisciplineLedger, player: &str, appearance_date: &str) {
    let Some(record) = ledger.get_mut(player) else {
        return;
    };
    let Some(latest) = record.active_no_shows.iter().max().cloned() else {
        return;
    };
    if appearance_date <= latest.as_str() {
        return;
    }
    for date in record.active_no_shows.drain(..) {
        record.cleared_no_shows.push(ClearedNoShow {
            date,
            cleared_on: appearance_date.to_string(),
        });
    }
}

/// Checks whether a player has crossed the no-show threshold.
pub fn should_suspend(
    ledger: &DisciplineLedger,
    player: &str,
    settings: &DisciplineSettings,
) -> SuspensionCheck {
    if !settings.enabled {
        return SuspensionCheck {
            should_suspend: false,
            reason: None,
        };
    }
    let empty = DisciplineRecord::default();
    let record = ledger.get(player).unwrap_or(&empty);
    if record.active_no_shows.len() as u32 >= settings.no_show_threshold {
        SuspensionCheck {
            should_suspend: true,
            reason: Some(format!(
                "{} unexcused no-shows reached the threshold of {}",
                record.active_no_shows.len(),
                settings.no_show_threshold
            )),
        }
    } else {
        SuspensionCheck {
            should_suspend: false,
            reason: None,
        }
    }
}

/// Atomically records a suspension for `session_date`, moves every active
/// no-show into `clearedNoShows`, and increments `totalSuspensions`.
pub fn apply_suspension(
    ledger: &mut DisciplineLedger,
    player: &str,
    session_date: &str,
    reason: Option<String>,
) {
    let record = ledger.entry(player.to_string()).or_default();
    record.suspensions.push(Suspension {
        date: session_date.to_string(),
        reason,
    });
    record.total_suspensions += 1;
    for date in record.active_no_shows.drain(..) {
        record.cleared_no_shows.push(ClearedNoShow {
            date,
            cleared_on: session_date.to_string(),
        });
    }
}

/// Idempotent signup-time check: blocks signup if a suspension already
/// exists for `session_date`, or applies (and blocks on) a new suspension
/// if the no-show threshold has just been reached.
pub fn evaluate_suspension_on_signup(
    ledger: &mut DisciplineLedger,
    player: &str,
    session_date: &str,
    settings: &DisciplineSettings,
) -> SignupEvaluation {
    if let Some(record) = ledger.get(player) {
        if record.suspensions.iter().any(|s| s.date == session_date) {
            return SignupEvaluation {
                suspended: true,
                new_suspension: false,
            };
        }
    }

    let check = should_suspend(ledger, player, settings);
    if check.should_suspend {
        apply_suspension(ledger, player, session_date, check.reason);
        return SignupEvaluation {
            suspended: true,
            new_suspension: true,
        };
    }

    SignupEvaluation {
        suspended: false,
        new_suspension: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_show_to_suspension_matches_example() {
        let mut ledger = DisciplineLedger::new();
        let settings = DisciplineSettings {
            enabled: true,
            no_show_threshold: 2,
        };

        record_no_show(&mut ledger, "P", "2025-01-13");
        record_no_show(&mut ledger, "P", "2025-01-14");

        let result = evaluate_suspension_on_signup(&mut ledger, "P", "2025-01-15", &settings);
        assert_eq!(
            result,
            SignupEvaluation {
                suspended: true,
                new_suspension: true,
            }
        );

        let record = &ledger["P"];
        assert!(record.active_no_shows.is_empty());
        assert_eq!(record.cleared_no_shows.len(), 2);
        assert_eq!(record.total_suspensions, 1);
    }

    #[test]
    fn clear_no_shows_requires_appearance_after_latest() {
        let mut ledger = DisciplineLedger::new();
        record_no_show(&mut ledger, "P", "2025-01-13");

        clear_no_shows_if_appeared(&mut ledger, "P", "2025-01-10");
        assert_eq!(ledger["P"].active_no_shows.len(), 1);

        clear_no_shows_if_appeared(&mut ledger, "P", "2025-01-20");
        assert!(ledger["P"].active_no_shows.is_empty());
        assert_eq!(ledger["P"].cleared_no_shows.len(), 1);
    }

    #[test]
    fn signup_blocked_for_existing_suspension_date() {
        let mut ledger = DisciplineLedger::new();
        let settings = DisciplineSettings {
            enabled: true,
            no_show_threshold: 2,
        };
        apply_suspension(&mut ledger, "P", "2025-02-01", Some("test".to_string()));

        let result = evaluate_suspension_on_signup(&mut ledger, "P", "2025-02-01", &settings);
        assert_eq!(
            result,
            SignupEvaluation {
                suspended: true,
                new_suspension: false,
            }
        );
    }

    #[test]
    fn disabled_discipline_never_suspends() {
        let mut ledger = DisciplineLedger::new();
        let settings = DisciplineSettings {
            enabled: false,
            no_show_threshold: 1,
        };
        record_no_show(&mut ledger, "P", "2025-01-01");
        let result = evaluate_suspension_on_signup(&mut ledger, "P", "2025-01-02", &settings);
        assert_eq!(
            result,
            SignupEvaluation {
                suspended: false,
                new_suspension: false,
            }
        );
    }
}
