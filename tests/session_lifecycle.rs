//! End-to-end scenarios spanning store, session, teams, schedule and
//! rankings together, rather than any one component in isolation.

use std::collections::HashMap;

use chrono::NaiveDate;
use leagr_engine::cancellation::CancellationToken;
use leagr_engine::domain::session::{PlayerLists, SessionDoc};
use leagr_engine::domain::{League, Settings};
use leagr_engine::schedule;
use leagr_engine::session::{AddTarget, PlayerState};
use leagr_engine::store::{DocKey, LeagueStore};
use leagr_engine::teams::pair_history::PairHistory;
use leagr_engine::teams::{self, PlayerRating, TeamConfig};

fn temp_store() -> (LeagueStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = LeagueStore::new(dir.path());
    (store, dir)
}

fn make_league(id: &str) -> League {
    League {
        id: id.to_string(),
        display_name: "Five a Side".to_string(),
        icon: None,
        access_code_hash: "hash".to_string(),
        owner_email: None,
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn session_generates_teams_and_persists_through_the_store() {
    let (store, _dir) = temp_store();
    store.create_league(&make_league("acme")).unwrap();
    store
        .write_doc("acme", &DocKey::Settings, &Settings::default())
        .unwrap();
    let settings: Settings = store.read_doc("acme", &DocKey::Settings).unwrap();

    let mut state = PlayerState::new(settings.clone());
    let names = ["Ada", "Bo", "Cy", "Di", "Eve", "Fay", "Gus", "Hal"];
    for name in names {
        state.add_player(name, AddTarget::Auto).unwrap();
    }

    let ratings: HashMap<String, PlayerRating> = names
        .iter()
        .map(|n| (n.to_string(), PlayerRating::unranked(n.to_string(), settings.elo.baseline)))
        .collect();
    let config = TeamConfig {
        team_count: 2,
        team_sizes: vec![4, 4],
    };
    let mut history = PairHistory::new();
    let cancellation = CancellationToken::new();
    let generated = teams::generate_teams(
        &state.players.available,
        &ratings,
        &settings,
        &config,
        &mut history,
        &cancellation,
    )
    .unwrap();
    assert_eq!(generated.teams.len(), 2);

    let mut doc = SessionDoc::default();
    doc.players = PlayerLists {
        available: state.players.available.clone(),
        waiting_list: Vec::new(),
    };
    doc.teams = generated.teams.clone();
    store
        .write_doc("acme", &DocKey::Session("2026-02-01".to_string()), &doc)
        .unwrap();

    let round_trip: SessionDoc = store
        .read_doc("acme", &DocKey::Session("2026-02-01".to_string()))
        .unwrap();
    assert_eq!(round_trip.teams.len(), 2);
    let total_members: usize = round_trip.teams.iter().map(|t| t.members().count()).sum();
    assert_eq!(total_members, 8);
}

#[test]
fn league_and_knockout_results_feed_a_rankings_rebuild() {
    let (store, _dir) = temp_store();
    store.create_league(&make_league("acme")).unwrap();
    let settings = Settings::default();
    store.write_doc("acme", &DocKey::Settings, &settings).unwrap();

    let team_names = vec![
        "Red".to_string(),
        "Blue".to_string(),
        "Green".to_string(),
        "Yellow".to_string(),
    ];
    let mut doc = SessionDoc::default();
    doc.teams = team_names
        .iter()
        .map(|name| leagr_engine::domain::session::Team::new(name.clone(), 4))
        .collect();
    for (team, members) in doc.teams.iter_mut().zip([
        ["Ada", "Bo", "Cy", "Di"],
        ["Eve", "Fay", "Gus", "Hal"],
        ["Ivy", "Jo", "Ken", "Lee"],
        ["Moe", "Noa", "Opal", "Pia"],
    ]) {
        for (slot, name) in team.slots.iter_mut().zip(members) {
            *slot = Some(name.to_string());
        }
    }
    doc.players.available = doc
        .teams
        .iter()
        .flat_map(|t| t.members().map(|m| m.to_string()))
        .collect();

    let mut rounds = schedule::round_robin_schedule(&team_names);
    for round in &mut rounds {
        for m in round.iter_mut() {
            let scores = if let leagr_engine::domain::session::Match::Play { home, away, .. } = &*m {
                if home == "Red" {
                    Some((2, 0))
                } else if away == "Red" {
                    Some((0, 2))
                } else {
                    Some((1, 1))
                }
            } else {
                None
            };
            if let Some((hs, as_)) = scores {
                schedule::set_score(m, schedule::Side::Home, Some(hs)).unwrap();
                schedule::set_score(m, schedule::Side::Away, Some(as_)).unwrap();
            }
        }
    }
    doc.games.rounds = rounds;

    let mut knockout = schedule::build_knockout(&team_names).unwrap();
    let sequence = leagr_engine::domain::session::KnockoutRound::sequence_for(team_names.len());
    for m in knockout.bracket.iter_mut() {
        if m.home.is_some() && m.away.is_some() {
            m.home_score = Some(2);
            m.away_score = Some(1);
        }
    }
    schedule::propagate_knockout(&mut knockout, &sequence);
    assert_eq!(schedule::cup_winner(&knockout), knockout.bracket.last().unwrap().home.as_deref());
    doc.games.knockout = Some(knockout);

    store
        .write_doc("acme", &DocKey::Session("2026-03-01".to_string()), &doc)
        .unwrap();

    let stored: SessionDoc = store
        .read_doc("acme", &DocKey::Session("2026-03-01".to_string()))
        .unwrap();
    let date = NaiveDate::parse_from_str("2026-03-01", "%Y-%m-%d").unwrap();
    let cancellation = CancellationToken::new();
    let year = leagr_engine::rankings::rebuild_year(
        2026,
        &[(date, stored)],
        None,
        &settings,
        &cancellation,
    )
    .unwrap();

    assert_eq!(year.players.len(), 16);
    for record in year.players.values() {
        assert_eq!(record.appearances, 1);
        assert!(record.rank.is_some());
    }
    let ada = &year.players["Ada"];
    assert_eq!(ada.ranking_detail.len(), 1);
    let detail = &ada.ranking_detail["2026-03-01"];
    assert_eq!(detail.team.as_deref(), Some("Red"));
    assert!(detail.elo_rating > settings.elo.baseline);
}

#[test]
fn discipline_ledger_round_trips_through_the_store() {
    let (store, _dir) = temp_store();
    store.create_league(&make_league("acme")).unwrap();

    let mut ledger = store
        .read_doc::<leagr_engine::domain::discipline::DisciplineLedger>("acme", &DocKey::Discipline)
        .unwrap();
    leagr_engine::discipline::record_no_show(&mut ledger, "Ada", "2026-01-01");
    leagr_engine::discipline::record_no_show(&mut ledger, "Ada", "2026-01-08");
    store.write_doc("acme", &DocKey::Discipline, &ledger).unwrap();

    let mut reloaded = store
        .read_doc::<leagr_engine::domain::discipline::DisciplineLedger>("acme", &DocKey::Discipline)
        .unwrap();
    let settings = leagr_engine::domain::DisciplineSettings {
        enabled: true,
        no_show_threshold: 2,
    };
    let eval = leagr_engine::discipline::evaluate_suspension_on_signup(
        &mut reloaded,
        "Ada",
        "2026-01-15",
        &settings,
    );
    assert!(eval.suspended && eval.new_suspension);
    store.write_doc("acme", &DocKey::Discipline, &reloaded).unwrap();

    let final_doc = store
        .read_doc::<leagr_engine::domain::discipline::DisciplineLedger>("acme", &DocKey::Discipline)
        .unwrap();
    assert_eq!(final_doc["Ada"].total_suspensions, 1);
    assert!(final_doc["Ada"].active_no_shows.is_empty());
}
