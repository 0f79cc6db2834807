use std::collections::HashMap;

use chrono::Utc;
use leagr_engine::cancellation::CancellationToken;
use leagr_engine::config::Config;
use leagr_engine::domain::session::{PlayerLists, SessionDoc};
use leagr_engine::domain::{League, Settings};
use leagr_engine::store::{DocKey, LeagueStore};
use leagr_engine::teams::pair_history::PairHistory;
use leagr_engine::teams::{PlayerRating, TeamConfig};

/// Thin administrative CLI over the engine: creates a league if it does not
/// exist yet, then generates and prints a balanced team split for today's
/// session roster.
///
/// Usage: `leagr-admin <league-id> <player-name>...`
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let mut args = std::env::args().skip(1);
    let league_id = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: leagr-admin <league-id> <player-name>..."))?;
    let players: Vec<String> = args.collect();
    if players.is_empty() {
        anyhow::bail!("at least one player name is required");
    }

    let store = LeagueStore::new(config.data_dir.clone());
    ensure_league(&store, &league_id)?;

    let settings: Settings = store.read_doc(&league_id, &DocKey::Settings)?;
    let mut state = leagr_engine::session::PlayerState::new(settings.clone());
    for name in &players {
        state.add_player(name, leagr_engine::session::AddTarget::Auto)?;
    }

    let team_count = (state.players.available.len() as u32 / 5)
        .max(settings.team_generation.min_teams)
        .min(settings.team_generation.max_teams)
        .max(1);
    let base_size = state.players.available.len() as u32 / team_count;
    let remainder = state.players.available.len() as u32 % team_count;
    let team_sizes: Vec<u32> = (0..team_count)
        .map(|i| if i < remainder { base_size + 1 } else { base_size })
        .collect();
    let config_teams = TeamConfig {
        team_count,
        team_sizes,
    };

    let ratings: HashMap<String, PlayerRating> = state
        .players
        .available
        .iter()
        .map(|name| (name.clone(), PlayerRating::unranked(name.clone(), settings.elo.baseline)))
        .collect();

    let mut history = PairHistory::new();
    let cancellation = CancellationToken::new();
    let generated = leagr_engine::teams::generate_teams(
        &state.players.available,
        &ratings,
        &settings,
        &config_teams,
        &mut history,
        &cancellation,
    )?;

    tracing::info!(
        league = %league_id,
        score = generated.score,
        iterations = generated.iterations,
        "generated teams"
    );
    for team in &generated.teams {
        println!("{}: {}", team.name, team.members().collect::<Vec<_>>().join(", "));
    }

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let mut doc = SessionDoc::default();
    doc.players = PlayerLists {
        available: state.players.available,
        waiting_list: state.players.waiting_list,
    };
    doc.teams = generated.teams;
    store.write_doc(&league_id, &DocKey::Session(today), &doc)?;

    Ok(())
}

fn ensure_league(store: &LeagueStore, league_id: &str) -> anyhow::Result<()> {
    if store.league_exists(league_id)? {
        return Ok(());
    }
    let league = League {
        id: league_id.to_string(),
        display_name: league_id.to_string(),
        icon: None,
        access_code_hash: String::new(),
        owner_email: None,
        created_at: Utc::now(),
    };
    store.create_league(&league)?;
    store.write_doc(league_id, &DocKey::Settings, &Settings::default())?;
    Ok(())
}
