//! League Store component (spec §4.A): per-league keyed JSON persistence,
//! atomic multi-key writes, and the settings cache (§4.I).

pub mod document;
pub mod league_store;
pub mod settings_cache;

pub use document::SetOp;
pub use league_store::{DocKey, LeagueStore};
pub use settings_cache::SettingsCache;
