//! Process-level configuration, loaded once from the environment.
//!
//! Mirrors the `DATA_DIR` / `BASE_HOST` / `USE_POLLING` variables of spec §6.
//! Per-league, per-date `Settings` (see [`crate::domain::Settings`]) are data,
//! not configuration, and live in the JSON store instead.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub base_host: String,
    pub use_polling: bool,
}

impl Config {
    /// Loads configuration from the process environment, attempting to read
    /// a `.env` file first (ignored if absent, same as the teacher binaries).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let base_host = std::env::var("BASE_HOST").unwrap_or_else(|_| "localhost".to_string());
        let use_polling = std::env::var("USE_POLLING")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Config {
            data_dir,
            base_host,
            use_polling,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("./data"),
            base_host: "localhost".to_string(),
            use_polling: false,
        }
    }
}
