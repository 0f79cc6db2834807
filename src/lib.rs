//! Engine for a multi-tenant 5-a-side league: session state, seeded team
//! generation, scheduling, rankings, and discipline, over a per-league
//! atomic JSON store.

pub mod aggregations;
pub mod cancellation;
pub mod config;
pub mod discipline;
pub mod domain;
pub mod error;
pub mod rankings;
pub mod schedule;
pub mod session;
pub mod store;
pub mod teams;
pub mod validation;

pub use cancellation::CancellationToken;
pub use config::Config;
pub use error::{Error, Result};
