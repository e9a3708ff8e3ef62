pub mod config;
pub mod contention;
pub mod counters;
pub mod cumulative;
pub mod error;
pub mod export;
pub mod fake_season;
pub mod logging;
pub mod losses;
pub mod normalize;
pub mod pipeline;
pub mod player_age;
pub mod player_stats;
pub mod pricing;
pub mod record;
pub mod reference;
pub mod salary;
pub mod standings;
pub mod streaks;
pub mod weather;

pub use config::EngineConfig;
pub use error::{FeatureError, Result};
pub use pipeline::{FeatureEngine, RunSummary};
pub use record::{DivisionKey, GameRecord, Metric, Side, TeamLine};
pub use reference::ReferenceData;
