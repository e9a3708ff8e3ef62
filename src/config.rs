use std::env;

use crate::contention::TieRule;
use crate::record::Metric;

pub const DEFAULT_MIN_GAMES: u32 = 10;
pub const DEFAULT_SEASON_LENGTH: u32 = 163;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Features that need a sample emit their neutral value until a team has
    /// played more than this many games.
    pub min_games: u32,
    /// Games remaining is `season_length - game_number`.
    pub season_length: u32,
    pub metrics: Vec<Metric>,
    pub tie_rule: TieRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_games: DEFAULT_MIN_GAMES,
            season_length: DEFAULT_SEASON_LENGTH,
            metrics: Metric::ALL.to_vec(),
            tie_rule: TieRule::default(),
        }
    }
}

impl EngineConfig {
    /// Reads `FEATURES_MIN_GAMES`, `FEATURES_SEASON_LENGTH`,
    /// `FEATURES_METRICS` (comma separated) and `FEATURES_CONTENTION_TIES`.
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let min_games = env::var("FEATURES_MIN_GAMES")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.min_games)
            .min(60);
        let season_length = env::var("FEATURES_SEASON_LENGTH")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(defaults.season_length)
            .clamp(1, 200);
        let metrics = env::var("FEATURES_METRICS")
            .ok()
            .map(|raw| parse_metrics(&raw))
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.metrics);
        let tie_rule = env::var("FEATURES_CONTENTION_TIES")
            .ok()
            .and_then(|val| TieRule::parse(&val))
            .unwrap_or(defaults.tie_rule);
        Self {
            min_games,
            season_length,
            metrics,
            tie_rule,
        }
    }
}

pub fn parse_metrics(raw: &str) -> Vec<Metric> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        if let Some(metric) = Metric::parse(part)
            && !out.contains(&metric)
        {
            out.push(metric);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_metrics_dedups_and_skips_unknown() {
        assert_eq!(
            parse_metrics("runs, hr;hits runs walks"),
            vec![Metric::Runs, Metric::HomeRuns, Metric::Hits]
        );
        assert!(parse_metrics("").is_empty());
    }

    #[test]
    fn defaults_match_a_full_season() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_games, 10);
        assert_eq!(cfg.season_length, 163);
        assert_eq!(cfg.metrics.len(), 3);
        assert_eq!(cfg.tie_rule, TieRule::TeamHolds);
    }
}
