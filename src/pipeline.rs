use std::collections::BTreeSet;

use tracing::{info, info_span};

use crate::config::EngineConfig;
use crate::contention::ContentionScorer;
use crate::cumulative::CumulativeAccumulator;
use crate::error::{FeatureError, Result};
use crate::losses::LossTracker;
use crate::player_age::PlayerAgeTracker;
use crate::player_stats::PlayerStatsModel;
use crate::pricing::TicketPriceNormalizer;
use crate::record::GameRecord;
use crate::reference::{Lookups, ReferenceData};
use crate::salary::SalaryNormalizer;
use crate::standings::StandingsReconstructor;
use crate::streaks::StreakTracker;
use crate::weather::WeatherModel;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub seasons: Vec<i32>,
    pub renamed_teams: usize,
    pub standings_snapshots: usize,
    pub weather_applied: bool,
    pub ticket_prices_applied: bool,
    pub salaries_applied: bool,
    pub player_ages_applied: bool,
    pub player_stats_applied: bool,
}

/// Reference data and settings shared by runs. Every call to [`run`] builds
/// fresh trackers, caches and memo tables, so runs never see each other's
/// state and may execute on different threads.
///
/// [`run`]: FeatureEngine::run
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    config: EngineConfig,
    lookups: Lookups,
    prices: TicketPriceNormalizer,
    salaries: SalaryNormalizer,
    player_stats: PlayerStatsModel,
    weather: WeatherModel,
}

impl FeatureEngine {
    pub fn new(config: EngineConfig, reference: &ReferenceData) -> Self {
        Self {
            lookups: Lookups::from_reference(reference),
            prices: TicketPriceNormalizer::from_prices(&reference.ticket_prices),
            salaries: SalaryNormalizer::from_salaries(&reference.salaries),
            player_stats: PlayerStatsModel::from_stats(&reference.player_stats),
            weather: WeatherModel::new(&reference.weather, &reference.dome_defaults),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enriches `records` in place. Records must be sorted by date.
    ///
    /// Pass order: aliases and divisions, losses, streaks, cumulative totals,
    /// standings, contention, the normalization passes (cumulative, ticket
    /// price, salary, player age, player stats), then game context and
    /// weather.
    pub fn run(&self, records: &mut [GameRecord]) -> Result<RunSummary> {
        let span = info_span!("feature_run", records = records.len());
        let _enter = span.enter();

        check_order(records)?;

        let renamed_teams = self.lookups.canonicalize_teams(records);
        self.lookups.attach_divisions(records)?;

        LossTracker::new().apply(records);
        StreakTracker::new().apply(records)?;

        let mut accumulators = self
            .config
            .metrics
            .iter()
            .map(|m| CumulativeAccumulator::new(*m, self.config.min_games))
            .collect::<Vec<_>>();
        for acc in accumulators.iter_mut() {
            acc.accumulate(records);
        }

        let book = StandingsReconstructor::new(self.config.season_length).apply(records)?;
        ContentionScorer::new(
            self.config.min_games,
            self.config.season_length,
            self.config.tie_rule,
        )
        .apply(records)?;

        for acc in &accumulators {
            acc.emit_normalized(records)?;
        }

        let ticket_prices_applied = !self.prices.is_empty();
        if ticket_prices_applied {
            self.prices.apply(records)?;
        } else {
            info!("no ticket prices supplied, skipping");
        }

        let salaries_applied = !self.salaries.is_empty();
        if salaries_applied {
            self.salaries.apply(records)?;
        } else {
            info!("no salaries supplied, skipping");
        }

        let player_ages_applied = records
            .iter()
            .any(|r| !r.home.lineup.is_empty() || !r.visiting.lineup.is_empty());
        if player_ages_applied {
            PlayerAgeTracker::new().apply(records);
        } else {
            info!("no lineups in the log, skipping player ages");
        }

        let player_stats_applied = !self.player_stats.is_empty();
        if player_stats_applied {
            self.player_stats.apply(records, self.config.min_games);
        } else {
            info!("no player stats supplied, skipping");
        }

        self.lookups.attach_game_context(records)?;

        let weather_applied = !self.weather.is_empty();
        if weather_applied {
            self.weather.apply(records)?;
        } else {
            info!("no weather observations supplied, skipping");
        }

        let seasons = records
            .iter()
            .map(|r| r.season)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        info!(records = records.len(), seasons = seasons.len(), "feature run complete");

        Ok(RunSummary {
            records: records.len(),
            seasons,
            renamed_teams,
            standings_snapshots: book.len(),
            weather_applied,
            ticket_prices_applied,
            salaries_applied,
            player_ages_applied,
            player_stats_applied,
        })
    }
}

/// Dates and seasons must never go backwards.
pub fn check_order(records: &[GameRecord]) -> Result<()> {
    for (index, pair) in records.windows(2).enumerate() {
        if pair[1].date < pair[0].date || pair[1].season < pair[0].season {
            return Err(FeatureError::OutOfOrder {
                index: index + 1,
                date: pair[1].date,
                previous: pair[0].date,
            });
        }
    }
    Ok(())
}
