use std::collections::HashMap;

use tracing::{debug, info};

use crate::counters::SeasonCounter;
use crate::error::{FeatureError, Result};
use crate::normalize::NormCache;
use crate::record::{GameRecord, Metric, Side};

/// Season-to-date totals of one metric, plus the population of totals seen
/// by every team at the same game number of the same season.
#[derive(Debug)]
pub struct CumulativeAccumulator {
    metric: Metric,
    min_games: u32,
    totals: SeasonCounter<f64>,
    population: HashMap<(i32, u32), Vec<f64>>,
}

impl CumulativeAccumulator {
    pub fn new(metric: Metric, min_games: u32) -> Self {
        Self {
            metric,
            min_games,
            totals: SeasonCounter::new(),
            population: HashMap::new(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// First sweep: attach the pre-game total and collect the population.
    pub fn accumulate(&mut self, records: &mut [GameRecord]) {
        for r in records.iter_mut() {
            let season = r.season;
            for side in Side::BOTH {
                let line = r.side_mut(side);
                let before = self.totals.get(season, &line.team);
                line.features.cumulative.insert(self.metric, before);
                self.population
                    .entry((season, line.game_number))
                    .or_default()
                    .push(before);
                *self.totals.entry(season, &line.team) += line.metric(self.metric);
            }
        }
        info!(
            metric = %self.metric,
            records = records.len(),
            populations = self.population.len(),
            "cumulative totals attached"
        );
    }

    /// Second sweep: z-score each total against its game-number population.
    /// Teams still within the first `min_games` games get 0.
    pub fn emit_normalized(&self, records: &mut [GameRecord]) -> Result<()> {
        let mut cache = NormCache::new();
        for (index, r) in records.iter_mut().enumerate() {
            let season = r.season;
            for side in Side::BOTH {
                let line = r.side_mut(side);
                let normalized = if line.game_number > self.min_games {
                    let Some(value) = line.features.cumulative.get(&self.metric).copied() else {
                        return Err(FeatureError::missing_derived(
                            index,
                            "cumulative",
                            &line.team,
                            "cumulative normalization",
                        ));
                    };
                    let key = (season, line.game_number);
                    cache.normalize(key, self.population(season, line.game_number), Some(value))
                } else {
                    0.0
                };
                line.features
                    .cumulative_normalized
                    .insert(self.metric, normalized);
            }
        }
        debug!(metric = %self.metric, cached = cache.len(), "cumulative normalization done");
        Ok(())
    }

    pub fn population(&self, season: i32, game_number: u32) -> &[f64] {
        self.population
            .get(&(season, game_number))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total(&self, season: i32, team: &str) -> f64 {
        self.totals.get(season, team)
    }
}
