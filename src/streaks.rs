use tracing::info;

use crate::counters::SeasonCounter;
use crate::error::{FeatureError, Result};
use crate::record::{GameRecord, Side};

/// Signed streak after one more game: positive counts wins in a row,
/// negative counts losses in a row.
pub fn next_streak(previous: i32, won: bool) -> i32 {
    match (won, previous) {
        (true, p) if p > 0 => p + 1,
        (true, _) => 1,
        (false, p) if p < 0 => p - 1,
        (false, _) => -1,
    }
}

#[derive(Debug, Default)]
pub struct StreakTracker {
    streaks: SeasonCounter<i32>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Needs `winning_team` from the loss pass.
    pub fn apply(&mut self, records: &mut [GameRecord]) -> Result<()> {
        for (index, r) in records.iter_mut().enumerate() {
            let Some(winner) = r.features.winning_team.clone() else {
                return Err(FeatureError::missing_derived(
                    index,
                    "winning_team",
                    &r.home.team,
                    "streak",
                ));
            };
            let season = r.season;
            for side in Side::BOTH {
                let line = r.side_mut(side);
                let current = self.streaks.get(season, &line.team);
                line.features.streak = Some(current);
                self.streaks
                    .set(season, &line.team, next_streak(current, line.team == winner));
            }
        }
        info!(records = records.len(), "streaks attached");
        Ok(())
    }
}
