use tracing::info;

use crate::counters::SeasonCounter;
use crate::record::{GameRecord, Side};

/// Season loss counts per team, emitted before each game's result is known.
#[derive(Debug, Default)]
pub struct LossTracker {
    losses: SeasonCounter<u32>,
}

impl LossTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, records: &mut [GameRecord]) {
        for r in records.iter_mut() {
            let winner = r.winner().to_string();
            for side in Side::BOTH {
                let season = r.season;
                let line = r.side_mut(side);
                line.features.loss_count = Some(self.losses.get(season, &line.team));
                if line.team != winner {
                    *self.losses.entry(season, &line.team) += 1;
                }
            }
            r.features.winning_team = Some(winner);
        }
        info!(records = records.len(), teams = self.losses.len(), "loss counts attached");
    }

    pub fn losses(&self, season: i32, team: &str) -> u32 {
        self.losses.get(season, team)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::record::TeamLine;

    fn game(season: i32, day: u32, home: (&str, u32), visiting: (&str, u32), gn: u32) -> GameRecord {
        let date = NaiveDate::from_ymd_opt(season, 4, day).expect("valid date");
        GameRecord::new(
            season,
            date,
            TeamLine::new(home.0, home.1, gn),
            TeamLine::new(visiting.0, visiting.1, gn),
        )
    }

    #[test]
    fn emits_before_incrementing() {
        let mut records = vec![
            game(2017, 1, ("NYA", 1), ("BOS", 4), 1),
            game(2017, 2, ("NYA", 2), ("BOS", 3), 2),
            game(2017, 3, ("NYA", 6), ("BOS", 0), 3),
        ];
        let mut tracker = LossTracker::new();
        tracker.apply(&mut records);

        let home: Vec<_> = records.iter().map(|r| r.home.features.loss_count).collect();
        let away: Vec<_> = records.iter().map(|r| r.visiting.features.loss_count).collect();
        assert_eq!(home, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(away, vec![Some(0), Some(0), Some(0)]);
        assert_eq!(tracker.losses(2017, "NYA"), 2);
        assert_eq!(tracker.losses(2017, "BOS"), 1);
        assert_eq!(records[0].features.winning_team.as_deref(), Some("BOS"));
    }

    #[test]
    fn new_season_starts_at_zero() {
        let mut records = vec![
            game(2016, 1, ("NYA", 1), ("BOS", 4), 1),
            game(2017, 1, ("NYA", 1), ("BOS", 4), 1),
        ];
        LossTracker::new().apply(&mut records);
        assert_eq!(records[1].home.features.loss_count, Some(0));
    }
}
