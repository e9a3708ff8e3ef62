use std::collections::HashMap;

use tracing::info;

use crate::normalize::{NormCache, max_and_mean};
use crate::record::{GameRecord, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeStat {
    Avg,
    Max,
}

/// Player "age" is the number of earlier games a player started in, over
/// every season in the log. Each side gets the lineup's mean and max age,
/// z-scored against all lineups.
#[derive(Debug, Default)]
pub struct PlayerAgeTracker {
    appearances: HashMap<String, u32>,
}

impl PlayerAgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appearances(&self, player: &str) -> u32 {
        self.appearances.get(player).copied().unwrap_or(0)
    }

    pub fn apply(&mut self, records: &mut [GameRecord]) {
        let mut ages: Vec<[Option<(f64, f64)>; 2]> = Vec::with_capacity(records.len());
        let mut population: HashMap<AgeStat, Vec<f64>> = HashMap::new();

        for r in records.iter() {
            let mut row = [None, None];
            for (slot, side) in Side::BOTH.into_iter().enumerate() {
                let lineup = &r.side(side).lineup;
                let current = lineup
                    .iter()
                    .map(|p| self.appearances(p) as f64)
                    .collect::<Vec<_>>();
                if let Some((max, avg)) = max_and_mean(&current) {
                    population.entry(AgeStat::Avg).or_default().push(avg);
                    population.entry(AgeStat::Max).or_default().push(max);
                    row[slot] = Some((max, avg));
                }
            }
            for side in Side::BOTH {
                for player in &r.side(side).lineup {
                    *self.appearances.entry(player.clone()).or_insert(0) += 1;
                }
            }
            ages.push(row);
        }

        let mut cache = NormCache::new();
        for (r, row) in records.iter_mut().zip(ages) {
            for (slot, side) in Side::BOTH.into_iter().enumerate() {
                let age = row[slot];
                let mut norm = |stat: AgeStat, value: Option<f64>| {
                    let pop = population.get(&stat).map(Vec::as_slice).unwrap_or(&[]);
                    cache.normalize(stat, pop, value)
                };
                let avg = norm(AgeStat::Avg, age.map(|(_, avg)| avg));
                let max = norm(AgeStat::Max, age.map(|(max, _)| max));
                let features = &mut r.side_mut(side).features;
                features.avg_player_age_normalized = Some(avg);
                features.max_player_age_normalized = Some(max);
            }
        }
        info!(
            records = records.len(),
            players = self.appearances.len(),
            "player ages attached"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::record::TeamLine;

    fn game(day: u32, home: &[&str], visiting: &[&str]) -> GameRecord {
        let date = NaiveDate::from_ymd_opt(2017, 5, day).expect("valid date");
        let mut h = TeamLine::new("NYA", 3, day);
        h.lineup = home.iter().map(|p| p.to_string()).collect();
        let mut v = TeamLine::new("BOS", 2, day);
        v.lineup = visiting.iter().map(|p| p.to_string()).collect();
        GameRecord::new(2017, date, h, v)
    }

    #[test]
    fn ages_count_earlier_starts_only() {
        let mut records = vec![
            game(1, &["a", "b"], &["x", "y"]),
            game(2, &["a", "c"], &["x", "y"]),
        ];
        let mut tracker = PlayerAgeTracker::new();
        tracker.apply(&mut records);
        assert_eq!(tracker.appearances("a"), 2);
        assert_eq!(tracker.appearances("c"), 1);

        // Lineup means entering each game: 0, 0, then 0.5 (a=1, c=0) and 1.
        let stats = crate::normalize::PopulationStats::of(&[0.0, 0.0, 0.5, 1.0]);
        let home = &records[1].home.features;
        let expected = stats.z_score(0.5);
        assert!((home.avg_player_age_normalized.expect("set") - expected).abs() < 1e-9);
        let first = &records[0].home.features;
        assert!(first.avg_player_age_normalized.expect("set") < 0.0);
    }

    #[test]
    fn missing_lineup_is_neutral() {
        let mut records = vec![game(1, &["a"], &[]), game(2, &["a"], &[])];
        PlayerAgeTracker::new().apply(&mut records);
        assert_eq!(records[1].visiting.features.avg_player_age_normalized, Some(0.0));
        assert_eq!(records[1].visiting.features.max_player_age_normalized, Some(0.0));
    }
}
