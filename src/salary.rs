use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FeatureError, Result};
use crate::normalize::{NormCache, max_and_mean};
use crate::record::{GameRecord, Side};

/// Yearly salary of a player on a team's roster (nominal USD).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSalary {
    pub season: i32,
    pub team: String,
    pub player: String,
    pub salary: f64,
}

/// Lineup and starting pitcher salaries, z-scored against every salary paid
/// that season.
#[derive(Debug, Clone, Default)]
pub struct SalaryNormalizer {
    salaries: HashMap<(i32, String, String), f64>,
    by_season: HashMap<i32, Vec<f64>>,
}

impl SalaryNormalizer {
    pub fn from_salaries(salaries: &[PlayerSalary]) -> Self {
        let mut out = Self::default();
        for s in salaries {
            out.salaries
                .insert((s.season, s.team.clone(), s.player.clone()), s.salary);
            out.by_season.entry(s.season).or_default().push(s.salary);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.salaries.is_empty()
    }

    fn lookup(&self, season: i32, team: &str, player: &str) -> Result<f64> {
        self.salaries
            .get(&(season, team.to_string(), player.to_string()))
            .copied()
            .ok_or_else(|| {
                FeatureError::missing_reference("salary", format!("{season} {team} {player}"))
            })
    }

    pub fn apply(&self, records: &mut [GameRecord]) -> Result<()> {
        let mut cache = NormCache::new();
        for r in records.iter_mut() {
            let season = r.season;
            let population = self
                .by_season
                .get(&season)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for side in Side::BOTH {
                let line = r.side_mut(side);
                let mut lineup = Vec::with_capacity(line.lineup.len());
                for player in &line.lineup {
                    let salary = self.lookup(season, &line.team, player)?;
                    lineup.push(cache.normalize(season, population, Some(salary)));
                }
                let starter = match line.starting_pitcher.as_deref() {
                    Some(pitcher) => {
                        let salary = self.lookup(season, &line.team, pitcher)?;
                        cache.normalize(season, population, Some(salary))
                    }
                    None => 0.0,
                };
                let (max, avg) = max_and_mean(&lineup).unwrap_or((0.0, 0.0));
                line.features.max_salary_normalized = Some(max);
                line.features.avg_salary_normalized = Some(avg);
                line.features.starter_salary_normalized = Some(starter);
            }
        }
        info!(records = records.len(), seasons = cache.len(), "salaries normalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::record::TeamLine;

    fn salary(team: &str, player: &str, amount: f64) -> PlayerSalary {
        PlayerSalary {
            season: 2017,
            team: team.into(),
            player: player.into(),
            salary: amount,
        }
    }

    fn game(home_lineup: &[&str], home_pitcher: Option<&str>) -> GameRecord {
        let date = NaiveDate::from_ymd_opt(2017, 5, 1).expect("valid date");
        let mut home = TeamLine::new("NYA", 3, 1);
        home.lineup = home_lineup.iter().map(|p| p.to_string()).collect();
        home.starting_pitcher = home_pitcher.map(str::to_string);
        GameRecord::new(2017, date, home, TeamLine::new("BOS", 2, 1))
    }

    #[test]
    fn lineup_max_avg_and_starter() {
        // Season population 10, 20, 30, 40: mean 25, std sqrt(125).
        let normalizer = SalaryNormalizer::from_salaries(&[
            salary("NYA", "a", 10.0),
            salary("NYA", "b", 40.0),
            salary("NYA", "p", 30.0),
            salary("BOS", "c", 20.0),
        ]);
        let mut records = vec![game(&["a", "b"], Some("p"))];
        normalizer.apply(&mut records).expect("salaries");

        let std = 125.0_f64.sqrt();
        let f = &records[0].home.features;
        assert!((f.max_salary_normalized.expect("set") - 15.0 / std).abs() < 1e-9);
        assert!((f.avg_salary_normalized.expect("set") - 0.0).abs() < 1e-9);
        assert!((f.starter_salary_normalized.expect("set") - 5.0 / std).abs() < 1e-9);

        // No lineup or starter listed for the visitors.
        let f = &records[0].visiting.features;
        assert_eq!(f.max_salary_normalized, Some(0.0));
        assert_eq!(f.starter_salary_normalized, Some(0.0));
    }

    #[test]
    fn unknown_player_is_missing_reference() {
        let normalizer = SalaryNormalizer::from_salaries(&[salary("NYA", "a", 10.0)]);
        let mut records = vec![game(&["a", "z"], None)];
        let err = normalizer.apply(&mut records).unwrap_err();
        assert!(matches!(err, FeatureError::MissingReference { table: "salary", .. }));
    }
}
