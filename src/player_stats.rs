use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::normalize::{NormCache, max_and_mean};
use crate::record::{GameRecord, Side};

/// Season-to-date batting and pitching numbers for a player entering a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub date: NaiveDate,
    pub player: String,
    #[serde(default)]
    pub slg: Option<f64>,
    #[serde(default)]
    pub ops: Option<f64>,
    #[serde(default)]
    pub era: Option<f64>,
    #[serde(default)]
    pub wpa: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMetric {
    Slg,
    Ops,
    Era,
    Wpa,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatLine {
    pub slg: Option<f64>,
    pub ops: Option<f64>,
    pub era: Option<f64>,
    pub wpa: Option<f64>,
}

impl StatLine {
    pub fn get(&self, metric: StatMetric) -> Option<f64> {
        match metric {
            StatMetric::Slg => self.slg,
            StatMetric::Ops => self.ops,
            StatMetric::Era => self.era,
            StatMetric::Wpa => self.wpa,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SideStats {
    starter: StatLine,
    lineup: Vec<StatLine>,
}

/// Lineup slugging and OPS, starting pitcher ERA and WPA, each z-scored
/// against the same metric across the season's opening-game lineups.
/// Sides within their first `min_games` games get 0 on every stat.
#[derive(Debug, Clone, Default)]
pub struct PlayerStatsModel {
    lines: HashMap<(NaiveDate, String), StatLine>,
}

impl PlayerStatsModel {
    pub fn from_stats(stats: &[PlayerGameStats]) -> Self {
        let lines = stats
            .iter()
            .map(|s| {
                (
                    (s.date, s.player.clone()),
                    StatLine {
                        slg: s.slg,
                        ops: s.ops,
                        era: s.era,
                        wpa: s.wpa,
                    },
                )
            })
            .collect();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Unknown players read as all-missing.
    pub fn line(&self, date: NaiveDate, player: &str) -> StatLine {
        self.lines
            .get(&(date, player.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn side_stats(&self, record: &GameRecord, side: Side) -> SideStats {
        let line = record.side(side);
        SideStats {
            starter: line
                .starting_pitcher
                .as_deref()
                .map(|p| self.line(record.date, p))
                .unwrap_or_default(),
            lineup: line
                .lineup
                .iter()
                .map(|p| self.line(record.date, p))
                .collect(),
        }
    }

    pub fn apply(&self, records: &mut [GameRecord], min_games: u32) {
        let mut games: HashMap<(NaiveDate, String), SideStats> = HashMap::new();
        let mut population: HashMap<(StatMetric, i32), Vec<f64>> = HashMap::new();

        // A doubleheader's second game reuses the first game's lineups.
        for r in records.iter().filter(|r| r.counts_for_standings()) {
            for side in Side::BOTH {
                let stats = self.side_stats(r, side);
                for metric in [StatMetric::Era, StatMetric::Wpa] {
                    if let Some(v) = stats.starter.get(metric) {
                        population.entry((metric, r.season)).or_default().push(v);
                    }
                }
                for metric in [StatMetric::Slg, StatMetric::Ops] {
                    let values = stats.lineup.iter().filter_map(|l| l.get(metric));
                    population.entry((metric, r.season)).or_default().extend(values);
                }
                games.insert((r.date, r.side(side).team.clone()), stats);
            }
        }

        let mut cache = NormCache::new();
        for r in records.iter_mut() {
            let season = r.season;
            for side in Side::BOTH {
                let line = r.side(side);
                let mut out = [0.0; 6];
                if line.game_number > min_games {
                    let own;
                    let stats = match games.get(&(r.date, line.team.clone())) {
                        Some(stats) => stats,
                        None => {
                            own = self.side_stats(r, side);
                            &own
                        }
                    };
                    let mut norm = |metric: StatMetric, value: Option<f64>| {
                        let key = (metric, season);
                        let pop = population.get(&key).map(Vec::as_slice).unwrap_or(&[]);
                        cache.normalize(key, pop, value)
                    };
                    let slg = stats
                        .lineup
                        .iter()
                        .map(|l| norm(StatMetric::Slg, l.slg))
                        .collect::<Vec<_>>();
                    let ops = stats
                        .lineup
                        .iter()
                        .map(|l| norm(StatMetric::Ops, l.ops))
                        .collect::<Vec<_>>();
                    let (max_slg, avg_slg) = max_and_mean(&slg).unwrap_or((0.0, 0.0));
                    let (max_ops, avg_ops) = max_and_mean(&ops).unwrap_or((0.0, 0.0));
                    out = [
                        max_slg,
                        avg_slg,
                        max_ops,
                        avg_ops,
                        norm(StatMetric::Era, stats.starter.era),
                        norm(StatMetric::Wpa, stats.starter.wpa),
                    ];
                }
                let f = &mut r.side_mut(side).features;
                f.max_slg_normalized = Some(out[0]);
                f.avg_slg_normalized = Some(out[1]);
                f.max_ops_normalized = Some(out[2]);
                f.avg_ops_normalized = Some(out[3]);
                f.starter_era_normalized = Some(out[4]);
                f.starter_wpa_normalized = Some(out[5]);
            }
        }
        info!(
            records = records.len(),
            populations = population.len(),
            "player stats attached"
        );
    }
}
