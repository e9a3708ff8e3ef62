use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FeatureError, Result};
use crate::record::{GameRecord, Side};
use crate::standings::{games_remaining, win_pct};

/// How a finish level with the contender is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    /// A level finish counts fully for the team: P(X >= Y + gb).
    #[default]
    TeamHolds,
    /// A level finish counts half: P(X > Y + gb) + P(X = Y + gb) / 2.
    Split,
}

impl TieRule {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team" | "team_holds" | "holds" | "ge" => Some(TieRule::TeamHolds),
            "split" | "half" => Some(TieRule::Split),
            _ => None,
        }
    }
}

/// The two-team race left in a season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceInputs {
    pub games_remaining: i32,
    pub win_pct: f64,
    pub games_behind: i32,
    pub contender_games_remaining: i32,
    pub contender_pct: f64,
}

fn bucket(p: f64) -> u32 {
    (p.clamp(0.0, 1.0) * 1000.0).round() as u32
}

fn choose(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut c = 1.0_f64;
    for i in 0..k {
        c = c * (n - i) as f64 / (i + 1) as f64;
    }
    c
}

/// Memoized binomial point and upper-tail probabilities.
///
/// Probabilities are bucketed to thousandths both for the key and for the
/// computation, so one key always maps to one value.
#[derive(Debug, Default)]
pub struct BinomialTable {
    point: HashMap<(u32, u32, u32), f64>,
    tail: HashMap<(u32, u32, u32), f64>,
}

impl BinomialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// P(Bin(n, p) = k)
    pub fn pmf(&mut self, n: u32, p: f64, k: u32) -> f64 {
        if k > n {
            return 0.0;
        }
        let b = bucket(p);
        *self.point.entry((n, b, k)).or_insert_with(|| {
            let p = b as f64 / 1000.0;
            choose(n, k) * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32)
        })
    }

    /// P(Bin(n, p) >= k)
    pub fn tail(&mut self, n: u32, p: f64, k: u32) -> f64 {
        if k == 0 {
            return 1.0;
        }
        if k > n {
            return 0.0;
        }
        let key = (n, bucket(p), k);
        if let Some(v) = self.tail.get(&key) {
            return *v;
        }
        let v = (k..=n).map(|i| self.pmf(n, p, i)).sum::<f64>();
        self.tail.insert(key, v);
        v
    }

    pub fn len(&self) -> usize {
        self.point.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty() && self.tail.is_empty()
    }

    /// Probability the team's remaining wins reach the contender's remaining
    /// wins plus the current gap, with the contender's wins summed up to the
    /// smaller of the two schedules.
    pub fn race(&mut self, race: RaceInputs, rule: TieRule) -> f64 {
        let upper = race.games_remaining.min(race.contender_games_remaining);
        if upper < 0 {
            return 0.0;
        }
        let gr = race.games_remaining as u32;
        let cgr = race.contender_games_remaining as u32;

        let mut total = 0.0;
        for k in 0..=upper as u32 {
            let contender = self.pmf(cgr, race.contender_pct, k);
            if contender == 0.0 {
                continue;
            }
            let need = k as i64 + race.games_behind as i64;
            let team = match rule {
                TieRule::TeamHolds => self.tail(gr, race.win_pct, need.max(0) as u32),
                TieRule::Split => {
                    if need < 0 {
                        1.0
                    } else {
                        let need = need as u32;
                        self.tail(gr, race.win_pct, need + 1)
                            + 0.5 * self.pmf(gr, race.win_pct, need)
                    }
                }
            };
            total += contender * team;
        }
        total
    }
}

/// Playoff-contention probability per side, from the standings fields.
#[derive(Debug)]
pub struct ContentionScorer {
    table: BinomialTable,
    min_games: u32,
    season_length: u32,
    tie_rule: TieRule,
}

pub const COLD_START_SCORE: f64 = 0.5;

impl ContentionScorer {
    pub fn new(min_games: u32, season_length: u32, tie_rule: TieRule) -> Self {
        Self {
            table: BinomialTable::new(),
            min_games,
            season_length,
            tie_rule,
        }
    }

    pub fn score(&mut self, race: RaceInputs) -> f64 {
        self.table.race(race, self.tie_rule)
    }

    /// Needs loss counts and the standings fields.
    pub fn apply(&mut self, records: &mut [GameRecord]) -> Result<()> {
        for (index, r) in records.iter_mut().enumerate() {
            for side in Side::BOTH {
                let line = r.side(side);
                let score = if line.game_number <= self.min_games {
                    COLD_START_SCORE
                } else {
                    let f = &line.features;
                    let missing = |field: &'static str| {
                        FeatureError::missing_derived(index, field, &line.team, "contention")
                    };
                    let losses = f.loss_count.ok_or_else(|| missing("loss_count"))?;
                    let race = RaceInputs {
                        games_remaining: games_remaining(self.season_length, line.game_number),
                        win_pct: win_pct(losses, line.game_number),
                        games_behind: f.games_behind.ok_or_else(|| missing("games_behind"))?,
                        contender_games_remaining: f
                            .contender_games_remaining
                            .ok_or_else(|| missing("contender_games_remaining"))?,
                        contender_pct: f.contender_pct.ok_or_else(|| missing("contender_pct"))?,
                    };
                    self.score(race)
                };
                r.side_mut(side).features.contention_score = Some(score);
            }
        }
        debug!(memo_entries = self.table.len(), "binomial memo size");
        info!(records = records.len(), "contention scores attached");
        Ok(())
    }
}
