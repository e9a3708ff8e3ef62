use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{FeatureError, Result};
use crate::record::{DivisionKey, GameRecord, Side};

/// Win percentage from games played before this one, rounded the way the
/// loss rate is rounded (3 decimals). A team with no prior games sits at .500.
pub fn win_pct(losses: u32, game_number: u32) -> f64 {
    let loss_rate = if game_number > 1 {
        round3(losses as f64 / (game_number - 1) as f64)
    } else {
        0.5
    };
    1.0 - loss_rate
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round_ties_even() / 1000.0
}

pub fn games_remaining(season_length: u32, game_number: u32) -> i32 {
    season_length as i32 - game_number as i32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandingEntry {
    pub losses: u32,
    pub win_pct: f64,
}

/// Standings entering one date. Teams are keyed by code so iteration is in
/// lexical order, which is also the tie-break for equal loss counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySnapshot {
    pub divisions: HashMap<DivisionKey, BTreeMap<String, StandingEntry>>,
    pub games_remaining: HashMap<String, i32>,
}

impl DaySnapshot {
    pub fn ranked(&self, division: &DivisionKey) -> Option<RankedDivision> {
        let entries = self.divisions.get(division)?;
        Some(RankedDivision::from_entries(entries, &self.games_remaining))
    }

    pub fn losses(&self, division: &DivisionKey, team: &str) -> Option<u32> {
        self.divisions
            .get(division)
            .and_then(|teams| teams.get(team))
            .map(|e| e.losses)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTeam {
    pub team: String,
    pub losses: u32,
    pub win_pct: f64,
    pub games_remaining: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DivisionPosition {
    pub rank: u32,
    pub games_behind: i32,
    pub contender: Option<RankedTeam>,
}

/// Teams of one division ordered by losses, then team code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedDivision {
    teams: Vec<RankedTeam>,
}

impl RankedDivision {
    pub fn from_entries(
        entries: &BTreeMap<String, StandingEntry>,
        games_remaining: &HashMap<String, i32>,
    ) -> Self {
        let mut teams = entries
            .iter()
            .map(|(team, entry)| RankedTeam {
                team: team.clone(),
                losses: entry.losses,
                win_pct: entry.win_pct,
                games_remaining: games_remaining.get(team).copied().unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        // Stable: equal loss counts keep the lexical order of the map.
        teams.sort_by_key(|t| t.losses);
        Self { teams }
    }

    pub fn teams(&self) -> &[RankedTeam] {
        &self.teams
    }

    pub fn loss_values(&self) -> Vec<u32> {
        self.teams.iter().map(|t| t.losses).collect()
    }

    /// Rank, games behind and contender for `team` carrying `loss_count`
    /// into this game.
    ///
    /// On the second leg of a doubleheader the snapshot may already hold the
    /// count from before the first leg; when the team's current count is not
    /// among the listed values it is stepped back by one before ranking.
    pub fn position(&self, team: &str, loss_count: u32, nightcap: bool) -> DivisionPosition {
        let values = self.loss_values();
        let adjusted = if nightcap && !values.contains(&loss_count) {
            loss_count as i64 - 1
        } else {
            loss_count as i64
        };

        let ahead = values.partition_point(|&v| (v as i64) < adjusted);
        let rank = ahead as u32 + 1;

        let reference = if rank > 1 { 0 } else { 1 };
        let games_behind = values
            .get(reference)
            .map(|&v| (adjusted - v as i64) as i32)
            .unwrap_or(0);

        let contender = if rank > 1 {
            self.teams.first()
        } else {
            self.teams
                .iter()
                .find(|t| t.team != team)
                .or_else(|| self.teams.first())
        };

        DivisionPosition {
            rank,
            games_behind,
            contender: contender.cloned(),
        }
    }
}

/// Append-only `(date, snapshot)` sequence in date order.
#[derive(Debug, Clone, Default)]
pub struct StandingsBook {
    snapshots: Vec<(NaiveDate, DaySnapshot)>,
}

impl StandingsBook {
    /// Needs `loss_count` on both sides and division tags.
    pub fn build(records: &[GameRecord], season_length: u32) -> Result<Self> {
        let mut snapshots = Vec::new();
        let mut working = DaySnapshot::default();
        let mut current: Option<(i32, NaiveDate)> = None;

        for (index, r) in records.iter().enumerate() {
            if let Some((season, date)) = current {
                if date != r.date {
                    snapshots.push((date, working.clone()));
                }
                if season != r.season {
                    working = DaySnapshot::default();
                }
            }
            current = Some((r.season, r.date));

            for side in Side::BOTH {
                let line = r.side(side);
                let Some(losses) = line.features.loss_count else {
                    return Err(FeatureError::missing_derived(
                        index,
                        "loss_count",
                        &line.team,
                        "standings",
                    ));
                };
                if r.counts_for_standings() {
                    let division = division_of(r, side)?;
                    working.divisions.entry(division).or_default().insert(
                        line.team.clone(),
                        StandingEntry {
                            losses,
                            win_pct: win_pct(losses, line.game_number),
                        },
                    );
                }
                working.games_remaining.insert(
                    line.team.clone(),
                    games_remaining(season_length, line.game_number),
                );
            }
        }
        if let Some((_, date)) = current {
            snapshots.push((date, working));
        }

        debug!(snapshots = snapshots.len(), "standings snapshots frozen");
        Ok(Self { snapshots })
    }

    pub fn snapshot(&self, date: NaiveDate) -> Option<&DaySnapshot> {
        self.snapshots
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| &self.snapshots[idx].1)
    }

    pub fn snapshots(&self) -> &[(NaiveDate, DaySnapshot)] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

fn division_of(record: &GameRecord, side: Side) -> Result<DivisionKey> {
    let line = record.side(side);
    line.division_key().ok_or_else(|| {
        FeatureError::missing_reference("division", format!("{} {}", record.season, line.team))
    })
}

#[derive(Debug, Clone, Copy)]
pub struct StandingsReconstructor {
    season_length: u32,
}

impl StandingsReconstructor {
    pub fn new(season_length: u32) -> Self {
        Self { season_length }
    }

    /// Attaches rank, games behind and the contender's win% and games
    /// remaining to both sides of every record.
    pub fn apply(&self, records: &mut [GameRecord]) -> Result<StandingsBook> {
        let book = StandingsBook::build(records, self.season_length)?;

        for (index, r) in records.iter_mut().enumerate() {
            for side in Side::BOTH {
                let division = division_of(r, side)?;
                let nightcap = r.is_nightcap();
                let line = r.side(side);
                let Some(losses) = line.features.loss_count else {
                    return Err(FeatureError::missing_derived(
                        index,
                        "loss_count",
                        &line.team,
                        "standings",
                    ));
                };
                let own_pct = win_pct(losses, line.game_number);
                let own_remaining = games_remaining(self.season_length, line.game_number);

                let position = match book.snapshot(r.date).and_then(|s| s.ranked(&division)) {
                    Some(ranked) => ranked.position(&line.team, losses, nightcap),
                    None => {
                        warn!(date = %r.date, division = %division, team = %line.team, "no standings for division yet");
                        DivisionPosition {
                            rank: 1,
                            games_behind: 0,
                            contender: None,
                        }
                    }
                };
                let (contender_pct, contender_remaining) = match &position.contender {
                    Some(c) => (c.win_pct, c.games_remaining),
                    None => (own_pct, own_remaining),
                };

                let features = &mut r.side_mut(side).features;
                features.rank_in_division = Some(position.rank);
                features.games_behind = Some(position.games_behind);
                features.contender_pct = Some(contender_pct);
                features.contender_games_remaining = Some(contender_remaining);
            }
        }

        info!(records = records.len(), snapshots = book.len(), "standings attached");
        Ok(book)
    }
}
