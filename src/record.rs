use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Visiting,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Visiting];

    /// Column prefix used for this side in exported feature rows.
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Home => "home_team",
            Side::Visiting => "visiting_team",
        }
    }
}

/// Per-game counting statistic a cumulative feature can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Runs,
    Hits,
    HomeRuns,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Runs, Metric::Hits, Metric::HomeRuns];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Runs => "runs",
            Metric::Hits => "hits",
            Metric::HomeRuns => "home_runs",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "runs" | "r" => Some(Metric::Runs),
            "hits" | "h" => Some(Metric::Hits),
            "home_runs" | "homeruns" | "hr" => Some(Metric::HomeRuns),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DivisionKey {
    pub league: String,
    pub division: String,
}

impl DivisionKey {
    pub fn new(league: impl Into<String>, division: impl Into<String>) -> Self {
        Self {
            league: league.into(),
            division: division.into(),
        }
    }
}

impl fmt::Display for DivisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.league, self.division)
    }
}

/// Features derived for one side of a game. Every value is computed from
/// games played strictly before this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamFeatures {
    #[serde(default)]
    pub loss_count: Option<u32>,
    #[serde(default)]
    pub streak: Option<i32>,
    #[serde(default)]
    pub cumulative: BTreeMap<Metric, f64>,
    #[serde(default)]
    pub cumulative_normalized: BTreeMap<Metric, f64>,
    #[serde(default)]
    pub rank_in_division: Option<u32>,
    #[serde(default)]
    pub games_behind: Option<i32>,
    #[serde(default)]
    pub contender_pct: Option<f64>,
    #[serde(default)]
    pub contender_games_remaining: Option<i32>,
    #[serde(default)]
    pub contention_score: Option<f64>,
    #[serde(default)]
    pub max_salary_normalized: Option<f64>,
    #[serde(default)]
    pub avg_salary_normalized: Option<f64>,
    #[serde(default)]
    pub starter_salary_normalized: Option<f64>,
    #[serde(default)]
    pub avg_player_age_normalized: Option<f64>,
    #[serde(default)]
    pub max_player_age_normalized: Option<f64>,
    #[serde(default)]
    pub max_slg_normalized: Option<f64>,
    #[serde(default)]
    pub avg_slg_normalized: Option<f64>,
    #[serde(default)]
    pub max_ops_normalized: Option<f64>,
    #[serde(default)]
    pub avg_ops_normalized: Option<f64>,
    #[serde(default)]
    pub starter_era_normalized: Option<f64>,
    #[serde(default)]
    pub starter_wpa_normalized: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLine {
    pub team: String,
    pub runs: u32,
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub home_runs: u32,
    pub game_number: u32,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    /// Player ids of the starting pitcher and the batting order.
    #[serde(default)]
    pub starting_pitcher: Option<String>,
    #[serde(default)]
    pub lineup: Vec<String>,
    #[serde(default)]
    pub features: TeamFeatures,
}

impl TeamLine {
    pub fn new(team: impl Into<String>, runs: u32, game_number: u32) -> Self {
        Self {
            team: team.into(),
            runs,
            hits: 0,
            home_runs: 0,
            game_number,
            league: None,
            division: None,
            starting_pitcher: None,
            lineup: Vec::new(),
            features: TeamFeatures::default(),
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Runs => self.runs as f64,
            Metric::Hits => self.hits as f64,
            Metric::HomeRuns => self.home_runs as f64,
        }
    }

    pub fn division_key(&self) -> Option<DivisionKey> {
        let (Some(league), Some(division)) = (self.league.as_ref(), self.division.as_ref()) else {
            return None;
        };
        Some(DivisionKey::new(league.clone(), division.clone()))
    }
}

/// Game-level features that do not belong to either side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFeatures {
    #[serde(default)]
    pub winning_team: Option<String>,
    #[serde(default)]
    pub is_intradivision: Option<bool>,
    #[serde(default)]
    pub interleague: Option<bool>,
    #[serde(default)]
    pub holiday: Option<bool>,
    #[serde(default)]
    pub rivalry: Option<bool>,
    #[serde(default)]
    pub park_capacity: Option<u32>,
    #[serde(default)]
    pub avg_ticket_price_normalized: Option<f64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub wind: Option<f64>,
    #[serde(default)]
    pub condition_score: Option<f64>,
}

fn first_game() -> u8 {
    1
}

/// One game, carried with both the home and the visiting perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub season: i32,
    pub date: NaiveDate,
    #[serde(default = "first_game")]
    pub number_of_game: u8,
    #[serde(default)]
    pub park_id: String,
    pub home: TeamLine,
    pub visiting: TeamLine,
    #[serde(default)]
    pub features: GameFeatures,
}

impl GameRecord {
    pub fn new(season: i32, date: NaiveDate, home: TeamLine, visiting: TeamLine) -> Self {
        Self {
            season,
            date,
            number_of_game: 1,
            park_id: String::new(),
            home,
            visiting,
            features: GameFeatures::default(),
        }
    }

    pub fn side(&self, side: Side) -> &TeamLine {
        match side {
            Side::Home => &self.home,
            Side::Visiting => &self.visiting,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut TeamLine {
        match side {
            Side::Home => &mut self.home,
            Side::Visiting => &mut self.visiting,
        }
    }

    /// Second leg of a doubleheader.
    pub fn is_nightcap(&self) -> bool {
        self.number_of_game == 2
    }

    /// Standings move only on single games and the first leg of a doubleheader.
    pub fn counts_for_standings(&self) -> bool {
        self.number_of_game < 2
    }

    /// Team with strictly more runs; a level score goes to the visitors.
    pub fn winner(&self) -> &str {
        if self.home.runs > self.visiting.runs {
            &self.home.team
        } else {
            &self.visiting.team
        }
    }
}
