use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FeatureError, Result};
use crate::player_stats::PlayerGameStats;
use crate::pricing::TicketPrice;
use crate::record::{DivisionKey, GameRecord, Side};
use crate::salary::PlayerSalary;
use crate::weather::{DomeDefault, WeatherObservation, builtin_dome_defaults};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionAssignment {
    pub season: i32,
    pub team: String,
    pub league: String,
    pub division: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkCapacity {
    pub season: i32,
    pub park_id: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rivalry {
    pub visiting_team: String,
    pub home_team: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub home_team: String,
}

fn default_aliases() -> HashMap<String, String> {
    HashMap::from([
        ("FLO".to_string(), "MIA".to_string()),
        ("CAL".to_string(), "ANA".to_string()),
    ])
}

/// Static tables delivered alongside the game log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default = "default_aliases")]
    pub team_aliases: HashMap<String, String>,
    #[serde(default)]
    pub divisions: Vec<DivisionAssignment>,
    #[serde(default)]
    pub park_capacities: Vec<ParkCapacity>,
    #[serde(default)]
    pub rivalries: Vec<Rivalry>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub ticket_prices: Vec<TicketPrice>,
    #[serde(default)]
    pub salaries: Vec<PlayerSalary>,
    #[serde(default)]
    pub player_stats: Vec<PlayerGameStats>,
    #[serde(default)]
    pub weather: Vec<WeatherObservation>,
    #[serde(default = "builtin_dome_defaults")]
    pub dome_defaults: Vec<DomeDefault>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            team_aliases: default_aliases(),
            divisions: Vec::new(),
            park_capacities: Vec::new(),
            rivalries: Vec::new(),
            holidays: Vec::new(),
            ticket_prices: Vec::new(),
            salaries: Vec::new(),
            player_stats: Vec::new(),
            weather: Vec::new(),
            dome_defaults: builtin_dome_defaults(),
        }
    }
}

/// Keyed views over [`ReferenceData`] used by the join passes.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    aliases: HashMap<String, String>,
    divisions: HashMap<(i32, String), DivisionKey>,
    capacities: HashMap<(i32, String), u32>,
    rivalries: HashSet<(String, String)>,
    holidays: HashSet<(NaiveDate, String)>,
}

impl Lookups {
    pub fn from_reference(reference: &ReferenceData) -> Self {
        Self {
            aliases: reference.team_aliases.clone(),
            divisions: reference
                .divisions
                .iter()
                .map(|d| {
                    (
                        (d.season, d.team.clone()),
                        DivisionKey::new(d.league.clone(), d.division.clone()),
                    )
                })
                .collect(),
            capacities: reference
                .park_capacities
                .iter()
                .map(|p| ((p.season, p.park_id.clone()), p.capacity))
                .collect(),
            rivalries: reference
                .rivalries
                .iter()
                .map(|r| (r.visiting_team.clone(), r.home_team.clone()))
                .collect(),
            holidays: reference
                .holidays
                .iter()
                .map(|h| (h.date, h.home_team.clone()))
                .collect(),
        }
    }

    pub fn division(&self, season: i32, team: &str) -> Result<&DivisionKey> {
        self.divisions
            .get(&(season, team.to_string()))
            .ok_or_else(|| FeatureError::missing_reference("division", format!("{season} {team}")))
    }

    pub fn park_capacity(&self, season: i32, park_id: &str) -> Result<u32> {
        self.capacities
            .get(&(season, park_id.to_string()))
            .copied()
            .ok_or_else(|| {
                FeatureError::missing_reference("park capacity", format!("{season} {park_id}"))
            })
    }

    pub fn has_capacities(&self) -> bool {
        !self.capacities.is_empty()
    }

    pub fn is_rivalry(&self, visiting: &str, home: &str) -> bool {
        self.rivalries
            .contains(&(visiting.to_string(), home.to_string()))
    }

    pub fn is_holiday(&self, date: NaiveDate, home: &str) -> bool {
        self.holidays.contains(&(date, home.to_string()))
    }

    /// Rewrites renamed franchises to their current code.
    pub fn canonicalize_teams(&self, records: &mut [GameRecord]) -> usize {
        let mut renamed = 0usize;
        for r in records.iter_mut() {
            for side in Side::BOTH {
                let line = r.side_mut(side);
                if let Some(canonical) = self.aliases.get(&line.team) {
                    line.team = canonical.clone();
                    renamed += 1;
                }
            }
        }
        if renamed > 0 {
            info!(renamed, "team aliases canonicalized");
        }
        renamed
    }

    pub fn attach_divisions(&self, records: &mut [GameRecord]) -> Result<()> {
        for r in records.iter_mut() {
            let season = r.season;
            for side in Side::BOTH {
                let line = r.side_mut(side);
                let division = self.division(season, &line.team)?;
                line.league = Some(division.league.clone());
                line.division = Some(division.division.clone());
            }
        }
        Ok(())
    }

    /// Intra-division, interleague, holiday, rivalry and park-capacity flags.
    /// Capacity is only joined when a capacity table was supplied.
    pub fn attach_game_context(&self, records: &mut [GameRecord]) -> Result<()> {
        let with_capacity = self.has_capacities();
        for r in records.iter_mut() {
            let home = self.division(r.season, &r.home.team)?;
            let visiting = self.division(r.season, &r.visiting.team)?;
            r.features.is_intradivision = Some(home == visiting);
            r.features.interleague = Some(home.league != visiting.league);
            r.features.holiday = Some(self.is_holiday(r.date, &r.home.team));
            r.features.rivalry = Some(self.is_rivalry(&r.visiting.team, &r.home.team));
            if with_capacity {
                r.features.park_capacity = Some(self.park_capacity(r.season, &r.park_id)?);
            }
        }
        info!(records = records.len(), "game context attached");
        Ok(())
    }
}
