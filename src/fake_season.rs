use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::player_stats::PlayerGameStats;
use crate::pricing::TicketPrice;
use crate::record::{GameRecord, TeamLine};
use crate::reference::{DivisionAssignment, Holiday, ParkCapacity, ReferenceData, Rivalry};
use crate::salary::PlayerSalary;
use crate::weather::{Precipitation, Sky, WeatherObservation};

#[derive(Debug, Clone, Copy)]
pub struct FakeTeam {
    pub code: &'static str,
    pub league: &'static str,
    pub division: &'static str,
    pub park_id: &'static str,
    pub domed: bool,
}

const fn team(
    code: &'static str,
    league: &'static str,
    division: &'static str,
    park_id: &'static str,
    domed: bool,
) -> FakeTeam {
    FakeTeam {
        code,
        league,
        division,
        park_id,
        domed,
    }
}

pub const TEAMS: [FakeTeam; 30] = [
    team("BAL", "AL", "East", "BAL12", false),
    team("BOS", "AL", "East", "BOS07", false),
    team("NYA", "AL", "East", "NYC21", false),
    team("TBA", "AL", "East", "STP01", true),
    team("TOR", "AL", "East", "TOR02", true),
    team("CHA", "AL", "Central", "CHI12", false),
    team("CLE", "AL", "Central", "CLE08", false),
    team("DET", "AL", "Central", "DET05", false),
    team("KCA", "AL", "Central", "KAN06", false),
    team("MIN", "AL", "Central", "MIN04", false),
    team("ANA", "AL", "West", "ANA01", false),
    team("HOU", "AL", "West", "HOU03", true),
    team("OAK", "AL", "West", "OAK01", false),
    team("SEA", "AL", "West", "SEA03", true),
    team("TEX", "AL", "West", "ARL02", false),
    team("ATL", "NL", "East", "ATL03", false),
    team("MIA", "NL", "East", "MIA02", true),
    team("NYN", "NL", "East", "NYC20", false),
    team("PHI", "NL", "East", "PHI13", false),
    team("WAS", "NL", "East", "WAS11", false),
    team("CHN", "NL", "Central", "CHI11", false),
    team("CIN", "NL", "Central", "CIN09", false),
    team("MIL", "NL", "Central", "MIL06", true),
    team("PIT", "NL", "Central", "PIT08", false),
    team("SLN", "NL", "Central", "STL10", false),
    team("ARI", "NL", "West", "PHO01", true),
    team("COL", "NL", "West", "DEN02", false),
    team("LAN", "NL", "West", "LOS03", false),
    team("SDN", "NL", "West", "SAN02", false),
    team("SFN", "NL", "West", "SFO03", false),
];

const RIVALS: [(&str, &str); 3] = [("NYA", "BOS"), ("CHN", "SLN"), ("LAN", "SFN")];

const HITTERS: usize = 13;
const ROTATION: usize = 5;

#[derive(Debug, Clone)]
struct Roster {
    hitters: Vec<String>,
    pitchers: Vec<String>,
}

impl Roster {
    fn new(code: &str) -> Self {
        Self {
            hitters: (1..=HITTERS).map(|i| format!("{code}_h{i:02}")).collect(),
            pitchers: (1..=ROTATION).map(|i| format!("{code}_p{i}")).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeasonPlan {
    pub season: i32,
    pub start: NaiveDate,
    pub days: u32,
    pub seed: u64,
    pub doubleheader_rate: f64,
    /// Share of outdoor weather rows with no temperature reading.
    pub missing_temp_rate: f64,
}

impl SeasonPlan {
    pub fn new(season: i32, days: u32, seed: u64) -> Self {
        let start = NaiveDate::from_ymd_opt(season, 4, 2).unwrap_or_default();
        Self {
            season,
            start,
            days,
            seed,
            doubleheader_rate: 0.03,
            missing_temp_rate: 0.02,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticSeason {
    pub records: Vec<GameRecord>,
    pub reference: ReferenceData,
}

/// Builds a date-sorted season where every team plays once a day, with the
/// odd doubleheader, plus reference tables that cover every game.
pub fn generate(plan: &SeasonPlan) -> SyntheticSeason {
    let mut rng = StdRng::seed_from_u64(plan.seed);
    let mut played: HashMap<&'static str, u32> = HashMap::new();
    let rosters: HashMap<&'static str, Roster> =
        TEAMS.iter().map(|t| (t.code, Roster::new(t.code))).collect();
    let mut records = Vec::new();
    let mut weather = Vec::new();
    let mut player_stats = Vec::new();

    for day in 0..plan.days {
        let date = plan.start + Duration::days(day as i64);
        let mut order = TEAMS.to_vec();
        order.shuffle(&mut rng);
        for pair in order.chunks_exact(2) {
            let (home, visiting) = (pair[0], pair[1]);
            let legs = if rng.gen_bool(plan.doubleheader_rate.clamp(0.0, 1.0)) {
                2
            } else {
                1
            };
            for leg in 1..=legs {
                let home_gn = bump(&mut played, home.code);
                let visiting_gn = bump(&mut played, visiting.code);
                let mut record = GameRecord::new(
                    plan.season,
                    date,
                    fake_line(&mut rng, home.code, home_gn),
                    fake_line(&mut rng, visiting.code, visiting_gn),
                );
                for line in [&mut record.home, &mut record.visiting] {
                    if let Some(roster) = rosters.get(line.team.as_str()) {
                        fill_lineup(&mut rng, line, roster);
                        player_stats.extend(fake_stats(&mut rng, date, line));
                    }
                }
                if record.home.runs == record.visiting.runs {
                    if rng.gen_bool(0.5) {
                        record.home.runs += 1;
                    } else {
                        record.visiting.runs += 1;
                    }
                }
                record.number_of_game = if legs == 2 { leg } else { 1 };
                record.park_id = home.park_id.to_string();
                records.push(record);
            }
            weather.push(fake_weather(&mut rng, plan, date, &home));
        }
    }

    let mut reference = fake_reference(&mut rng, plan, weather);
    reference.salaries = fake_salaries(&mut rng, plan, &rosters);
    reference.player_stats = player_stats;
    SyntheticSeason { records, reference }
}

fn fill_lineup(rng: &mut StdRng, line: &mut TeamLine, roster: &Roster) {
    let mut hitters = roster.hitters.clone();
    hitters.shuffle(rng);
    hitters.truncate(9);
    line.lineup = hitters;
    let turn = (line.game_number as usize).saturating_sub(1) % ROTATION;
    line.starting_pitcher = roster.pitchers.get(turn).cloned();
}

fn fake_stats(rng: &mut StdRng, date: NaiveDate, line: &TeamLine) -> Vec<PlayerGameStats> {
    let mut out = line
        .lineup
        .iter()
        .map(|player| {
            let slg = if rng.gen_bool(0.05) {
                None
            } else {
                Some(rng.gen_range(0.30..0.60_f64))
            };
            PlayerGameStats {
                date,
                player: player.clone(),
                slg,
                ops: slg.map(|s| s + rng.gen_range(0.25..0.40_f64)),
                era: None,
                wpa: None,
            }
        })
        .collect::<Vec<_>>();
    if let Some(pitcher) = &line.starting_pitcher {
        out.push(PlayerGameStats {
            date,
            player: pitcher.clone(),
            slg: None,
            ops: None,
            era: Some(rng.gen_range(2.0..6.5_f64)),
            wpa: Some(rng.gen_range(-1.5..2.5_f64)),
        });
    }
    out
}

fn fake_salaries(
    rng: &mut StdRng,
    plan: &SeasonPlan,
    rosters: &HashMap<&'static str, Roster>,
) -> Vec<PlayerSalary> {
    let mut out = Vec::new();
    // Walk teams in table order so the output is stable for a given seed.
    for t in TEAMS.iter() {
        let Some(roster) = rosters.get(t.code) else {
            continue;
        };
        for player in roster.hitters.iter().chain(&roster.pitchers) {
            out.push(PlayerSalary {
                season: plan.season,
                team: t.code.to_string(),
                player: player.clone(),
                salary: (rng.gen_range(0.5..30.0_f64) * 1_000_000.0).round(),
            });
        }
    }
    out
}

fn bump(played: &mut HashMap<&'static str, u32>, code: &'static str) -> u32 {
    let count = played.entry(code).or_insert(0);
    *count += 1;
    *count
}

fn fake_line(rng: &mut StdRng, code: &str, game_number: u32) -> TeamLine {
    let mut line = TeamLine::new(code, rng.gen_range(0..=9), game_number);
    line.hits = line.runs + rng.gen_range(2..=7);
    line.home_runs = rng.gen_range(0..=line.runs.min(3));
    line
}

fn fake_weather(
    rng: &mut StdRng,
    plan: &SeasonPlan,
    date: NaiveDate,
    home: &FakeTeam,
) -> WeatherObservation {
    if home.domed {
        return WeatherObservation {
            date,
            home_team: home.code.to_string(),
            temp: Some(72.0),
            wind_speed: None,
            sky: Some(Sky::InDome),
            precipitation: Some(Precipitation::NoPrecipitation),
        };
    }
    let base = match date.month() {
        3 | 4 => 58.0,
        5 => 67.0,
        6 => 76.0,
        7 | 8 => 82.0,
        _ => 70.0,
    };
    let temp = if rng.gen_bool(plan.missing_temp_rate.clamp(0.0, 1.0)) {
        None
    } else {
        Some(base + rng.gen_range(-8.0..8.0_f64).round())
    };
    let sky = [Sky::Sunny, Sky::Cloudy, Sky::Overcast, Sky::Night][rng.gen_range(0..4)];
    let precipitation = if rng.gen_bool(0.1) {
        [Precipitation::Drizzle, Precipitation::Showers, Precipitation::Rain][rng.gen_range(0..3)]
    } else {
        Precipitation::NoPrecipitation
    };
    WeatherObservation {
        date,
        home_team: home.code.to_string(),
        temp,
        wind_speed: Some(rng.gen_range(0..=18) as f64),
        sky: Some(sky),
        precipitation: Some(precipitation),
    }
}

fn fake_reference(
    rng: &mut StdRng,
    plan: &SeasonPlan,
    weather: Vec<WeatherObservation>,
) -> ReferenceData {
    let divisions = TEAMS
        .iter()
        .map(|t| DivisionAssignment {
            season: plan.season,
            team: t.code.to_string(),
            league: t.league.to_string(),
            division: t.division.to_string(),
        })
        .collect();
    let park_capacities = TEAMS
        .iter()
        .map(|t| ParkCapacity {
            season: plan.season,
            park_id: t.park_id.to_string(),
            capacity: rng.gen_range(31_000..=56_000),
        })
        .collect();
    let ticket_prices = TEAMS
        .iter()
        .map(|t| TicketPrice {
            season: plan.season,
            team: t.code.to_string(),
            price: (rng.gen_range(18.0..60.0_f64) * 100.0).round() / 100.0,
        })
        .collect();
    let rivalries = RIVALS
        .iter()
        .flat_map(|(a, b)| [(a, b), (b, a)])
        .map(|(visiting, home)| Rivalry {
            visiting_team: visiting.to_string(),
            home_team: home.to_string(),
        })
        .collect();
    let holidays = NaiveDate::from_ymd_opt(plan.season, 7, 4)
        .map(|date| {
            TEAMS
                .iter()
                .map(|t| Holiday {
                    date,
                    home_team: t.code.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    ReferenceData {
        divisions,
        park_capacities,
        rivalries,
        holidays,
        ticket_prices,
        weather,
        ..ReferenceData::default()
    }
}
