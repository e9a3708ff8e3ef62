use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FeatureError, Result};
use crate::normalize::mean;
use crate::record::GameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sky {
    #[serde(rename = "in dome")]
    InDome,
    Night,
    Sunny,
    Cloudy,
    Overcast,
}

impl Sky {
    fn score(self) -> f64 {
        match self {
            Sky::InDome | Sky::Night | Sky::Sunny => 0.0,
            Sky::Cloudy | Sky::Overcast => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precipitation {
    #[serde(rename = "no precipitation")]
    NoPrecipitation,
    Drizzle,
    Showers,
    Rain,
    Snow,
}

impl Precipitation {
    fn score(self) -> f64 {
        match self {
            Precipitation::NoPrecipitation => 0.0,
            Precipitation::Drizzle => 3.0,
            Precipitation::Showers => 4.0,
            Precipitation::Rain => 5.0,
            Precipitation::Snow => 7.0,
        }
    }
}

/// 0 is ideal (clear sky or a dome), higher is worse; 7 is snow.
/// Precipitation outranks the sky reading whenever there was any.
pub fn condition_score(sky: Option<Sky>, precipitation: Option<Precipitation>) -> Option<f64> {
    if sky == Some(Sky::InDome) {
        return Some(0.0);
    }
    if let Some(p) = precipitation
        && p.score() > 0.0
    {
        return Some(p.score());
    }
    sky.map(Sky::score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherMetric {
    Temp,
    Wind,
    ConditionScore,
}

impl WeatherMetric {
    pub const ALL: [WeatherMetric; 3] = [
        WeatherMetric::Temp,
        WeatherMetric::Wind,
        WeatherMetric::ConditionScore,
    ];
}

/// Game-time reading at the home park. Missing values stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub home_team: String,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub sky: Option<Sky>,
    #[serde(default)]
    pub precipitation: Option<Precipitation>,
}

/// Value assumed at a domed park when the reading is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomeDefault {
    pub park_id: String,
    pub metric: WeatherMetric,
    pub value: f64,
}

static DOME_DEFAULTS: Lazy<Vec<DomeDefault>> = Lazy::new(|| {
    let wind = ["MIA02", "STP01"];
    let condition = [
        "PHO01", "HOU02", "HOU03", "MIA02", "MON02", "SEA02", "SEA03", "TOR02", "STP01", "MIN04",
    ];
    wind.iter()
        .map(|park| (park, WeatherMetric::Wind))
        .chain(condition.iter().map(|park| (park, WeatherMetric::ConditionScore)))
        .map(|(park, metric)| DomeDefault {
            park_id: park.to_string(),
            metric,
            value: 0.0,
        })
        .collect()
});

pub fn builtin_dome_defaults() -> Vec<DomeDefault> {
    DOME_DEFAULTS.clone()
}

/// Games in March and October are rare; fold them into the adjacent month.
pub fn climate_month(date: NaiveDate) -> u32 {
    match date.month() {
        3 => 4,
        10 => 9,
        m => m,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Reading {
    temp: Option<f64>,
    wind: Option<f64>,
    condition_score: Option<f64>,
}

impl Reading {
    fn get(&self, metric: WeatherMetric) -> Option<f64> {
        match metric {
            WeatherMetric::Temp => self.temp,
            WeatherMetric::Wind => self.wind,
            WeatherMetric::ConditionScore => self.condition_score,
        }
    }
}

/// Smallest (team, month) sample trusted over the league-wide mean.
const MIN_LOCAL_SAMPLES: usize = 5;

/// Fills temperature, wind and condition score for each game, falling back
/// from the reading to a dome default, then to the home team's monthly mean,
/// then to the overall mean.
#[derive(Debug, Clone, Default)]
pub struct WeatherModel {
    readings: HashMap<(NaiveDate, String), Reading>,
    local: HashMap<(WeatherMetric, u32, String), Vec<f64>>,
    overall: HashMap<WeatherMetric, Vec<f64>>,
    dome: HashMap<(String, WeatherMetric), f64>,
}

impl WeatherModel {
    pub fn new(observations: &[WeatherObservation], dome_defaults: &[DomeDefault]) -> Self {
        let mut model = Self {
            dome: dome_defaults
                .iter()
                .map(|d| ((d.park_id.clone(), d.metric), d.value))
                .collect(),
            ..Self::default()
        };
        for obs in observations {
            let reading = Reading {
                temp: obs.temp,
                wind: obs.wind_speed,
                condition_score: condition_score(obs.sky, obs.precipitation),
            };
            let month = climate_month(obs.date);
            for metric in WeatherMetric::ALL {
                let Some(v) = reading.get(metric) else { continue };
                model
                    .local
                    .entry((metric, month, obs.home_team.clone()))
                    .or_default()
                    .push(v);
                model.overall.entry(metric).or_default().push(v);
            }
            model
                .readings
                .insert((obs.date, obs.home_team.clone()), reading);
        }
        model
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn resolve(
        &self,
        metric: WeatherMetric,
        date: NaiveDate,
        home_team: &str,
        park_id: &str,
    ) -> Result<f64> {
        let Some(reading) = self.readings.get(&(date, home_team.to_string())) else {
            return Err(FeatureError::missing_reference(
                "weather",
                format!("{date} {home_team}"),
            ));
        };
        if let Some(v) = reading.get(metric) {
            return Ok(v);
        }
        if let Some(v) = self.dome.get(&(park_id.to_string(), metric)) {
            return Ok(*v);
        }
        let local = self
            .local
            .get(&(metric, climate_month(date), home_team.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if local.len() >= MIN_LOCAL_SAMPLES
            && let Some(m) = mean(local)
        {
            return Ok(m);
        }
        self.overall
            .get(&metric)
            .and_then(|values| mean(values))
            .ok_or_else(|| FeatureError::InsufficientSample {
                what: format!("no {metric:?} readings to fall back on"),
            })
    }

    pub fn apply(&self, records: &mut [GameRecord]) -> Result<()> {
        for r in records.iter_mut() {
            let temp = self.resolve(WeatherMetric::Temp, r.date, &r.home.team, &r.park_id)?;
            let wind = self.resolve(WeatherMetric::Wind, r.date, &r.home.team, &r.park_id)?;
            let condition =
                self.resolve(WeatherMetric::ConditionScore, r.date, &r.home.team, &r.park_id)?;
            r.features.temp = Some(temp);
            r.features.wind = Some(wind);
            r.features.condition_score = Some(condition);
        }
        info!(records = records.len(), "weather attached");
        Ok(())
    }
}
