use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FeatureError, Result};
use crate::normalize::NormCache;
use crate::record::GameRecord;

/// Average regular-game ticket price for a team in a season (nominal USD).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPrice {
    pub season: i32,
    pub team: String,
    pub price: f64,
}

/// Home team's ticket price z-scored against every team's price that season.
#[derive(Debug, Clone, Default)]
pub struct TicketPriceNormalizer {
    prices: HashMap<(i32, String), f64>,
    by_season: HashMap<i32, Vec<f64>>,
}

impl TicketPriceNormalizer {
    pub fn from_prices(prices: &[TicketPrice]) -> Self {
        let mut out = Self::default();
        for p in prices {
            out.prices.insert((p.season, p.team.clone()), p.price);
            out.by_season.entry(p.season).or_default().push(p.price);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn apply(&self, records: &mut [GameRecord]) -> Result<()> {
        let mut cache = NormCache::new();
        for r in records.iter_mut() {
            let Some(price) = self.prices.get(&(r.season, r.home.team.clone())).copied() else {
                return Err(FeatureError::missing_reference(
                    "ticket price",
                    format!("{} {}", r.season, r.home.team),
                ));
            };
            let population = self
                .by_season
                .get(&r.season)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            r.features.avg_ticket_price_normalized =
                Some(cache.normalize(r.season, population, Some(price)));
        }
        info!(records = records.len(), seasons = cache.len(), "ticket prices normalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::record::TeamLine;

    #[test]
    fn normalizes_within_season() {
        let prices = vec![
            TicketPrice { season: 2017, team: "NYA".into(), price: 50.0 },
            TicketPrice { season: 2017, team: "BOS".into(), price: 30.0 },
            TicketPrice { season: 2017, team: "TBA".into(), price: 10.0 },
            TicketPrice { season: 2016, team: "NYA".into(), price: 10.0 },
            TicketPrice { season: 2016, team: "BOS".into(), price: 10.0 },
        ];
        let normalizer = TicketPriceNormalizer::from_prices(&prices);
        let d17 = NaiveDate::from_ymd_opt(2017, 5, 1).expect("valid date");
        let d16 = NaiveDate::from_ymd_opt(2016, 5, 1).expect("valid date");
        let mut records = vec![
            GameRecord::new(2016, d16, TeamLine::new("NYA", 1, 1), TeamLine::new("BOS", 0, 1)),
            GameRecord::new(2017, d17, TeamLine::new("BOS", 1, 1), TeamLine::new("NYA", 0, 1)),
            GameRecord::new(2017, d17, TeamLine::new("NYA", 1, 2), TeamLine::new("BOS", 0, 2)),
        ];
        normalizer.apply(&mut records).expect("prices");
        assert_eq!(records[0].features.avg_ticket_price_normalized, Some(0.0));
        assert_eq!(records[1].features.avg_ticket_price_normalized, Some(0.0));
        let nya = records[2].features.avg_ticket_price_normalized.expect("set");
        assert!((nya - 20.0 / (800.0_f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn missing_price_is_an_error() {
        let normalizer = TicketPriceNormalizer::from_prices(&[]);
        let date = NaiveDate::from_ymd_opt(2017, 5, 1).expect("valid date");
        let mut records = vec![GameRecord::new(
            2017,
            date,
            TeamLine::new("NYA", 1, 1),
            TeamLine::new("BOS", 0, 1),
        )];
        assert!(normalizer.apply(&mut records).is_err());
    }
}
