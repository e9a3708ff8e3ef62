use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    pub mean: f64,
    pub std: f64,
}

impl PopulationStats {
    // Empty population: zero mean and spread.
    pub fn of(population: &[f64]) -> Self {
        if population.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        let n = population.len() as f64;
        let mean = population.iter().sum::<f64>() / n;
        let variance = population.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
        }
    }

    pub fn z_score(&self, value: f64) -> f64 {
        if self.std > 0.0 {
            (value - self.mean) / self.std
        } else {
            0.0
        }
    }
}

pub fn normalize(population: &[f64], value: Option<f64>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    PopulationStats::of(population).z_score(value)
}

/// The first population seen for a key is kept for the life of the cache.
#[derive(Debug, Clone)]
pub struct NormCache<K> {
    entries: HashMap<K, PopulationStats>,
}

impl<K: Eq + Hash> Default for NormCache<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> NormCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, key: K, population: &[f64], value: Option<f64>) -> f64 {
        let Some(value) = value else {
            return 0.0;
        };
        self.entries
            .entry(key)
            .or_insert_with(|| PopulationStats::of(population))
            .z_score(value)
    }

    pub fn stats(&self, key: &K) -> Option<PopulationStats> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn max_and_mean(values: &[f64]) -> Option<(f64, f64)> {
    let avg = mean(values)?;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((max, avg))
}
