use std::collections::HashMap;

/// Running value per `(season, team)`. Never cleared.
#[derive(Debug, Clone, Default)]
pub struct SeasonCounter<V> {
    values: HashMap<(i32, String), V>,
}

impl<V: Copy + Default> SeasonCounter<V> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, season: i32, team: &str) -> V {
        self.values
            .get(&(season, team.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn entry(&mut self, season: i32, team: &str) -> &mut V {
        self.values.entry((season, team.to_string())).or_default()
    }

    pub fn set(&mut self, season: i32, team: &str, value: V) {
        self.values.insert((season, team.to_string()), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_do_not_share_values() {
        let mut counter = SeasonCounter::<u32>::new();
        *counter.entry(2016, "NYA") += 3;
        assert_eq!(counter.get(2016, "NYA"), 3);
        assert_eq!(counter.get(2017, "NYA"), 0);
        assert_eq!(counter.len(), 1);
    }
}
