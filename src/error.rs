use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("missing {table} reference for {key}")]
    MissingReference { table: &'static str, key: String },

    #[error("insufficient sample: {what}")]
    InsufficientSample { what: String },

    #[error("record {index} dated {date} comes after {previous}; records must be date-ascending")]
    OutOfOrder {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("record {index}: `{field}` for {team} must be derived before the {pass} pass")]
    MissingDerived {
        index: usize,
        field: &'static str,
        team: String,
        pass: &'static str,
    },
}

impl FeatureError {
    pub fn missing_reference(table: &'static str, key: impl Into<String>) -> Self {
        Self::MissingReference {
            table,
            key: key.into(),
        }
    }

    pub fn missing_derived(index: usize, field: &'static str, team: &str, pass: &'static str) -> Self {
        Self::MissingDerived {
            index,
            field,
            team: team.to_string(),
            pass,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
