use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ShoeId = Uuid;

/// One recorded run attributed to a shoe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub miles: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    // older records were written before zones existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<f64>,
}
impl RunLogEntry {
    pub fn new(miles: f64, date: NaiveDate) -> Self {
        Self {
            miles,
            date,
            location: String::new(),
            zone: None,
        }
    }
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
    pub fn in_zone(mut self, zone: f64) -> Self {
        self.zone = Some(zone);
        self
    }
}

/// A tracked pair of shoes. `miles` is derived from `logs` and is only ever
/// changed by the run-log operations in `ledger.rs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shoe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShoeId>,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub first_run_date: NaiveDate,
    #[serde(default)]
    pub expected_lifecycle: Option<f64>,
    #[serde(default)]
    pub miles: f64,
    #[serde(default)]
    pub logs: Vec<RunLogEntry>,
}

/// User input for a new shoe, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoeDraft {
    pub brand: String,
    pub model: String,
    pub color: String,
    pub first_run_date: NaiveDate,
    pub expected_lifecycle: f64,
}

/// Partial document update handed to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<RunLogEntry>>,
}
impl ShoePatch {
    /// Patch carrying the mileage fields of `shoe`, which always travel together.
    pub fn mileage_of(shoe: &Shoe) -> Self {
        Self {
            miles: Some(shoe.miles),
            logs: Some(shoe.logs.clone()),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.miles.is_none() && self.logs.is_none()
    }
}
