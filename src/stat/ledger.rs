use super::datatype::*;
use super::display::ColorKey;
use super::error::LedgerError;
use serde::{Deserialize, Serialize};

/// Largest gap tolerated between a stored `miles` and the re-summed log.
pub const MILES_TOLERANCE: f64 = 1e-9;

fn sum_logs(logs: &[RunLogEntry]) -> f64 {
    logs.iter().fold(0.0, |acc, i| acc + i.miles)
}

fn check_miles(miles: f64) -> Result<(), LedgerError> {
    if !miles.is_finite() || miles <= 0.0 {
        return Err(LedgerError::invalid(format!(
            "miles must be a positive number, got {miles}"
        )));
    }
    Ok(())
}

fn check_lifecycle(lifecycle: f64) -> Result<(), LedgerError> {
    if !lifecycle.is_finite() || lifecycle <= 0.0 {
        return Err(LedgerError::invalid(format!(
            "expected lifecycle must be a positive number, got {lifecycle}"
        )));
    }
    Ok(())
}

pub fn check_entry(entry: &RunLogEntry) -> Result<(), LedgerError> {
    check_miles(entry.miles)?;
    if let Some(zone) = entry.zone {
        if !zone.is_finite() || zone <= 0.0 {
            return Err(LedgerError::invalid(format!(
                "zone must be a positive number, got {zone}"
            )));
        }
    }
    Ok(())
}

impl Shoe {
    pub fn new(draft: ShoeDraft) -> Result<Shoe, LedgerError> {
        for (field, value) in [
            ("brand", &draft.brand),
            ("model", &draft.model),
            ("color", &draft.color),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::invalid(format!("{field} is required")));
            }
        }
        check_lifecycle(draft.expected_lifecycle)?;
        Ok(Shoe {
            id: None,
            brand: draft.brand.trim().to_string(),
            model: draft.model.trim().to_string(),
            color: draft.color.trim().to_string(),
            first_run_date: draft.first_run_date,
            expected_lifecycle: Some(draft.expected_lifecycle),
            miles: 0.0,
            logs: Vec::new(),
        })
    }

    /// Mileage recomputed from the run log.
    pub fn logged_miles(&self) -> f64 {
        sum_logs(&self.logs)
    }

    fn with_logs(&self, logs: Vec<RunLogEntry>) -> Shoe {
        Shoe {
            miles: sum_logs(&logs),
            logs,
            ..self.clone()
        }
    }

    fn check_index(&self, index: usize) -> Result<(), LedgerError> {
        if index >= self.logs.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.logs.len(),
            });
        }
        Ok(())
    }

    /// Appends `entry` to the log. `self` is left untouched.
    pub fn add_run(&self, entry: RunLogEntry) -> Result<Shoe, LedgerError> {
        check_entry(&entry)?;
        let mut logs = self.logs.clone();
        logs.push(entry);
        Ok(self.with_logs(logs))
    }

    /// Replaces the entry at `index`; the log keeps its length and order.
    pub fn edit_run(&self, index: usize, entry: RunLogEntry) -> Result<Shoe, LedgerError> {
        self.check_index(index)?;
        check_entry(&entry)?;
        let mut logs = self.logs.clone();
        logs[index] = entry;
        Ok(self.with_logs(logs))
    }

    pub fn delete_run(&self, index: usize) -> Result<Shoe, LedgerError> {
        self.check_index(index)?;
        let mut logs = self.logs.clone();
        logs.remove(index);
        Ok(self.with_logs(logs))
    }

    /// `100 - miles / lifecycle * 100`, clamped to `[0, 100]`.
    pub fn life_remaining_percent(&self) -> Result<f64, LedgerError> {
        let lifecycle = match self.expected_lifecycle {
            Some(l) if l.is_finite() && l > 0.0 => l,
            other => return Err(LedgerError::DivisionUndefined(other)),
        };
        let used = (self.miles / lifecycle) * 100.0;
        Ok((100.0 - used).clamp(0.0, 100.0))
    }

    /// Validates a whole record as it would be persisted.
    pub fn check_record(&self) -> Result<(), LedgerError> {
        if let Some(lifecycle) = self.expected_lifecycle {
            check_lifecycle(lifecycle)?;
        }
        for entry in &self.logs {
            check_entry(entry)?;
        }
        let logged = self.logged_miles();
        if !self.miles.is_finite() || (self.miles - logged).abs() > MILES_TOLERANCE {
            return Err(LedgerError::invalid(format!(
                "miles {} does not match logged total {logged}",
                self.miles
            )));
        }
        Ok(())
    }

    pub fn color_key(&self) -> ColorKey {
        ColorKey::from_name(&self.color)
    }
}

/// New position of a selection after the item at `deleted` is removed.
pub fn reindex_selection(deleted: usize, selection: Option<usize>) -> Option<usize> {
    match selection {
        Some(s) if s == deleted => None,
        Some(s) if deleted < s => Some(s - 1),
        other => other,
    }
}

/// Ordered collection of a user's shoes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Closet {
    pub shoes: Vec<Shoe>,
}
#[derive(Debug, Clone)]
pub struct ShoeSummary {
    pub index: usize,
    pub brand: String,
    pub model: String,
    pub color: ColorKey,
    pub first_run_date: String,
    pub miles: f64,
    pub runs: usize,
    pub life_remaining: Option<f64>,
}
impl Closet {
    pub fn new(shoes: Vec<Shoe>) -> Self {
        Self { shoes }
    }
    pub fn len(&self) -> usize {
        self.shoes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.shoes.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&Shoe> {
        self.shoes.get(index)
    }

    /// Returns the grown closet and the index of the new shoe.
    pub fn push(&self, shoe: Shoe) -> (Closet, usize) {
        let mut shoes = self.shoes.clone();
        shoes.push(shoe);
        let index = shoes.len() - 1;
        (Closet { shoes }, index)
    }

    pub fn replace(&self, index: usize, shoe: Shoe) -> Result<Closet, LedgerError> {
        if index >= self.shoes.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.shoes.len(),
            });
        }
        let mut shoes = self.shoes.clone();
        shoes[index] = shoe;
        Ok(Closet { shoes })
    }

    /// Removes the shoe at `index` together with its log and reindexes
    /// `selection` so it keeps pointing at the same shoe, or at nothing.
    pub fn delete_shoe(
        &self,
        index: usize,
        selection: Option<usize>,
    ) -> Result<(Closet, Option<usize>), LedgerError> {
        if index >= self.shoes.len() {
            return Err(LedgerError::IndexOutOfRange {
                index,
                len: self.shoes.len(),
            });
        }
        let mut shoes = self.shoes.clone();
        shoes.remove(index);
        Ok((Closet { shoes }, reindex_selection(index, selection)))
    }

    pub fn total_miles(&self) -> f64 {
        self.shoes.iter().fold(0.0, |acc, i| acc + i.miles)
    }

    pub fn summary(&self) -> Vec<ShoeSummary> {
        self.shoes
            .iter()
            .enumerate()
            .map(|(index, i)| ShoeSummary {
                index,
                brand: i.brand.clone(),
                model: i.model.clone(),
                color: i.color_key(),
                first_run_date: super::display::display_date(i.first_run_date),
                miles: i.miles,
                runs: i.logs.len(),
                life_remaining: i.life_remaining_percent().ok(),
            })
            .collect()
    }
}
