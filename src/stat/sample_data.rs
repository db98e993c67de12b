use chrono::NaiveDate;

use super::datatype::{RunLogEntry, Shoe, ShoeDraft};
use super::error::LedgerError;
use super::ledger::Closet;

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, LedgerError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| LedgerError::invalid(format!("bad sample date {y}-{m}-{d}")))
}

fn draft(brand: &str, model: &str, color: &str, first: NaiveDate, lifecycle: f64) -> ShoeDraft {
    ShoeDraft {
        brand: brand.to_string(),
        model: model.to_string(),
        color: color.to_string(),
        first_run_date: first,
        expected_lifecycle: lifecycle,
    }
}

/// A small closet for the offline tracker.
pub fn sample_closet() -> Result<Closet, LedgerError> {
    let daily = Shoe::new(draft("Brooks", "Ghost 15", "Black", date(2025, 5, 3)?, 450.0))?
        .add_run(RunLogEntry::new(5.2, date(2025, 5, 3)?).at("Riverside loop"))?
        .add_run(RunLogEntry::new(8.0, date(2025, 5, 5)?).at("Canal path").in_zone(2.0))?
        .add_run(RunLogEntry::new(3.1, date(2025, 5, 4)?))?
        .add_run(RunLogEntry::new(13.1, date(2025, 5, 11)?).at("City half").in_zone(4.0))?;

    let tempo = Shoe::new(draft("Saucony", "Endorphin Speed 4", "Orange", date(2025, 6, 1)?, 300.0))?
        .add_run(RunLogEntry::new(6.0, date(2025, 6, 1)?).at("Track").in_zone(4.0))?
        .add_run(RunLogEntry::new(10.0, date(2025, 6, 8)?).in_zone(3.0))?;

    let retired = Shoe::new(draft("Hoka", "Clifton 8", "white/blue", date(2024, 2, 14)?, 400.0))?
        .add_run(RunLogEntry::new(220.0, date(2024, 6, 30)?).at("Spring block"))?
        .add_run(RunLogEntry::new(215.5, date(2024, 11, 2)?).at("Autumn block"))?;

    Ok(Closet::new(vec![daily, tempo, retired]))
}
