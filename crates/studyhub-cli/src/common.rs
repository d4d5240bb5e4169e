//! Helpers shared by the command modules.

use chrono::NaiveDate;
use serde::Serialize;
use studyhub_core::{Config, Event, IntervalTicker, SqliteStore, StudyHub, SystemClock};

pub type Hub = StudyHub<SqliteStore, IntervalTicker, SystemClock>;

/// Open the hub over the on-disk store with the on-disk config.
pub fn open_hub() -> Result<Hub, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    Ok(StudyHub::open(store, IntervalTicker::new(), SystemClock, &config)?)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the event, or a note on stderr when the command changed nothing.
pub fn report(event: Option<Event>, noop: &str) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Some(event) => print_json(&event),
        None => {
            eprintln!("{noop}");
            Ok(())
        }
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got '{input}'"))
}

/// `YYYY-MM` to the first day of that month.
pub fn parse_month(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| format!("expected a month as YYYY-MM, got '{input}'"))
}
