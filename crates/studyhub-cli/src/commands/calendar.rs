//! Calendar commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;
use studyhub_core::{CalendarEvent, Command, EventKind, EventPatch, MonthCursor, NewEvent, SystemClock, Task};

use crate::common::{open_hub, parse_date, parse_month, print_json, report};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Add an event on a day
    Add {
        /// Day, YYYY-MM-DD
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Event title
        title: String,
        /// study, assignment, exam, personal or other
        #[arg(long, default_value = "other")]
        kind: EventKind,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change fields of an event
    Update {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Event ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        kind: Option<EventKind>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Events and due tasks for one day
    Day {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Month overview, YYYY-MM (default: this month)
    Month {
        #[arg(value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Flip an event between done and not done
    Toggle {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Event ID
        id: String,
    },
    /// Delete an event
    Delete {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Event ID
        id: String,
    },
}

#[derive(Serialize)]
struct DayView<'a> {
    date: NaiveDate,
    events: &'a [CalendarEvent],
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct MonthView<'a> {
    month: String,
    leading_blanks: u32,
    days: usize,
    events: Vec<&'a CalendarEvent>,
}

pub fn run(action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut hub = open_hub()?;

    match action {
        CalendarAction::Add {
            date,
            title,
            kind,
            description,
        } => {
            let event = hub.apply(Command::AddEvent {
                date,
                event: NewEvent {
                    title,
                    kind,
                    description,
                },
            })?;
            report(event, "event not added")?;
        }
        CalendarAction::Update {
            date,
            id,
            title,
            kind,
            description,
            completed,
        } => {
            if hub.calendar().get(date, &id).is_none() {
                return Err(format!("no event with id {id} on {date}").into());
            }
            let patch = EventPatch {
                title,
                kind,
                description,
                completed,
            };
            report(
                hub.apply(Command::UpdateEvent {
                    date,
                    event_id: id,
                    patch,
                })?,
                "event unchanged",
            )?;
        }
        CalendarAction::Day { date } => {
            print_json(&DayView {
                date,
                events: hub.calendar().events_for(date),
                tasks: hub.todo().tasks_for(date).collect(),
            })?;
        }
        CalendarAction::Month { month } => {
            let cursor = match month {
                Some(first) => MonthCursor::new(first),
                None => MonthCursor::today(&SystemClock),
            };
            print_json(&MonthView {
                month: cursor.current_month.format("%Y-%m").to_string(),
                leading_blanks: cursor.leading_blanks(),
                days: cursor.days().len(),
                events: hub.calendar().events_in_month(cursor.current_month).collect(),
            })?;
        }
        CalendarAction::Toggle { date, id } => {
            if hub.calendar().get(date, &id).is_none() {
                return Err(format!("no event with id {id} on {date}").into());
            }
            report(
                hub.apply(Command::ToggleEvent { date, event_id: id })?,
                "event unchanged",
            )?;
        }
        CalendarAction::Delete { date, id } => {
            if hub.calendar().get(date, &id).is_none() {
                return Err(format!("no event with id {id} on {date}").into());
            }
            report(
                hub.apply(Command::DeleteEvent { date, event_id: id })?,
                "event not deleted",
            )?;
        }
    }
    Ok(())
}
