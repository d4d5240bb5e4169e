//! Calendar events keyed by day, plus month navigation.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Study,
    Assignment,
    Exam,
    Personal,
    #[default]
    Other,
}

impl std::str::FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(EventKind::Study),
            "assignment" => Ok(EventKind::Assignment),
            "exam" => Ok(EventKind::Exam),
            "personal" => Ok(EventKind::Personal),
            "other" => Ok(EventKind::Other),
            other => Err(ValidationError::invalid(
                "kind",
                format!("unknown event kind '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub kind: EventKind,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

/// Fields of an event before it has an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub kind: EventKind,
    pub description: String,
}

/// Partial update; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub kind: Option<EventKind>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Calendar {
    events: BTreeMap<NaiveDate, Vec<CalendarEvent>>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Rejects a blank title.
    pub fn add_event(&mut self, date: NaiveDate, event: NewEvent) -> Result<String, ValidationError> {
        let title = event.title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".into()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.events.entry(date).or_default().push(CalendarEvent {
            id: id.clone(),
            title: title.to_string(),
            kind: event.kind,
            description: event.description,
            date,
            completed: false,
        });
        Ok(id)
    }

    /// Returns whether an event was updated. A blank title in the patch is
    /// ignored.
    pub fn update_event(&mut self, date: NaiveDate, id: &str, patch: EventPatch) -> bool {
        let Some(event) = self.find_mut(date, id) else {
            return false;
        };
        if let Some(title) = patch.title {
            let title = title.trim();
            if !title.is_empty() {
                event.title = title.to_string();
            }
        }
        if let Some(kind) = patch.kind {
            event.kind = kind;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(completed) = patch.completed {
            event.completed = completed;
        }
        true
    }

    pub fn delete_event(&mut self, date: NaiveDate, id: &str) -> Option<CalendarEvent> {
        let day = self.events.get_mut(&date)?;
        let idx = day.iter().position(|e| e.id == id)?;
        let removed = day.remove(idx);
        if day.is_empty() {
            self.events.remove(&date);
        }
        Some(removed)
    }

    /// Flip completion. Returns the new state.
    pub fn toggle_completion(&mut self, date: NaiveDate, id: &str) -> Option<bool> {
        let event = self.find_mut(date, id)?;
        event.completed = !event.completed;
        Some(event.completed)
    }

    pub fn set_completion(&mut self, date: NaiveDate, id: &str, completed: bool) -> bool {
        match self.find_mut(date, id) {
            Some(event) => {
                event.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn events_for(&self, date: NaiveDate) -> &[CalendarEvent] {
        self.events.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, date: NaiveDate, id: &str) -> Option<&CalendarEvent> {
        self.events_for(date).iter().find(|e| e.id == id)
    }

    /// All events in the given month, in date order.
    pub fn events_in_month(&self, month: NaiveDate) -> impl Iterator<Item = &CalendarEvent> + '_ {
        let first = first_of_month(month);
        let days = match first.checked_add_months(Months::new(1)) {
            Some(next) => self.events.range(first..next),
            None => self.events.range(first..),
        };
        days.flat_map(|(_, day)| day.iter())
    }

    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn find_mut(&mut self, date: NaiveDate, id: &str) -> Option<&mut CalendarEvent> {
        self.events.get_mut(&date)?.iter_mut().find(|e| e.id == id)
    }
}

/// Which month is shown and which day is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCursor {
    /// Always the first day of the month.
    pub current_month: NaiveDate,
    pub selected_date: NaiveDate,
}

impl MonthCursor {
    pub fn new(selected_date: NaiveDate) -> Self {
        Self {
            current_month: first_of_month(selected_date),
            selected_date,
        }
    }

    pub fn today(clock: &impl Clock) -> Self {
        Self::new(clock.now().date_naive())
    }

    /// No-op at the start of the supported date range.
    pub fn previous_month(&mut self) {
        if let Some(month) = self.current_month.checked_sub_months(Months::new(1)) {
            self.current_month = month;
        }
    }

    /// No-op at the end of the supported date range.
    pub fn next_month(&mut self) {
        if let Some(month) = self.current_month.checked_add_months(Months::new(1)) {
            self.current_month = month;
        }
    }

    pub fn go_to_today(&mut self, clock: &impl Clock) {
        *self = Self::today(clock);
    }

    pub fn select(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    /// Every date of the current month.
    pub fn days(&self) -> Vec<NaiveDate> {
        let month = self.current_month.month();
        self.current_month
            .iter_days()
            .take_while(|d| d.month() == month)
            .collect()
    }

    /// Days before the 1st in a Sunday-first week row.
    pub fn leading_blanks(&self) -> u32 {
        self.current_month.weekday().num_days_from_sunday()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
