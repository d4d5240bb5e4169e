use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every accepted command produces an Event.
/// The presentation layer renders from them; `TimerWarning` and
/// `TransitionPending` are the notification side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u32,
        /// Minutes credited to the selected goal by this pause.
        attributed_minutes: f64,
        at: DateTime<Utc>,
    },
    /// Countdown crossed the warn threshold. Fired once per crossing.
    TimerWarning {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Countdown hit zero; waiting for the user to confirm the phase switch.
    TransitionPending {
        phase: Phase,
        attributed_minutes: f64,
        at: DateTime<Utc>,
    },
    TransitionConfirmed {
        from: Phase,
        to: Phase,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    RoundReset {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    DurationUpdated {
        phase: Phase,
        minutes: u32,
        at: DateTime<Utc>,
    },
    GoalAdded {
        goal_id: String,
        name: String,
        at: DateTime<Utc>,
    },
    GoalDeleted {
        goal_id: String,
        was_selected: bool,
        at: DateTime<Utc>,
    },
    GoalSelected {
        goal_id: Option<String>,
        /// Minutes credited to the previous selection when switching mid-span.
        attributed_minutes: f64,
        at: DateTime<Utc>,
    },
    TaskAdded {
        task_id: String,
        linked_event_id: Option<String>,
        at: DateTime<Utc>,
    },
    TaskToggled {
        task_id: String,
        completed: bool,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: String,
        at: DateTime<Utc>,
    },
    CompletedTasksCleared {
        removed: usize,
        at: DateTime<Utc>,
    },
    CalendarEventAdded {
        date: NaiveDate,
        event_id: String,
        at: DateTime<Utc>,
    },
    CalendarEventUpdated {
        date: NaiveDate,
        event_id: String,
        at: DateTime<Utc>,
    },
    CalendarEventDeleted {
        date: NaiveDate,
        event_id: String,
        at: DateTime<Utc>,
    },
    CalendarEventToggled {
        date: NaiveDate,
        event_id: String,
        completed: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the events a UI or audio layer should surface as a cue.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Event::TimerWarning { .. } | Event::TransitionPending { .. }
        )
    }
}
