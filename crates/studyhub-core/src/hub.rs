//! The Study Hub facade: one explicitly constructed owner for the session
//! engine, the to-do list and the calendar.
//!
//! Callers send [`Command`]s through `apply` and render from `view()`.
//! Every accepted command is followed by a write of all blobs to the
//! [`Store`]. Write failures are logged and otherwise ignored: the in-memory
//! state stays authoritative.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::{Calendar, EventPatch, NewEvent};
use crate::clock::{Clock, TickSource};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::rewards::RewardSummary;
use crate::storage::{Config, RewardsConfig, Store, CALENDAR_KEY, TASKS_KEY, TIMER_KEY};
use crate::timer::{EngineSnapshot, SessionEngine, TimerView};
use crate::todo::{Task, TodoList};

/// Everything the presentation layer can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    ResetRound,
    FullReset,
    ConfirmTransition,
    Tick,
    SetStudyMinutes(i64),
    SetBreakMinutes(i64),
    SelectGoal(Option<String>),
    AddGoal {
        name: String,
        target_hours: f64,
    },
    DeleteGoal(String),
    AddTask {
        title: String,
        category: Option<String>,
        due_date: Option<NaiveDate>,
    },
    ToggleTask(String),
    DeleteTask(String),
    ClearCompletedTasks,
    AddEvent {
        date: NaiveDate,
        event: NewEvent,
    },
    UpdateEvent {
        date: NaiveDate,
        event_id: String,
        patch: EventPatch,
    },
    DeleteEvent {
        date: NaiveDate,
        event_id: String,
    },
    ToggleEvent {
        date: NaiveDate,
        event_id: String,
    },
}

/// Read model for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubView {
    pub timer: TimerView,
    pub tasks: Vec<Task>,
    pub rewards: RewardSummary,
}

pub struct StudyHub<S, T, C> {
    store: S,
    engine: SessionEngine<T, C>,
    todo: TodoList,
    calendar: Calendar,
    rewards: RewardsConfig,
}

impl<S: Store, T: TickSource, C: Clock> StudyHub<S, T, C> {
    /// Load persisted state from `store`.
    ///
    /// Missing blobs start empty; blobs that fail to parse are logged and
    /// replaced by empty state. Timer lengths and the warn threshold always
    /// come from `config` (the threshold is zero when notifications are
    /// disabled). A restored countdown is refilled only if it is stopped in
    /// a phase whose length changed.
    ///
    /// # Errors
    /// Returns an error only if the store itself cannot be read.
    pub fn open(store: S, ticker: T, clock: C, config: &Config) -> Result<Self> {
        let warn_threshold = if config.notifications.enabled {
            config.timer.warn_threshold_secs
        } else {
            0
        };

        let durations = config.timer_config();
        let mut engine = match decode::<EngineSnapshot>(TIMER_KEY, store.load(TIMER_KEY)?) {
            Some(snapshot) => {
                info!(goals = snapshot.goals.len(), "restoring persisted session");
                SessionEngine::restore(snapshot, ticker, clock)
            }
            None => SessionEngine::new(durations, ticker, clock),
        }
        .with_warn_threshold(warn_threshold);

        // config.toml owns the durations; the snapshot copy follows it.
        if engine.config() != durations {
            info!(
                study_minutes = durations.study_minutes(),
                break_minutes = durations.break_minutes(),
                "applying timer lengths from config"
            );
            engine.set_study_minutes(i64::from(durations.study_minutes()));
            engine.set_break_minutes(i64::from(durations.break_minutes()));
        }

        let todo = decode(TASKS_KEY, store.load(TASKS_KEY)?).unwrap_or_default();
        let calendar = decode(CALENDAR_KEY, store.load(CALENDAR_KEY)?).unwrap_or_default();

        Ok(Self {
            store,
            engine,
            todo,
            calendar,
            rewards: config.rewards.clone(),
        })
    }

    pub fn engine(&self) -> &SessionEngine<T, C> {
        &self.engine
    }

    pub fn todo(&self) -> &TodoList {
        &self.todo
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The tick source, for awaiting the next tick.
    pub fn ticker_mut(&mut self) -> &mut T {
        self.engine.ticker_mut()
    }

    pub fn rewards(&self) -> RewardSummary {
        RewardSummary::compute(self.todo.tasks(), self.engine.goals(), &self.rewards)
    }

    pub fn view(&self) -> HubView {
        HubView {
            timer: self.engine.view(),
            tasks: self.todo.tasks().to_vec(),
            rewards: self.rewards(),
        }
    }

    /// Apply one command.
    ///
    /// `Ok(None)` means the command was a no-op (precondition not met,
    /// unknown id, rejected duration). `Err` is only returned for creations
    /// with invalid input, so the caller can show why.
    ///
    /// # Errors
    /// Returns a validation error for a blank goal/task/event title or a
    /// non-positive goal target.
    pub fn apply(&mut self, command: Command) -> Result<Option<Event>, ValidationError> {
        let is_tick = command == Command::Tick;
        let event = self.dispatch(command)?;
        if event.is_some() || is_tick {
            self.persist();
        }
        Ok(event)
    }

    fn dispatch(&mut self, command: Command) -> Result<Option<Event>, ValidationError> {
        let at = self.engine.clock().now();
        let event = match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::ResetRound => self.engine.reset_round(),
            Command::FullReset => self.engine.full_reset(),
            Command::ConfirmTransition => self.engine.confirm_transition(),
            Command::Tick => self.engine.tick(),
            Command::SetStudyMinutes(minutes) => self.engine.set_study_minutes(minutes),
            Command::SetBreakMinutes(minutes) => self.engine.set_break_minutes(minutes),
            Command::SelectGoal(goal_id) => self.engine.select_goal(goal_id.as_deref()),
            Command::AddGoal { name, target_hours } => Some(self.engine.add_goal(&name, target_hours)?),
            Command::DeleteGoal(goal_id) => self.engine.delete_goal(&goal_id),
            Command::AddTask {
                title,
                category,
                due_date,
            } => {
                let task = self
                    .todo
                    .add(&title, category.as_deref(), due_date, at, &mut self.calendar)?;
                Some(Event::TaskAdded {
                    task_id: task.id.clone(),
                    linked_event_id: task.linked_event_id.clone(),
                    at,
                })
            }
            Command::ToggleTask(task_id) => self
                .todo
                .toggle(&task_id, &mut self.calendar)
                .map(|completed| Event::TaskToggled {
                    task_id,
                    completed,
                    at,
                }),
            Command::DeleteTask(task_id) => self
                .todo
                .delete(&task_id, &mut self.calendar)
                .map(|task| Event::TaskDeleted {
                    task_id: task.id,
                    at,
                }),
            Command::ClearCompletedTasks => match self.todo.clear_completed() {
                0 => None,
                removed => Some(Event::CompletedTasksCleared { removed, at }),
            },
            Command::AddEvent { date, event } => {
                let event_id = self.calendar.add_event(date, event)?;
                Some(Event::CalendarEventAdded { date, event_id, at })
            }
            Command::UpdateEvent {
                date,
                event_id,
                patch,
            } => self
                .calendar
                .update_event(date, &event_id, patch)
                .then(|| Event::CalendarEventUpdated { date, event_id, at }),
            Command::DeleteEvent { date, event_id } => self
                .calendar
                .delete_event(date, &event_id)
                .map(|_| Event::CalendarEventDeleted { date, event_id, at }),
            Command::ToggleEvent { date, event_id } => self
                .calendar
                .toggle_completion(date, &event_id)
                .map(|completed| Event::CalendarEventToggled {
                    date,
                    event_id,
                    completed,
                    at,
                }),
        };
        Ok(event)
    }

    /// Write every blob. Failures are logged, never returned.
    pub fn persist(&self) {
        self.save_blob(TIMER_KEY, &self.engine.snapshot());
        self.save_blob(TASKS_KEY, &self.todo);
        self.save_blob(CALENDAR_KEY, &self.calendar);
    }

    fn save_blob<V: Serialize>(&self, key: &str, value: &V) {
        let blob = match serde_json::to_string(value) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize state");
                return;
            }
        };
        if let Err(e) = self.store.save(key, &blob) {
            warn!(key, error = %e, "failed to persist state");
        } else {
            debug!(key, bytes = blob.len(), "state persisted");
        }
    }
}

fn decode<V: for<'de> Deserialize<'de>>(key: &str, blob: Option<String>) -> Option<V> {
    let blob = blob?;
    match serde_json::from_str(&blob) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable persisted state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualTicker, SystemClock};
    use crate::error::CoreError;
    use crate::storage::MemoryStore;
    use crate::timer::{Phase, TimerStatus};

    type Hub<'a> = StudyHub<&'a MemoryStore, ManualTicker, SystemClock>;

    fn open(store: &MemoryStore) -> Hub<'_> {
        StudyHub::open(store, ManualTicker::new(), SystemClock, &Config::default()).unwrap()
    }

    fn add_goal(hub: &mut Hub<'_>, name: &str, hours: f64) -> String {
        match hub
            .apply(Command::AddGoal {
                name: name.into(),
                target_hours: hours,
            })
            .unwrap()
        {
            Some(Event::GoalAdded { goal_id, .. }) => goal_id,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fresh_hub_uses_config_durations() {
        let store = MemoryStore::new();
        let mut config = Config::default();
        config.timer.study_minutes = 50;
        let hub: Hub<'_> = StudyHub::open(&store, ManualTicker::new(), SystemClock, &config).unwrap();
        assert_eq!(hub.engine().remaining_secs(), 3000);
        assert!(store.is_empty());
    }

    #[test]
    fn goals_and_timer_survive_reopen() {
        let store = MemoryStore::new();
        let goal_id = {
            let mut hub = open(&store);
            let goal_id = add_goal(&mut hub, "Math", 2.0);
            hub.apply(Command::SelectGoal(Some(goal_id.clone()))).unwrap();
            hub.apply(Command::Start).unwrap();
            for _ in 0..120 {
                hub.apply(Command::Tick).unwrap();
            }
            hub.apply(Command::Pause).unwrap();
            goal_id
        };

        let hub = open(&store);
        let goal = hub.engine().ledger().get(&goal_id).unwrap();
        assert!((goal.completed_minutes - 2.0).abs() < 1e-9);
        assert_eq!(hub.engine().remaining_secs(), 1380);
        assert_eq!(hub.engine().selected_goal(), Some(goal_id.as_str()));
    }

    #[test]
    fn changed_config_durations_apply_after_reopen() {
        let store = MemoryStore::new();
        {
            let mut hub = open(&store);
            add_goal(&mut hub, "Math", 1.0);
        }
        assert!(store.load(TIMER_KEY).unwrap().is_some());

        let mut config = Config::default();
        config.timer.study_minutes = 50;
        config.timer.break_minutes = 10;
        let hub: Hub<'_> = StudyHub::open(&store, ManualTicker::new(), SystemClock, &config).unwrap();
        assert_eq!(hub.engine().config().study_minutes(), 50);
        assert_eq!(hub.engine().config().break_minutes(), 10);
        assert_eq!(hub.engine().remaining_secs(), 3000);
        assert_eq!(hub.engine().goals().len(), 1);
    }

    #[test]
    fn unchanged_config_keeps_paused_countdown() {
        let store = MemoryStore::new();
        {
            let mut hub = open(&store);
            hub.apply(Command::Start).unwrap();
            for _ in 0..30 {
                hub.apply(Command::Tick).unwrap();
            }
            hub.apply(Command::Pause).unwrap();
        }
        let hub = open(&store);
        assert_eq!(hub.engine().remaining_secs(), 1470);
    }

    #[test]
    fn reopening_mid_run_credits_ticks_already_persisted() {
        let store = MemoryStore::new();
        let goal_id = {
            let mut hub = open(&store);
            let goal_id = add_goal(&mut hub, "Math", 2.0);
            hub.apply(Command::SelectGoal(Some(goal_id.clone()))).unwrap();
            hub.apply(Command::Start).unwrap();
            for _ in 0..60 {
                hub.apply(Command::Tick).unwrap();
            }
            goal_id
        };

        let hub = open(&store);
        assert_eq!(hub.engine().status(), TimerStatus::Stopped);
        let goal = hub.engine().ledger().get(&goal_id).unwrap();
        assert!((goal.completed_minutes - 1.0).abs() < 1e-9);
    }

    #[test]
    fn corrupt_blob_falls_back_to_empty_state() {
        let store = MemoryStore::new();
        store.save(TIMER_KEY, "{not json").unwrap();
        store.save(TASKS_KEY, "[]").unwrap();
        let hub = open(&store);
        assert_eq!(hub.engine().phase(), Phase::Study);
        assert!(hub.engine().goals().is_empty());
    }

    #[test]
    fn invalid_creations_return_validation_errors() {
        let store = MemoryStore::new();
        let mut hub = open(&store);
        assert!(hub
            .apply(Command::AddGoal {
                name: "  ".into(),
                target_hours: 1.0
            })
            .is_err());
        assert!(hub
            .apply(Command::AddTask {
                title: String::new(),
                category: None,
                due_date: None
            })
            .is_err());
        assert_eq!(hub.apply(Command::SetStudyMinutes(-5)).unwrap(), None);
        assert_eq!(hub.apply(Command::Pause).unwrap(), None);
        assert_eq!(hub.apply(Command::ConfirmTransition).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn tasks_link_to_calendar_through_hub() {
        let store = MemoryStore::new();
        let mut hub = open(&store);
        let due = NaiveDate::from_ymd_opt(2025, 10, 3).unwrap();
        let (task_id, event_id) = match hub
            .apply(Command::AddTask {
                title: "Lab report".into(),
                category: Some("Chemistry".into()),
                due_date: Some(due),
            })
            .unwrap()
        {
            Some(Event::TaskAdded {
                task_id,
                linked_event_id: Some(event_id),
                ..
            }) => (task_id, event_id),
            other => panic!("unexpected {other:?}"),
        };
        hub.apply(Command::ToggleTask(task_id.clone())).unwrap();
        assert!(hub.calendar().get(due, &event_id).unwrap().completed);
        assert_eq!(hub.rewards().points, 10);

        hub.apply(Command::ClearCompletedTasks).unwrap();
        assert!(hub.todo().tasks().is_empty());
        assert!(hub.calendar().get(due, &event_id).is_some());
    }

    #[test]
    fn view_combines_all_parts() {
        let store = MemoryStore::new();
        let mut hub = open(&store);
        add_goal(&mut hub, "Physics", 1.0);
        let view = hub.view();
        assert_eq!(view.timer.goals.len(), 1);
        assert_eq!(view.rewards.total_goals, 1);
        assert!(view.tasks.is_empty());
    }

    struct FailingStore;

    impl Store for FailingStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _blob: &str) -> Result<()> {
            Err(CoreError::Custom("disk full".into()))
        }
    }

    #[test]
    fn persistence_failures_do_not_affect_engine() {
        let mut hub = StudyHub::open(FailingStore, ManualTicker::new(), SystemClock, &Config::default()).unwrap();
        assert!(hub.apply(Command::Start).unwrap().is_some());
        hub.apply(Command::Tick).unwrap();
        assert_eq!(hub.engine().remaining_secs(), 1499);
        assert!(hub.engine().is_running());
    }

    #[test]
    fn disabled_notifications_silence_the_warning() {
        let store = MemoryStore::new();
        let mut config = Config::default();
        config.notifications.enabled = false;
        config.timer.study_minutes = 1;
        let mut hub: Hub<'_> = StudyHub::open(&store, ManualTicker::new(), SystemClock, &config).unwrap();
        hub.apply(Command::Start).unwrap();
        let events: Vec<_> = (0..60).filter_map(|_| hub.apply(Command::Tick).unwrap()).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::TransitionPending { .. }));
    }
}
