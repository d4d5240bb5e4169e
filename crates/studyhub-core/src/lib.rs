//! # Study Hub Core Library
//!
//! Business logic for Study Hub: a study/break countdown that credits study
//! time to goals, plus the to-do list, calendar and reward points around it.
//! The `studyhub` CLI is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Clock Source**: wall-clock time and an arm/disarm 1 Hz tick
//! - **Session Engine**: tick-driven state machine owning the countdown,
//!   the goal ledger and the selected goal
//! - **Storage**: key-value blob persistence (SQLite or in-memory) and
//!   TOML configuration
//! - **Hub**: explicitly constructed owner of all state, exposed as a
//!   command handle plus a read model
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: study/break state machine with time attribution
//! - [`GoalLedger`]: goals and credited minutes
//! - [`StudyHub`]: command/read-model facade with persistence
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod clock;
pub mod error;
pub mod events;
pub mod goals;
pub mod hub;
pub mod rewards;
pub mod storage;
pub mod timer;
pub mod todo;

pub use calendar::{Calendar, CalendarEvent, EventKind, EventPatch, MonthCursor, NewEvent};
pub use clock::{Clock, IntervalTicker, ManualClock, ManualTicker, SystemClock, TickSource};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use goals::{Goal, GoalLedger, GoalProgress};
pub use hub::{Command, HubView, StudyHub};
pub use rewards::RewardSummary;
pub use storage::{Config, MemoryStore, SqliteStore, Store};
pub use timer::{Phase, SessionEngine, TimerConfig, TimerState, TimerStatus, TimerView};
pub use todo::{Task, TodoList};
