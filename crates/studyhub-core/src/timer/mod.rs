mod config;
mod engine;
mod state;

pub use config::{parse_minutes, TimerConfig, DEFAULT_BREAK_MINUTES, DEFAULT_STUDY_MINUTES};
pub use engine::{EngineSnapshot, GoalView, SessionEngine, TimerView, DEFAULT_WARN_THRESHOLD_SECS};
pub use state::{format_clock, Phase, TimerState, TimerStatus};
