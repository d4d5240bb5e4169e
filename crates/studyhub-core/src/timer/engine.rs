//! Session accounting engine.
//!
//! A tick-driven state machine. It owns no thread: it arms its
//! [`TickSource`] when it starts running and disarms it on every way out of
//! RUNNING, and the owner calls `tick()` once per second while armed.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped --start--> Running --pause--> Stopped
//! Running --tick [remaining hits 0]--> PendingTransition
//! PendingTransition --confirm_transition--> Stopped (other phase, full length)
//! any --reset_round | full_reset--> Stopped
//! ```
//!
//! ## Attribution
//!
//! Study time is credited to the selected goal only at span boundaries
//! (pause, countdown reaching zero, switching goals mid-span). Each credit is
//! `watermark - remaining_secs`, after which the watermark moves to
//! `remaining_secs`, so no second is ever credited twice.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(TimerConfig::default(), ticker, SystemClock);
//! engine.start();
//! // once per second while engine.ticker().is_armed():
//! if let Some(event) = engine.tick() { /* warn / pending */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::TimerConfig;
use super::state::{Phase, TimerState, TimerStatus};
use crate::clock::{Clock, TickSource};
use crate::error::ValidationError;
use crate::events::Event;
use crate::goals::{Goal, GoalLedger, GoalProgress};

/// Seconds left at which the audio cue fires.
pub const DEFAULT_WARN_THRESHOLD_SECS: u32 = 3;

/// Everything needed to bring an engine back after a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub config: TimerConfig,
    pub state: TimerState,
    #[serde(default)]
    pub watermark_secs: Option<u32>,
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold_secs: u32,
    #[serde(default)]
    pub goals: GoalLedger,
    #[serde(default)]
    pub selected_goal: Option<String>,
}

fn default_warn_threshold() -> u32 {
    DEFAULT_WARN_THRESHOLD_SECS
}

/// A goal together with its derived progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress: GoalProgress,
    pub selected: bool,
}

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub phase: Phase,
    pub status: TimerStatus,
    pub remaining_secs: u32,
    pub is_running: bool,
    pub pending_transition: bool,
    pub study_minutes: u32,
    pub break_minutes: u32,
    pub goals: Vec<GoalView>,
    pub selected_goal: Option<String>,
}

/// Core session engine.
#[derive(Debug)]
pub struct SessionEngine<T, C> {
    config: TimerConfig,
    state: TimerState,
    /// `remaining_secs` at the start of the current study span.
    watermark_secs: Option<u32>,
    warn_threshold_secs: u32,
    ledger: GoalLedger,
    selected_goal: Option<String>,
    ticker: T,
    clock: C,
}

impl<T: TickSource, C: Clock> SessionEngine<T, C> {
    /// Create an engine in STOPPED, study phase, full study length.
    pub fn new(config: TimerConfig, mut ticker: T, clock: C) -> Self {
        ticker.disarm();
        Self {
            state: TimerState {
                phase: Phase::Study,
                remaining_secs: config.duration_secs(Phase::Study),
                is_running: false,
                pending_transition: false,
            },
            config,
            watermark_secs: None,
            warn_threshold_secs: DEFAULT_WARN_THRESHOLD_SECS,
            ledger: GoalLedger::new(),
            selected_goal: None,
            ticker,
            clock,
        }
    }

    /// Set the warn threshold. Zero disables the warning.
    pub fn with_warn_threshold(mut self, secs: u32) -> Self {
        self.warn_threshold_secs = secs;
        self
    }

    /// Rebuild an engine from a snapshot.
    ///
    /// A snapshot taken mid-run comes back STOPPED: the open study span is
    /// credited up to the persisted `remaining_secs` and the tick source
    /// stays disarmed until the next `start()`.
    pub fn restore(snapshot: EngineSnapshot, ticker: T, clock: C) -> Self {
        let EngineSnapshot {
            config,
            mut state,
            watermark_secs,
            warn_threshold_secs,
            goals,
            selected_goal,
        } = snapshot;

        let config = if config.is_valid() {
            config
        } else {
            info!("persisted timer config invalid, using defaults");
            TimerConfig::default()
        };
        let full = config.duration_secs(state.phase);
        if state.remaining_secs > full {
            state.remaining_secs = full;
        }
        let selected_goal = selected_goal.filter(|id| goals.contains(id));

        let mut engine = Self::new(config, ticker, clock).with_warn_threshold(warn_threshold_secs);
        engine.ledger = goals;
        engine.selected_goal = selected_goal;
        engine.state = state;
        engine.watermark_secs = watermark_secs;

        if engine.state.is_running {
            engine.state.is_running = false;
            let credited = engine.attribute();
            info!(
                remaining_secs = engine.state.remaining_secs,
                credited_minutes = credited,
                "restored a running timer as stopped"
            );
        }
        engine
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            config: self.config,
            state: self.state,
            watermark_secs: self.watermark_secs,
            warn_threshold_secs: self.warn_threshold_secs,
            goals: self.ledger.clone(),
            selected_goal: self.selected_goal.clone(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn is_pending_transition(&self) -> bool {
        self.state.pending_transition
    }

    pub fn watermark_secs(&self) -> Option<u32> {
        self.watermark_secs
    }

    pub fn warn_threshold_secs(&self) -> u32 {
        self.warn_threshold_secs
    }

    pub fn goals(&self) -> &[Goal] {
        self.ledger.goals()
    }

    pub fn ledger(&self) -> &GoalLedger {
        &self.ledger
    }

    pub fn selected_goal(&self) -> Option<&str> {
        self.selected_goal.as_deref()
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    /// Mutable access for awaiting ticks. Arming stays with the engine.
    pub fn ticker_mut(&mut self) -> &mut T {
        &mut self.ticker
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn view(&self) -> TimerView {
        let goals = self
            .ledger
            .goals()
            .iter()
            .map(|g| GoalView {
                progress: g.progress(),
                selected: self.selected_goal.as_deref() == Some(g.id.as_str()),
                goal: g.clone(),
            })
            .collect();
        TimerView {
            phase: self.state.phase,
            status: self.status(),
            remaining_secs: self.state.remaining_secs,
            is_running: self.state.is_running,
            pending_transition: self.state.pending_transition,
            study_minutes: self.config.study_minutes(),
            break_minutes: self.config.break_minutes(),
            goals,
            selected_goal: self.selected_goal.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running || self.state.pending_transition || self.state.remaining_secs == 0 {
            return None;
        }
        self.state.is_running = true;
        if self.state.phase == Phase::Study {
            self.watermark_secs = Some(self.state.remaining_secs);
        }
        self.ticker.arm();
        debug!(phase = %self.state.phase, remaining_secs = self.state.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: self.now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        self.ticker.disarm();
        let attributed_minutes = self.attribute();
        debug!(remaining_secs = self.state.remaining_secs, attributed_minutes, "timer paused");
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            attributed_minutes,
            at: self.now(),
        })
    }

    /// Restart the current phase from its full length. The open span since
    /// the last credit is forfeited.
    pub fn reset_round(&mut self) -> Option<Event> {
        self.stop();
        self.state.remaining_secs = self.config.duration_secs(self.state.phase);
        Some(Event::RoundReset {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: self.now(),
        })
    }

    /// Back to a fresh study phase.
    pub fn full_reset(&mut self) -> Option<Event> {
        self.stop();
        self.state.phase = Phase::Study;
        self.state.remaining_secs = self.config.duration_secs(Phase::Study);
        Some(Event::TimerReset { at: self.now() })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `TimerWarning` when the countdown lands on the warn threshold
    /// and `TransitionPending` when it reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running || self.state.pending_transition {
            return None;
        }
        if self.state.remaining_secs > 0 {
            self.state.remaining_secs -= 1;
            let remaining = self.state.remaining_secs;
            if remaining > 0 {
                if remaining == self.warn_threshold_secs {
                    return Some(Event::TimerWarning {
                        phase: self.state.phase,
                        remaining_secs: remaining,
                        at: self.now(),
                    });
                }
                return None;
            }
        }
        Some(self.enter_pending_transition())
    }

    pub fn confirm_transition(&mut self) -> Option<Event> {
        if !self.state.pending_transition {
            return None;
        }
        let from = self.state.phase;
        let to = from.other();
        self.state.phase = to;
        self.state.remaining_secs = self.config.duration_secs(to);
        self.state.pending_transition = false;
        self.watermark_secs = None;
        debug!(%from, %to, "phase transition confirmed");
        Some(Event::TransitionConfirmed {
            from,
            to,
            duration_secs: self.state.remaining_secs,
            at: self.now(),
        })
    }

    pub fn set_study_minutes(&mut self, minutes: i64) -> Option<Event> {
        self.set_minutes(Phase::Study, minutes)
    }

    pub fn set_break_minutes(&mut self, minutes: i64) -> Option<Event> {
        self.set_minutes(Phase::Break, minutes)
    }

    /// Change the selected goal. Unknown ids are rejected.
    ///
    /// Switching mid-span credits the elapsed part of the span to the
    /// previous selection first.
    pub fn select_goal(&mut self, goal_id: Option<&str>) -> Option<Event> {
        if let Some(id) = goal_id {
            if !self.ledger.contains(id) {
                return None;
            }
        }
        if self.selected_goal.as_deref() == goal_id {
            return None;
        }
        let attributed_minutes = if self.state.is_running {
            self.attribute()
        } else {
            0.0
        };
        self.selected_goal = goal_id.map(str::to_string);
        Some(Event::GoalSelected {
            goal_id: self.selected_goal.clone(),
            attributed_minutes,
            at: self.now(),
        })
    }

    /// # Errors
    /// Returns the ledger's validation error for a blank name or a
    /// non-positive target.
    pub fn add_goal(&mut self, name: &str, target_hours: f64) -> Result<Event, ValidationError> {
        let at = self.now();
        let goal_id = self.ledger.add_goal(name, target_hours, at)?;
        Ok(Event::GoalAdded {
            goal_id,
            name: name.trim().to_string(),
            at,
        })
    }

    /// Delete a goal, clearing the selection if it pointed at it.
    pub fn delete_goal(&mut self, goal_id: &str) -> Option<Event> {
        let goal = self.ledger.delete_goal(goal_id)?;
        let was_selected = self.selected_goal.as_deref() == Some(goal.id.as_str());
        if was_selected {
            self.selected_goal = None;
        }
        Some(Event::GoalDeleted {
            goal_id: goal.id,
            was_selected,
            at: self.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn stop(&mut self) {
        self.state.is_running = false;
        self.state.pending_transition = false;
        self.watermark_secs = None;
        self.ticker.disarm();
    }

    fn set_minutes(&mut self, phase: Phase, minutes: i64) -> Option<Event> {
        let minutes = self.config.set_minutes(phase, minutes).ok()?;
        if self.state.phase == phase && self.status() == TimerStatus::Stopped {
            self.state.remaining_secs = self.config.duration_secs(phase);
            self.watermark_secs = None;
        }
        Some(Event::DurationUpdated {
            phase,
            minutes,
            at: self.now(),
        })
    }

    fn enter_pending_transition(&mut self) -> Event {
        self.state.is_running = false;
        self.state.pending_transition = true;
        self.ticker.disarm();
        let attributed_minutes = self.attribute();
        self.watermark_secs = None;
        debug!(phase = %self.state.phase, attributed_minutes, "countdown finished");
        Event::TransitionPending {
            phase: self.state.phase,
            attributed_minutes,
            at: self.now(),
        }
    }

    /// Credit the open study span to the selected goal and move the
    /// watermark to `remaining_secs`. Returns the minutes credited.
    fn attribute(&mut self) -> f64 {
        if self.state.phase != Phase::Study {
            return 0.0;
        }
        let Some(mark) = self.watermark_secs else {
            return 0.0;
        };
        let remaining = self.state.remaining_secs;
        self.watermark_secs = Some(remaining);
        let elapsed = mark.saturating_sub(remaining);
        if elapsed == 0 {
            return 0.0;
        }
        let minutes = f64::from(elapsed) / 60.0;
        let credited = match self.selected_goal.as_deref() {
            Some(id) => self.ledger.add_time(id, minutes),
            None => false,
        };
        if credited {
            minutes
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualTicker, SystemClock};

    type Engine = SessionEngine<ManualTicker, SystemClock>;

    fn engine() -> Engine {
        SessionEngine::new(TimerConfig::default(), ManualTicker::new(), SystemClock)
    }

    fn engine_with_goal() -> (Engine, String) {
        let mut engine = engine();
        let id = match engine.add_goal("Math", 1.0).unwrap() {
            Event::GoalAdded { goal_id, .. } => goal_id,
            other => panic!("expected GoalAdded, got {other:?}"),
        };
        engine.select_goal(Some(&id));
        (engine, id)
    }

    fn ticks(engine: &mut Engine, n: u32) -> Vec<Event> {
        (0..n).filter_map(|_| engine.tick()).collect()
    }

    fn minutes_of(engine: &Engine, id: &str) -> f64 {
        engine.ledger().get(id).unwrap().completed_minutes
    }

    #[test]
    fn starts_stopped_in_study() {
        let engine = engine();
        assert_eq!(engine.status(), TimerStatus::Stopped);
        assert_eq!(engine.phase(), Phase::Study);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(!engine.ticker().is_armed());
    }

    #[test]
    fn start_arms_and_pause_disarms() {
        let mut engine = engine();
        assert!(engine.start().is_some());
        assert!(engine.ticker().is_armed());
        assert!(engine.start().is_none());
        assert_eq!(engine.ticker().arm_count(), 1);

        assert!(engine.pause().is_some());
        assert!(!engine.ticker().is_armed());
        assert!(engine.pause().is_none());
    }

    #[test]
    fn tick_is_ignored_while_stopped() {
        let mut engine = engine();
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn pause_credits_elapsed_seconds_once() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        ticks(&mut engine, 90);
        match engine.pause() {
            Some(Event::TimerPaused { attributed_minutes, .. }) => {
                assert!((attributed_minutes - 1.5).abs() < 1e-9)
            }
            other => panic!("expected TimerPaused, got {other:?}"),
        }
        assert!(engine.pause().is_none());
        assert!((minutes_of(&engine, &id) - 1.5).abs() < 1e-9);

        engine.start();
        ticks(&mut engine, 30);
        engine.pause();
        assert!((minutes_of(&engine, &id) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn warning_fires_once_at_threshold() {
        let mut engine = engine().with_warn_threshold(1);
        engine.set_study_minutes(1);
        engine.start();
        let events = ticks(&mut engine, 58);
        assert!(events.is_empty());
        match engine.tick() {
            Some(Event::TimerWarning { remaining_secs, .. }) => assert_eq!(remaining_secs, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn warning_uses_default_threshold_of_three() {
        let mut engine = engine();
        engine.set_study_minutes(1);
        engine.start();
        let events = ticks(&mut engine, 57);
        let warnings: Vec<_> = events.iter().filter(|e| e.is_notification()).collect();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            Event::TimerWarning { remaining_secs: 3, .. }
        ));
    }

    #[test]
    fn warning_does_not_refire_after_pause_resume() {
        let mut engine = engine().with_warn_threshold(3);
        engine.set_study_minutes(1);
        engine.start();
        ticks(&mut engine, 57);
        engine.pause();
        engine.start();
        let events = ticks(&mut engine, 2);
        assert!(events.is_empty());
    }

    #[test]
    fn reaching_zero_waits_for_confirmation() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        let events = ticks(&mut engine, 1500);
        assert!(matches!(events.last(), Some(Event::TransitionPending { .. })));
        assert_eq!(engine.status(), TimerStatus::PendingTransition);
        assert!(!engine.is_running());
        assert!(!engine.ticker().is_armed());
        assert_eq!(engine.phase(), Phase::Study);
        assert!((minutes_of(&engine, &id) - 25.0).abs() < 1e-9);

        assert!(engine.start().is_none());
        assert!(engine.tick().is_none());

        assert!(engine.confirm_transition().is_some());
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.remaining_secs(), 300);
        assert_eq!(engine.status(), TimerStatus::Stopped);
        assert!(engine.confirm_transition().is_none());
    }

    #[test]
    fn break_time_is_never_credited() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        ticks(&mut engine, 1500);
        engine.confirm_transition();
        engine.start();
        ticks(&mut engine, 120);
        engine.pause();
        assert!((minutes_of(&engine, &id) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn reset_round_keeps_phase_and_forfeits_open_span() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        ticks(&mut engine, 60);
        engine.pause();
        engine.start();
        ticks(&mut engine, 60);
        engine.reset_round();
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.phase(), Phase::Study);
        assert!(!engine.ticker().is_armed());
        assert!((minutes_of(&engine, &id) - 1.0).abs() < 1e-9);
        assert!(engine.watermark_secs().is_none());
    }

    #[test]
    fn full_reset_returns_to_study() {
        let mut engine = engine();
        engine.start();
        ticks(&mut engine, 1500);
        engine.confirm_transition();
        engine.start();
        engine.full_reset();
        assert_eq!(engine.phase(), Phase::Study);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.status(), TimerStatus::Stopped);
        assert!(!engine.ticker().is_armed());
    }

    #[test]
    fn full_reset_clears_pending_transition() {
        let mut engine = engine();
        engine.start();
        ticks(&mut engine, 1500);
        engine.full_reset();
        assert!(!engine.is_pending_transition());
    }

    #[test]
    fn duration_update_applies_to_stopped_current_phase_only() {
        let mut engine = engine();
        assert!(engine.set_study_minutes(-5).is_none());
        assert_eq!(engine.config().study_minutes(), 25);

        assert!(engine.set_study_minutes(50).is_some());
        assert_eq!(engine.remaining_secs(), 3000);

        assert!(engine.set_break_minutes(10).is_some());
        assert_eq!(engine.remaining_secs(), 3000);

        engine.start();
        engine.tick();
        engine.set_study_minutes(30);
        assert_eq!(engine.remaining_secs(), 2999);
        assert_eq!(engine.config().study_minutes(), 30);
    }

    #[test]
    fn deleting_selected_goal_mid_session_drops_the_credit() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        ticks(&mut engine, 30);
        match engine.delete_goal(&id) {
            Some(Event::GoalDeleted { was_selected, .. }) => assert!(was_selected),
            other => panic!("unexpected {other:?}"),
        }
        assert!(engine.selected_goal().is_none());
        match engine.pause() {
            Some(Event::TimerPaused { attributed_minutes, .. }) => assert_eq!(attributed_minutes, 0.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn switching_goal_mid_span_credits_previous_goal() {
        let (mut engine, first) = engine_with_goal();
        let second = match engine.add_goal("Physics", 2.0).unwrap() {
            Event::GoalAdded { goal_id, .. } => goal_id,
            _ => unreachable!(),
        };
        engine.start();
        ticks(&mut engine, 60);
        engine.select_goal(Some(&second));
        ticks(&mut engine, 120);
        engine.pause();
        assert!((minutes_of(&engine, &first) - 1.0).abs() < 1e-9);
        assert!((minutes_of(&engine, &second) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn select_goal_rejects_unknown_id() {
        let mut engine = engine();
        assert!(engine.select_goal(Some("nope")).is_none());
        assert!(engine.selected_goal().is_none());
    }

    #[test]
    fn restore_of_running_snapshot_is_stopped_and_credited() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        ticks(&mut engine, 120);
        let snapshot = engine.snapshot();
        assert!(snapshot.state.is_running);

        let restored: Engine = SessionEngine::restore(snapshot, ManualTicker::new(), SystemClock);
        assert_eq!(restored.status(), TimerStatus::Stopped);
        assert_eq!(restored.remaining_secs(), 1380);
        assert!(!restored.ticker().is_armed());
        assert!((minutes_of(&restored, &id) - 2.0).abs() < 1e-9);
        assert_eq!(restored.selected_goal(), Some(id.as_str()));
    }

    #[test]
    fn restore_drops_dangling_selection_and_bad_config() {
        let mut snapshot = engine().snapshot();
        snapshot.selected_goal = Some("gone".into());
        snapshot.config = serde_json::from_str(r#"{"study_minutes":0,"break_minutes":5}"#).unwrap();
        let restored: Engine = SessionEngine::restore(snapshot, ManualTicker::new(), SystemClock);
        assert!(restored.selected_goal().is_none());
        assert_eq!(restored.config(), TimerConfig::default());
    }

    #[test]
    fn view_reports_progress_and_selection() {
        let (mut engine, id) = engine_with_goal();
        engine.start();
        ticks(&mut engine, 1500);
        let view = engine.view();
        assert_eq!(view.status, TimerStatus::PendingTransition);
        assert_eq!(view.goals.len(), 1);
        assert!(view.goals[0].selected);
        assert_eq!(view.goals[0].goal.id, id);
        assert!((view.goals[0].progress.percent_complete - 25.0 / 60.0 * 100.0).abs() < 1e-9);
    }
}
