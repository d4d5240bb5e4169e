use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Study,
    Break,
}

impl Phase {
    pub fn other(self) -> Phase {
        match self {
            Phase::Study => Phase::Break,
            Phase::Break => Phase::Study,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Study => f.write_str("study"),
            Phase::Break => f.write_str("break"),
        }
    }
}

/// Machine state derived from [`TimerState`]'s flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Stopped,
    Running,
    PendingTransition,
}

/// The countdown itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub is_running: bool,
    /// Countdown reached zero and waits for confirmation.
    pub pending_transition: bool,
}

impl TimerState {
    pub fn status(&self) -> TimerStatus {
        if self.pending_transition {
            TimerStatus::PendingTransition
        } else if self.is_running {
            TimerStatus::Running
        } else {
            TimerStatus::Stopped
        }
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefers_pending() {
        let mut state = TimerState {
            phase: Phase::Study,
            remaining_secs: 0,
            is_running: false,
            pending_transition: true,
        };
        assert_eq!(state.status(), TimerStatus::PendingTransition);
        state.pending_transition = false;
        assert_eq!(state.status(), TimerStatus::Stopped);
        state.is_running = true;
        assert_eq!(state.status(), TimerStatus::Running);
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(6000), "100:00");
    }
}
