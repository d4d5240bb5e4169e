use serde::{Deserialize, Serialize};

use super::state::Phase;
use crate::error::ValidationError;

pub const DEFAULT_STUDY_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Study and break lengths, in whole minutes. Both are always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    study_minutes: u32,
    break_minutes: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            study_minutes: DEFAULT_STUDY_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl TimerConfig {
    /// # Errors
    /// Returns a validation error if either duration is not a positive
    /// number of minutes.
    pub fn new(study_minutes: i64, break_minutes: i64) -> Result<Self, ValidationError> {
        let study_minutes = validate_minutes("study_minutes", study_minutes)?;
        let break_minutes = validate_minutes("break_minutes", break_minutes)?;
        Ok(Self {
            study_minutes,
            break_minutes,
        })
    }

    pub fn study_minutes(&self) -> u32 {
        self.study_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn minutes(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Study => self.study_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    /// Full length of a phase in seconds.
    pub fn duration_secs(&self, phase: Phase) -> u32 {
        self.minutes(phase) * 60
    }

    /// Replace one phase's length. Rejected values leave the config as is.
    pub(crate) fn set_minutes(&mut self, phase: Phase, minutes: i64) -> Result<u32, ValidationError> {
        let field = match phase {
            Phase::Study => "study_minutes",
            Phase::Break => "break_minutes",
        };
        let minutes = validate_minutes(field, minutes)?;
        match phase {
            Phase::Study => self.study_minutes = minutes,
            Phase::Break => self.break_minutes = minutes,
        }
        Ok(minutes)
    }

    /// True if the config could have come out of `new`. Deserialized blobs
    /// are not validated by serde.
    pub fn is_valid(&self) -> bool {
        validate_minutes("study_minutes", i64::from(self.study_minutes)).is_ok()
            && validate_minutes("break_minutes", i64::from(self.break_minutes)).is_ok()
    }
}

fn validate_minutes(field: &str, minutes: i64) -> Result<u32, ValidationError> {
    if minutes <= 0 {
        return Err(ValidationError::invalid(
            field,
            format!("must be a positive number of minutes, got {minutes}"),
        ));
    }
    u32::try_from(minutes)
        .ok()
        .filter(|m| m.checked_mul(60).is_some())
        .ok_or_else(|| ValidationError::invalid(field, format!("{minutes} minutes is too long")))
}

/// Parse a user-typed duration. Non-numeric and non-positive input yields `None`.
pub fn parse_minutes(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok().filter(|m| *m > 0)
}
