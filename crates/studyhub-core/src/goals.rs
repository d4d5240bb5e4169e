//! Goal ledger: study goals and the minutes credited to them.
//!
//! Only the session engine credits time (`add_time`). Everything the UI
//! shows about progress is derived on read and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A study goal: a named target of hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_hours: f64,
    /// Fractional minutes credited so far.
    #[serde(default)]
    pub completed_minutes: f64,
    pub created_at: DateTime<Utc>,
}

/// Derived progress of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub completed_hours: f64,
    /// 0.0 ..= 100.0
    pub percent_complete: f64,
    pub completed: bool,
}

impl Goal {
    pub fn is_completed(&self) -> bool {
        self.completed_minutes >= self.target_hours * 60.0
    }

    pub fn progress(&self) -> GoalProgress {
        let completed_hours = self.completed_minutes / 60.0;
        let percent_complete = if self.target_hours > 0.0 {
            (completed_hours / self.target_hours * 100.0).min(100.0)
        } else {
            0.0
        };
        GoalProgress {
            completed_hours,
            percent_complete,
            completed: self.is_completed(),
        }
    }
}

/// Ordered collection of goals, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalLedger {
    goals: Vec<Goal>,
}

impl GoalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Add a goal and return its id.
    ///
    /// # Errors
    /// Rejects a blank name or a target that is not a finite positive number.
    pub fn add_goal(
        &mut self,
        name: &str,
        target_hours: f64,
        at: DateTime<Utc>,
    ) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name".into()));
        }
        if !target_hours.is_finite() || target_hours <= 0.0 {
            return Err(ValidationError::invalid(
                "target_hours",
                format!("must be a positive number, got {target_hours}"),
            ));
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.goals.push(Goal {
            id: id.clone(),
            name: name.to_string(),
            target_hours,
            completed_minutes: 0.0,
            created_at: at,
        });
        Ok(id)
    }

    /// Remove a goal. Returns the removed goal, if it existed.
    pub fn delete_goal(&mut self, id: &str) -> Option<Goal> {
        let idx = self.goals.iter().position(|g| g.id == id)?;
        Some(self.goals.remove(idx))
    }

    /// Credit `minutes` to a goal. Unknown ids and non-positive amounts are
    /// ignored. Returns whether anything was credited.
    pub fn add_time(&mut self, id: &str, minutes: f64) -> bool {
        if !minutes.is_finite() || minutes <= 0.0 {
            return false;
        }
        match self.goals.iter_mut().find(|g| g.id == id) {
            Some(goal) => {
                goal.completed_minutes += minutes;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(name: &str, hours: f64) -> (GoalLedger, String) {
        let mut ledger = GoalLedger::new();
        let id = ledger.add_goal(name, hours, Utc::now()).unwrap();
        (ledger, id)
    }

    #[test]
    fn add_goal_trims_and_starts_at_zero() {
        let (ledger, id) = ledger_with("  Physics ", 10.0);
        let goal = ledger.get(&id).unwrap();
        assert_eq!(goal.name, "Physics");
        assert_eq!(goal.completed_minutes, 0.0);
    }

    #[test]
    fn add_goal_rejects_blank_name_and_bad_hours() {
        let mut ledger = GoalLedger::new();
        assert!(ledger.add_goal("   ", 2.0, Utc::now()).is_err());
        assert!(ledger.add_goal("Math", 0.0, Utc::now()).is_err());
        assert!(ledger.add_goal("Math", -3.0, Utc::now()).is_err());
        assert!(ledger.add_goal("Math", f64::NAN, Utc::now()).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn goal_ids_are_unique() {
        let mut ledger = GoalLedger::new();
        let a = ledger.add_goal("A", 1.0, Utc::now()).unwrap();
        let b = ledger.add_goal("B", 1.0, Utc::now()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn add_time_accumulates_fractional_minutes() {
        let (mut ledger, id) = ledger_with("Math", 1.0);
        assert!(ledger.add_time(&id, 0.5));
        assert!(ledger.add_time(&id, 1.25));
        assert!((ledger.get(&id).unwrap().completed_minutes - 1.75).abs() < 1e-9);
    }

    #[test]
    fn add_time_ignores_unknown_and_negative() {
        let (mut ledger, id) = ledger_with("Math", 1.0);
        assert!(!ledger.add_time("missing", 5.0));
        assert!(!ledger.add_time(&id, -5.0));
        assert!(!ledger.add_time(&id, 0.0));
        assert_eq!(ledger.get(&id).unwrap().completed_minutes, 0.0);
    }

    #[test]
    fn delete_goal_removes_it() {
        let (mut ledger, id) = ledger_with("Math", 1.0);
        assert!(ledger.delete_goal(&id).is_some());
        assert!(ledger.delete_goal(&id).is_none());
        assert!(!ledger.contains(&id));
    }

    #[test]
    fn progress_is_capped_at_one_hundred() {
        let (mut ledger, id) = ledger_with("Math", 1.0);
        ledger.add_time(&id, 30.0);
        let p = ledger.get(&id).unwrap().progress();
        assert!((p.percent_complete - 50.0).abs() < 1e-9);
        assert!(!p.completed);

        ledger.add_time(&id, 90.0);
        let p = ledger.get(&id).unwrap().progress();
        assert_eq!(p.percent_complete, 100.0);
        assert!((p.completed_hours - 2.0).abs() < 1e-9);
        assert!(p.completed);
    }
}
