//! Points earned from finished goals and tasks. Derived, never stored.

use serde::{Deserialize, Serialize};

use crate::goals::Goal;
use crate::storage::RewardsConfig;
use crate::todo::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub completed_goals: usize,
    pub total_goals: usize,
    pub points_from_tasks: u64,
    pub points_from_goals: u64,
    pub points: u64,
    /// Rounded, 0 when there are no tasks.
    pub task_progress_pct: u32,
    /// Rounded, 0 when there are no goals.
    pub goal_progress_pct: u32,
}

impl RewardSummary {
    pub fn compute(tasks: &[Task], goals: &[Goal], config: &RewardsConfig) -> Self {
        let completed_tasks = tasks.iter().filter(|t| t.completed).count();
        let completed_goals = goals.iter().filter(|g| g.is_completed()).count();
        let points_from_tasks = completed_tasks as u64 * u64::from(config.points_per_task);
        let points_from_goals = completed_goals as u64 * u64::from(config.points_per_goal);
        Self {
            completed_tasks,
            total_tasks: tasks.len(),
            completed_goals,
            total_goals: goals.len(),
            points_from_tasks,
            points_from_goals,
            points: points_from_tasks + points_from_goals,
            task_progress_pct: percent(completed_tasks, tasks.len()),
            goal_progress_pct: percent(completed_goals, goals.len()),
        }
    }
}

fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64 * 100.0).round() as u32
}
