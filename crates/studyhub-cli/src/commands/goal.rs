//! Goal management commands for CLI.

use clap::Subcommand;
use studyhub_core::Command;

use crate::common::{open_hub, print_json, report};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a goal
    Add {
        /// Goal name
        name: String,
        /// Target in hours (fractions allowed)
        target_hours: f64,
    },
    /// List goals with progress
    List,
    /// Delete a goal (clears the selection if it was selected)
    Delete {
        /// Goal ID
        id: String,
    },
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut hub = open_hub()?;

    match action {
        GoalAction::Add { name, target_hours } => {
            let event = hub.apply(Command::AddGoal { name, target_hours })?;
            report(event, "goal not added")?;
        }
        GoalAction::List => print_json(&hub.engine().view().goals)?,
        GoalAction::Delete { id } => {
            if !hub.engine().ledger().contains(&id) {
                return Err(format!("no goal with id {id}").into());
            }
            report(hub.apply(Command::DeleteGoal(id))?, "goal not deleted")?;
        }
    }
    Ok(())
}
