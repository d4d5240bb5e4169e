//! To-do commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use studyhub_core::Command;

use crate::common::{open_hub, parse_date, print_json, report};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Category (default: General)
        #[arg(long)]
        category: Option<String>,
        /// Due date, YYYY-MM-DD. Also adds an assignment to the calendar.
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
    },
    /// List tasks
    List {
        /// Only tasks due on this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
        /// Hide completed tasks
        #[arg(long)]
        open: bool,
    },
    /// Flip a task between done and not done
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task and its calendar entry
    Delete {
        /// Task ID
        id: String,
    },
    /// Remove every completed task
    ClearCompleted,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut hub = open_hub()?;

    match action {
        TaskAction::Add {
            title,
            category,
            due,
        } => {
            let event = hub.apply(Command::AddTask {
                title,
                category,
                due_date: due,
            })?;
            report(event, "task not added")?;
        }
        TaskAction::List { due, open } => {
            let tasks: Vec<_> = hub
                .todo()
                .tasks()
                .iter()
                .filter(|t| due.is_none() || t.due_date == due)
                .filter(|t| !open || !t.completed)
                .collect();
            print_json(&tasks)?;
        }
        TaskAction::Toggle { id } => {
            if hub.todo().get(&id).is_none() {
                return Err(format!("no task with id {id}").into());
            }
            report(hub.apply(Command::ToggleTask(id))?, "task unchanged")?;
        }
        TaskAction::Delete { id } => {
            if hub.todo().get(&id).is_none() {
                return Err(format!("no task with id {id}").into());
            }
            report(hub.apply(Command::DeleteTask(id))?, "task not deleted")?;
        }
        TaskAction::ClearCompleted => {
            report(hub.apply(Command::ClearCompletedTasks)?, "no completed tasks")?;
        }
    }
    Ok(())
}
