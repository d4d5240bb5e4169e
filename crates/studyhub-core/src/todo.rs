//! To-do list. Tasks with a due date are mirrored onto the calendar.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{Calendar, EventKind, NewEvent};
use crate::error::ValidationError;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Calendar event created for the due date.
    #[serde(default)]
    pub linked_event_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoList {
    tasks: Vec<Task>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Add a task and return it. A due date creates a linked assignment on
    /// the calendar.
    ///
    /// # Errors
    /// Rejects a blank title.
    pub fn add(
        &mut self,
        title: &str,
        category: Option<&str>,
        due_date: Option<NaiveDate>,
        at: DateTime<Utc>,
        calendar: &mut Calendar,
    ) -> Result<&Task, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".into()));
        }
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        let linked_event_id = match due_date {
            Some(date) => Some(calendar.add_event(
                date,
                NewEvent {
                    title: title.to_string(),
                    kind: EventKind::Assignment,
                    description: "From To-Do".to_string(),
                },
            )?),
            None => None,
        };

        self.tasks.push(Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            category: category.to_string(),
            completed: false,
            created_at: at,
            due_date,
            linked_event_id,
        });
        let idx = self.tasks.len() - 1;
        Ok(&self.tasks[idx])
    }

    /// Flip completion and mirror it onto the linked event. Returns the new
    /// state, or `None` for an unknown id.
    pub fn toggle(&mut self, id: &str, calendar: &mut Calendar) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        if let (Some(date), Some(event_id)) = (task.due_date, task.linked_event_id.as_deref()) {
            calendar.set_completion(date, event_id, task.completed);
        }
        Some(task.completed)
    }

    /// Remove a task and its linked event.
    pub fn delete(&mut self, id: &str, calendar: &mut Calendar) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(idx);
        if let (Some(date), Some(event_id)) = (task.due_date, task.linked_event_id.as_deref()) {
            calendar.delete_event(date, event_id);
        }
        Some(task)
    }

    /// Drop completed tasks. Linked calendar events stay, already marked
    /// complete. Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        before - self.tasks.len()
    }

    pub fn tasks_for(&self, date: NaiveDate) -> impl Iterator<Item = &Task> + '_ {
        self.tasks
            .iter()
            .filter(move |t| t.due_date == Some(date))
    }
}
