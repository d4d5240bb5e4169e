//! Persistence collaborator and on-disk configuration.
//!
//! The engine never touches storage. The hub serializes its parts into JSON
//! blobs and hands them to a [`Store`] under fixed namespace keys.

mod config;
mod memory;
mod sqlite;

pub use config::{Config, NotificationsConfig, RewardsConfig, TimerSection};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::{Result, StorageError};

/// Key of the serialized session engine (timer state, goals, selection).
pub const TIMER_KEY: &str = "studyhub.timer";
/// Key of the serialized to-do list.
pub const TASKS_KEY: &str = "studyhub.tasks";
/// Key of the serialized calendar.
pub const CALENDAR_KEY: &str = "studyhub.calendar";

/// Key-value blob storage.
pub trait Store {
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, blob: &str) -> Result<()>;
}

impl<S: Store + ?Sized> Store for &S {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, blob: &str) -> Result<()> {
        (**self).save(key, blob)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `STUDYHUB_DATA_DIR` wins when set. Otherwise `~/.config/studyhub`, or
/// `~/.config/studyhub-dev` with `STUDYHUB_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYHUB_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYHUB_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyhub-dev")
            } else {
                base_dir.join("studyhub")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
