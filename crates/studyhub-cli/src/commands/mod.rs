pub mod calendar;
pub mod config;
pub mod goal;
pub mod rewards;
pub mod task;
pub mod timer;
