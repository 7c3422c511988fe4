//! Terminal front end for the task-list client.
//!
//! Reads line commands, drives a `TaskListController` from `task-core`, and
//! executes its requests over HTTP with ureq.

pub mod command;
pub mod config;
pub mod render;
pub mod runtime;
pub mod transport;

use thiserror::Error;

pub use command::Command;
pub use config::{AppConfig, ConfigError};
pub use runtime::{run, run_stdio, App, Event, Reply};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
