//! MindCanvas Application
//!
//! Command-line shell over the canvas core: configuration loading, storage
//! selection, and one command per invocation.

mod app;
mod cli;

pub use app::{App, AppConfig, AppError, CONFIG_ENV, CONFIG_FILE};
pub use cli::{Cli, Command};
