//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, and the interactive
//! session runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod queue_cmd;

// Re-export commonly used types
pub use app::{
    load_merged_config, run_session, SessionOptions, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, QueueAction, SeniorityArg};
pub use config_cmd::handle_config_command;
pub use presenter::Presenter;
pub use queue_cmd::handle_queue_command;
