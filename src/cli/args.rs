//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::session::Seniority;

/// Rehearse - mock interview practice at the terminal
#[derive(Parser, Debug)]
#[command(name = "rehearse")]
#[command(version = "1.0.0")]
#[command(about = "Offline-first interview rehearsal: timed questions, recorded answers, queued sync")]
#[command(long_about = None)]
pub struct Cli {
    /// Role to rehearse for (e.g. "Backend Engineer")
    #[arg(short = 'r', long, value_name = "TITLE")]
    pub role: Option<String>,

    /// Seniority level of the role
    #[arg(short = 's', long, value_name = "LEVEL")]
    pub seniority: Option<SeniorityArg>,

    /// Number of questions in the session
    #[arg(short = 'q', long, value_name = "COUNT")]
    pub questions: Option<u32>,

    /// Answer time limit override for every question (e.g. 90s, 2m,
    /// 2m30s). Without it each question keeps its own limit.
    #[arg(short = 't', long, value_name = "TIME")]
    pub time_limit: Option<String>,

    /// Practice server base URL
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Live speech recognition endpoint (omit to rehearse without a
    /// live transcript)
    #[arg(long, value_name = "URL")]
    pub speech_url: Option<String>,

    /// API key for the practice server
    #[arg(
        long,
        value_name = "KEY",
        env = "REHEARSE_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Skip the chime that announces each question
    #[arg(long)]
    pub no_chime: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect and drain the offline response queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Queue action subcommands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum QueueAction {
    /// List queued answers and their sync status
    List,
    /// Push queued answers to the server now
    Sync,
    /// Sync again, including answers that hit the retry limit
    Retry,
    /// Show how many answers are waiting
    Count,
}

/// Seniority argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SeniorityArg {
    Junior,
    Mid,
    Senior,
    Staff,
}

impl From<SeniorityArg> for Seniority {
    fn from(arg: SeniorityArg) -> Self {
        match arg {
            SeniorityArg::Junior => Seniority::Junior,
            SeniorityArg::Mid => Seniority::Mid,
            SeniorityArg::Senior => Seniority::Senior,
            SeniorityArg::Staff => Seniority::Staff,
        }
    }
}

impl From<Seniority> for SeniorityArg {
    fn from(level: Seniority) -> Self {
        match level {
            Seniority::Junior => SeniorityArg::Junior,
            Seniority::Mid => SeniorityArg::Mid,
            Seniority::Senior => SeniorityArg::Senior,
            Seniority::Staff => SeniorityArg::Staff,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "server_url",
    "api_key",
    "speech_url",
    "role",
    "seniority",
    "questions",
    "time_limit",
    "notify",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["rehearse"]);
        assert!(cli.role.is_none());
        assert!(cli.seniority.is_none());
        assert!(cli.questions.is_none());
        assert!(cli.time_limit.is_none());
        assert!(cli.server.is_none());
        assert!(cli.speech_url.is_none());
        assert!(!cli.notify);
        assert!(!cli.no_chime);
    }

    #[test]
    fn cli_parses_session_options() {
        let cli = Cli::parse_from([
            "rehearse",
            "-r",
            "Backend Engineer",
            "-s",
            "senior",
            "-q",
            "3",
        ]);
        assert_eq!(cli.role, Some("Backend Engineer".to_string()));
        assert_eq!(cli.seniority, Some(SeniorityArg::Senior));
        assert_eq!(cli.questions, Some(3));
    }

    #[test]
    fn cli_parses_time_limit() {
        let cli = Cli::parse_from(["rehearse", "-t", "2m30s"]);
        assert_eq!(cli.time_limit, Some("2m30s".to_string()));
    }

    #[test]
    fn cli_parses_server_and_speech_urls() {
        let cli = Cli::parse_from([
            "rehearse",
            "--server",
            "http://localhost:9999",
            "--speech-url",
            "http://localhost:9999/api/speech",
        ]);
        assert_eq!(cli.server, Some("http://localhost:9999".to_string()));
        assert_eq!(
            cli.speech_url,
            Some("http://localhost:9999/api/speech".to_string())
        );
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["rehearse", "config", "init"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["rehearse", "config", "set", "role", "SRE"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "role");
            assert_eq!(value, "SRE");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn cli_parses_queue_actions() {
        let cli = Cli::parse_from(["rehearse", "queue", "sync"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Queue {
                action: QueueAction::Sync
            })
        ));

        let cli = Cli::parse_from(["rehearse", "queue", "retry"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Queue {
                action: QueueAction::Retry
            })
        ));
    }

    #[test]
    fn seniority_arg_converts_both_ways() {
        assert_eq!(Seniority::from(SeniorityArg::Junior), Seniority::Junior);
        assert_eq!(SeniorityArg::from(Seniority::Staff), SeniorityArg::Staff);
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("server_url"));
        assert!(is_valid_config_key("api_key"));
        assert!(is_valid_config_key("time_limit"));
        assert!(!is_valid_config_key("invalid_key"));
    }

    #[test]
    fn verify_cli() {
        // Verify the CLI definition is valid
        Cli::command().debug_assert();
    }
}
