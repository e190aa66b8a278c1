//! Rehearse CLI entry point

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use rehearse::application::SyncEngine;
use rehearse::cli::{
    app::{load_merged_config, run_session, SessionOptions, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    queue_cmd::handle_queue_command,
};
use rehearse::domain::config::AppConfig;
use rehearse::domain::interview::Duration;
use rehearse::domain::session::Seniority;
use rehearse::infrastructure::{HttpResponseApi, JsonDirStore, XdgConfigStore};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut presenter = Presenter::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        server_url: cli.server.clone(),
        api_key: cli.api_key.clone(),
        speech_url: cli.speech_url.clone(),
        role: cli.role.clone(),
        seniority: cli.seniority.map(|s| Seniority::from(s).to_string()),
        questions: cli.questions,
        time_limit: cli.time_limit.clone(),
        notify: if cli.notify { Some(true) } else { None },
    };

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Queue { action }) => {
            let config = load_merged_config(cli_config).await;
            let store = Arc::new(JsonDirStore::new());
            let api =
                HttpResponseApi::new(config.server_url_or_default(), config.api_key.clone());
            let engine = SyncEngine::new(Arc::clone(&store), api);
            if let Err(e) =
                handle_queue_command(action, store.as_ref(), &engine, &mut presenter).await
            {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Merge config
    let config = load_merged_config(cli_config).await;

    // A zero question count or a bad time limit is a usage mistake,
    // not a runtime failure
    if config.questions_or_default() == 0 {
        presenter.error("At least one question is required");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }
    if let Some(raw) = config.time_limit.as_ref() {
        if let Err(e) = raw.parse::<Duration>() {
            presenter.error(&format!("Invalid time limit: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    let options = SessionOptions::from_config(&config, !cli.no_chime);
    run_session(options).await
}
