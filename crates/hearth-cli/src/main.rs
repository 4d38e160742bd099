use std::sync::Arc;

use clap::Parser;
use hearth_core::db;
use hearth_core::error::CoreError;
use hearth_core::events::LogNotifier;
use hearth_core::repository::SqliteRepository;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Could not load configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log_level);
    tracing::debug!(database = %config.database_path, "opening database");

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool, Arc::new(LogNotifier));

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&repository, command).await,
        cli::Commands::List(command) => {
            commands::list::list_tasks(&repository, command, &config).await
        }
        cli::Commands::Show(command) => commands::show::show_task(&repository, command).await,
        cli::Commands::Done(command) => commands::done::done_task(&repository, command).await,
        cli::Commands::Undo(command) => commands::done::undo_task(&repository, command).await,
        cli::Commands::Delete(command) => {
            commands::delete::delete_task(&repository, command).await
        }
        cli::Commands::Edit(command) => commands::edit::edit_task(&repository, command).await,
        cli::Commands::Person(command) => {
            commands::person::person_command(&repository, command).await
        }
        cli::Commands::Category(command) => {
            commands::category::category_command(&repository, command).await
        }
        cli::Commands::Attach(command) => {
            commands::attach::attach_file(&repository, command).await
        }
        cli::Commands::Comment(command) => {
            commands::comment::comment_command(&repository, command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so listings stay clean.
fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter),
        )
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::AmbiguousId(tasks)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in tasks {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidRecurrence(s)) => {
            eprintln!(
                "{} Invalid recurrence: {}",
                "Error:".style(error_style),
                s.yellow()
            );
        }
        Some(CoreError::AlreadyCompleted(title)) => {
            eprintln!(
                "{} '{}' is already completed",
                "Error:".style(error_style),
                title
            );
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
