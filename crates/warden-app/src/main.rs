//! Warden - forum content moderation service.
//!
//! Runs the moderation HTTP API and provides operator commands for content
//! filters, automated enforcement, audit trails and the stored moderation
//! policy.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_core::config::SYSTEM_MODERATOR_ID;
use warden_core::filter::{FilterAction, FilterCategory, FilterRule, FilterType};
use warden_core::ContentType;
use warden_server::{Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use warden_storage::models::NewContentFilter;
use warden_storage::Database;

/// Warden - forum content moderation service
#[derive(Parser, Debug)]
#[command(name = "warden", version, about)]
struct Args {
    /// Database file (defaults to the app data directory)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the moderation HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Manage content filters
    Filter {
        #[command(subcommand)]
        command: FilterCommand,
    },

    /// Run automated filter enforcement on stored content
    Enforce {
        /// Content type (topic or post)
        #[arg(long, value_parser = parse_content_type)]
        content_type: ContentType,

        /// Content id
        #[arg(long)]
        id: i64,
    },

    /// Print the audit trail of a topic or post
    Logs {
        /// Content type (topic or post)
        #[arg(long, value_parser = parse_content_type)]
        content_type: ContentType,

        /// Content id
        #[arg(long)]
        id: i64,
    },

    /// Inspect the moderation policy
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FilterCommand {
    /// Add a filter
    Add {
        /// Match strategy (keyword, regex, domain)
        #[arg(long = "type", value_parser = parse_filter_type)]
        filter_type: FilterType,

        /// Keyword, regex or domain to match
        #[arg(long)]
        pattern: String,

        /// Category (hate_speech, adult_content, spam, personal_info)
        #[arg(long, value_parser = parse_category)]
        category: FilterCategory,

        /// What a match does (flag, block, delete)
        #[arg(long, value_parser = parse_action, default_value = "flag")]
        action: FilterAction,

        /// Create the filter disabled
        #[arg(long)]
        disabled: bool,
    },

    /// List all filters
    List,

    /// Enable a filter
    Enable { id: i64 },

    /// Disable a filter
    Disable { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective moderation policy as JSON
    Show,
}

fn parse_filter_type(s: &str) -> Result<FilterType, String> {
    FilterType::parse(s).ok_or_else(|| format!("unknown filter type: {}", s))
}

fn parse_category(s: &str) -> Result<FilterCategory, String> {
    FilterCategory::parse(s).ok_or_else(|| format!("unknown category: {}", s))
}

fn parse_action(s: &str) -> Result<FilterAction, String> {
    FilterAction::parse(s).ok_or_else(|| format!("unknown filter action: {}", s))
}

fn parse_content_type(s: &str) -> Result<ContentType, String> {
    ContentType::parse(s).ok_or_else(|| format!("unknown content type: {}", s))
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "warden", "warden").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warden={0},warden_core={0},warden_storage={0},warden_server={0},tower_http={0},warn",
            log_level
        ))
    });

    // Only the long-running server writes a log file
    if matches!(args.command, Command::Serve { .. }) {
        if let Some(log_dir) = logs_dir() {
            if std::fs::create_dir_all(&log_dir).is_ok() {
                let file_appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .max_log_files(5)
                    .filename_prefix("warden")
                    .filename_suffix("log")
                    .build(&log_dir)
                    .ok();

                if let Some(appender) = file_appender {
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stdout))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();

                    tracing::info!("Logging to {:?}", log_dir);
                    return Some(guard);
                }
            }
        }
    }

    // Console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    None
}

fn open_database(args: &Args) -> anyhow::Result<Database> {
    let db = match &args.db_path {
        Some(path) => Database::with_path(path),
        None => Database::new(),
    }
    .context("failed to open database")?;

    Ok(db)
}

async fn serve(db: Database, host: String, port: u16) -> anyhow::Result<()> {
    let config = ServerConfig::default().with_host(host).with_port(port);
    let server = Server::with_database(config, db)?;

    server.run().await?;
    Ok(())
}

fn run_filter_command(db: &Database, command: FilterCommand) -> anyhow::Result<()> {
    match command {
        FilterCommand::Add {
            filter_type,
            pattern,
            category,
            action,
            disabled,
        } => {
            let filter = db.create_filter(NewContentFilter {
                rule: FilterRule::new(filter_type, pattern, category, action),
                enabled: !disabled,
                created_by: SYSTEM_MODERATOR_ID,
            })?;
            println!("Created filter {}", filter.id);
        }
        FilterCommand::List => {
            for filter in db.get_filters()? {
                println!(
                    "{:>4}  {:<8} {:<14} {:<6} {:<8} {}",
                    filter.id,
                    filter.rule.filter_type.as_str(),
                    filter.rule.category.as_str(),
                    filter.rule.action.as_str(),
                    if filter.enabled { "enabled" } else { "disabled" },
                    filter.rule.pattern
                );
            }
        }
        FilterCommand::Enable { id } => {
            db.set_filter_enabled(id, true)?;
            println!("Enabled filter {}", id);
        }
        FilterCommand::Disable { id } => {
            db.set_filter_enabled(id, false)?;
            println!("Disabled filter {}", id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep guard alive for the duration of the program
    let _log_guard = init_logging(&args);

    tracing::debug!("Args: {:?}", args);

    let db = open_database(&args)?;

    match args.command {
        Command::Serve { host, port } => {
            tracing::info!("Starting Warden...");
            serve(db, host, port).await?;
            tracing::info!("Warden shutting down");
        }
        Command::Filter { command } => run_filter_command(&db, command)?,
        Command::Enforce { content_type, id } => {
            let outcome = db.enforce_filters(content_type, id)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Logs { content_type, id } => {
            let logs = db.content_logs(content_type, id)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        Command::Config {
            command: ConfigCommand::Show,
        } => {
            let config = db.moderation_config()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
