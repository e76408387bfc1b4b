//! GhostLayer CLI
//!
//! Detects and redacts sensitive data in text, restores tagged text, and
//! manages the persistent rule store.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use ghostlayer_core::Category;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "ghostlayer")]
#[command(about = "GhostLayer - reversible redaction of sensitive data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "GHOSTLAYER_CONFIG",
        global = true
    )]
    config: Option<PathBuf>,

    /// Rule store path (overrides config and GHOSTLAYER_STORE)
    #[arg(long, value_name = "FILE", global = true)]
    store: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List detected matches
    Detect {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print matches as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Print the text with every redacted match replaced by its tag
    Redact {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write the match list here for a later `restore`
        #[arg(long, value_name = "FILE")]
        matches_out: Option<PathBuf>,
    },
    /// Replace tags with the original values
    Restore {
        /// Match list written by `redact --matches-out`
        #[arg(long, value_name = "FILE")]
        matches: PathBuf,

        /// Tagged input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Print redaction statistics as JSON
    Stats {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Run a custom pattern through the safety gate
    CheckPattern {
        pattern: String,
    },
    /// List every category with its tag name and label
    Categories,
    /// Manage user rules ("Memory")
    #[command(subcommand)]
    Rule(RuleCommand),
    /// Manage custom patterns
    #[command(subcommand)]
    Pattern(PatternCommand),
    /// Manage whitelist entries
    #[command(subcommand)]
    Whitelist(WhitelistCommand),
}

#[derive(Subcommand)]
enum RuleCommand {
    /// Always redact this phrase
    Add {
        text: String,

        #[arg(long, default_value = "MEMORY")]
        category: Category,
    },
    List,
    /// Enable or disable a rule
    Toggle { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum PatternCommand {
    /// Add a regex; it must pass the safety gate
    Add {
        name: String,
        regex: String,

        #[arg(long, default_value = "CUSTOM")]
        category: Category,
    },
    List,
    /// Activate or deactivate a pattern
    Toggle { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum WhitelistCommand {
    /// Never redact this phrase
    Add { phrase: String },
    /// Never redact this category
    AddCategory { category: Category },
    List,
    Remove { phrase: String },
    RemoveCategory { category: Category },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(path) = &cli.config {
        AppConfig::from_file(path)?
    } else {
        AppConfig::default()
    };

    // Merge environment variables (they override config file)
    config.merge_env();

    // CLI flag has the highest precedence
    if let Some(store) = &cli.store {
        config.store.path = store.clone();
    }

    init_logging(&config.logging.level)?;
    debug!("Using rule store {}", config.store.path);

    commands::run(cli.command, &config).await
}

/// Logs go to stderr; stdout carries command output
fn init_logging(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}", log_level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
