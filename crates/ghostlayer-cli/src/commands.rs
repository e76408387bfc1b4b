//! Subcommand handlers

use anyhow::Context;
use ghostlayer_core::{Category, Match, WhitelistEntry};
use ghostlayer_redact::{find_tags, restore, validate_custom_pattern_with};
use ghostlayer_session::{JsonFileRuleStore, Session};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::{Commands, PatternCommand, RuleCommand, WhitelistCommand};

pub(crate) async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Detect { input, json } => {
            let session = analyze(config, input.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.matches())?);
            } else {
                for m in session.matches() {
                    println!("{}", format_match(m));
                }
            }
        }
        Commands::Redact { input, matches_out } => {
            let session = analyze(config, input.as_deref()).await?;
            if let Some(path) = matches_out {
                let data = serde_json::to_vec_pretty(session.matches())?;
                tokio::fs::write(&path, data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {} matches to {}", session.matches().len(), path.display());
            }
            println!("{}", session.redacted_text());
        }
        Commands::Restore { matches, input } => {
            let output = restore_file(&matches, input.as_deref()).await?;
            println!("{}", output);
        }
        Commands::Stats { input } => {
            let session = analyze(config, input.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&session.stats())?);
        }
        Commands::CheckPattern { pattern } => {
            let compiled = validate_custom_pattern_with(&pattern, &config.engine.safety)?;
            println!("Pattern accepted: {}", compiled.source);
        }
        Commands::Categories => {
            for category in Category::ALL {
                let meta = category.meta();
                println!("{:<22} {:<28} {}", meta.wire_name, meta.label, meta.style);
            }
        }
        Commands::Rule(command) => manage_rules(config, command).await?,
        Commands::Pattern(command) => manage_patterns(config, command).await?,
        Commands::Whitelist(command) => manage_whitelist(config, command).await?,
    }

    Ok(())
}

async fn open_session(config: &AppConfig) -> anyhow::Result<(Session, JsonFileRuleStore)> {
    let store = JsonFileRuleStore::new(config.store_path()?);
    let session = Session::load(config.session_config(), &store).await?;
    Ok((session, store))
}

/// Load the stored rules and run detection over the input
async fn analyze(config: &AppConfig, input: Option<&Path>) -> anyhow::Result<Session> {
    let text = read_input(input).await?;
    let (mut session, _) = open_session(config).await?;
    session.set_text(text);
    Ok(session)
}

async fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

async fn restore_file(matches_path: &Path, input: Option<&Path>) -> anyhow::Result<String> {
    let data = tokio::fs::read_to_string(matches_path)
        .await
        .with_context(|| format!("Failed to read {}", matches_path.display()))?;
    let matches: Vec<Match> = serde_json::from_str(&data)
        .with_context(|| format!("Invalid match list in {}", matches_path.display()))?;

    let tagged = read_input(input).await?;
    let output = restore(&tagged, &matches);

    let unresolved = find_tags(&output).len();
    if unresolved > 0 {
        warn!("{} tags had no matching original and were left as is", unresolved);
    }
    Ok(output)
}

async fn manage_rules(config: &AppConfig, command: RuleCommand) -> anyhow::Result<()> {
    let (mut session, store) = open_session(config).await?;

    match command {
        RuleCommand::Add { text, category } => match session.add_user_rule(&text, category) {
            Some(id) => println!("{}", id),
            None => {
                println!("Rule is empty or already exists");
                return Ok(());
            }
        },
        RuleCommand::List => {
            for rule in &session.rules().user_rules {
                println!(
                    "{} {} {:<14} {}",
                    rule.id,
                    enabled_marker(rule.enabled),
                    rule.category,
                    rule.text
                );
            }
            return Ok(());
        }
        RuleCommand::Toggle { id } => session.toggle_user_rule(&id)?,
        RuleCommand::Remove { id } => {
            let removed = session.remove_user_rule(&id)?;
            println!("Removed rule '{}'", removed.text);
        }
    }

    save(&session, &store).await
}

async fn manage_patterns(config: &AppConfig, command: PatternCommand) -> anyhow::Result<()> {
    let (mut session, store) = open_session(config).await?;

    match command {
        PatternCommand::Add {
            name,
            regex,
            category,
        } => {
            let id = session.add_custom_pattern(&name, &regex, category)?;
            println!("{}", id);
        }
        PatternCommand::List => {
            for pattern in &session.rules().custom_patterns {
                println!(
                    "{} {} {:<14} {:<20} {}",
                    pattern.id,
                    enabled_marker(pattern.active),
                    pattern.category,
                    pattern.name,
                    pattern.regex
                );
            }
            return Ok(());
        }
        PatternCommand::Toggle { id } => session.toggle_custom_pattern(&id)?,
        PatternCommand::Remove { id } => {
            let removed = session.remove_custom_pattern(&id)?;
            println!("Removed pattern '{}'", removed.name);
        }
    }

    save(&session, &store).await
}

async fn manage_whitelist(config: &AppConfig, command: WhitelistCommand) -> anyhow::Result<()> {
    let (mut session, store) = open_session(config).await?;

    let changed = match command {
        WhitelistCommand::Add { phrase } => session.add_to_whitelist(phrase),
        WhitelistCommand::AddCategory { category } => session.add_to_whitelist(category),
        WhitelistCommand::Remove { phrase } => {
            session.remove_from_whitelist(&WhitelistEntry::Phrase(phrase))
        }
        WhitelistCommand::RemoveCategory { category } => {
            session.remove_from_whitelist(&WhitelistEntry::Category(category))
        }
        WhitelistCommand::List => {
            for entry in &session.rules().whitelist {
                println!("{}", format_whitelist_entry(entry));
            }
            return Ok(());
        }
    };

    if !changed {
        println!("Whitelist unchanged");
        return Ok(());
    }
    save(&session, &store).await
}

/// Persist the rules and surface the session's notification on stderr
async fn save(session: &Session, store: &JsonFileRuleStore) -> anyhow::Result<()> {
    session.persist(store).await?;
    if let Some(notification) = session.notification() {
        eprintln!("{}", notification.message);
    }
    info!("Rule store updated at {}", store.path().display());
    Ok(())
}

fn enabled_marker(enabled: bool) -> &'static str {
    if enabled { "[on] " } else { "[off]" }
}

fn format_match(m: &Match) -> String {
    format!(
        "{:>6}..{:<6} {:<16} {:<20} {}",
        m.start,
        m.end,
        m.category,
        m.replacement_tag.as_deref().unwrap_or("-"),
        m.text
    )
}

fn format_whitelist_entry(entry: &WhitelistEntry) -> String {
    match entry {
        WhitelistEntry::Phrase(phrase) => format!("phrase   {}", phrase),
        WhitelistEntry::Category(category) => format!("category {}", category),
    }
}
