//! Floorboard - Your Building's Message Board
//!
//! A terminal front-end for the resident message board, running against an
//! in-memory backend.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive session as a seeded resident
//! floorboard session --email maya@tower.example --password maya-secret
//!
//! # Scripted walkthrough with simulated neighbors
//! floorboard demo
//!
//! # Print the floor directory
//! floorboard floors
//! ```

mod demo;
mod display;
mod shell;
mod view;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use floorboard_client::{ClientConfig, ClientConfigBuilder, Transition};
use floorboard_core::{Floor, MemoryBackend, Message, MessageId, Principal};
use floorboard_logging::{FloorboardSubscriberBuilder, LogConfig, WorkerGuard};
use tokio::io::{AsyncBufReadExt, BufReader};

use display::*;
use shell::{Flow, Shell};

/// Floorboard - Your Building's Message Board
#[derive(Parser)]
#[command(name = "floorboard")]
#[command(about = "Floor-by-floor message board for residents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Client config file (TOML)
    #[arg(short, long, env = "FLOORBOARD_CONFIG")]
    config: Option<String>,

    /// Default log level
    #[arg(long, env = "FLOORBOARD_LOG", default_value = "warn")]
    log_level: String,

    /// Write JSONL logs to this directory instead of the terminal
    #[arg(long, env = "FLOORBOARD_LOG_DIR")]
    log_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session as a seeded resident
    Session {
        /// Resident email
        #[arg(short, long, env = "FLOORBOARD_EMAIL", default_value = "maya@tower.example")]
        email: String,
        /// Resident password
        #[arg(short, long, default_value = "maya-secret")]
        password: String,
        /// Display name shown on posts
        #[arg(short, long, env = "FLOORBOARD_NAME", default_value = "Maya")]
        name: String,
        /// Require this building passcode before signing in
        #[arg(long)]
        passcode: Option<String>,
        /// Feed window height in lines
        #[arg(long, default_value_t = 12)]
        rows: usize,
    },
    /// Scripted walkthrough with simulated neighbors
    Demo {
        /// Skip the pauses between steps
        #[arg(long)]
        fast: bool,
    },
    /// Print the floor directory
    Floors,
}

fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(&path[2..]);
    }
    PathBuf::from(path)
}

/// Defaults for a terminal, where one scroll unit is one line
fn terminal_config() -> Result<ClientConfig> {
    Ok(ClientConfigBuilder::new().scroll_threshold(1.0).build()?)
}

/// `--config` if given, else the user config file if one exists, else
/// terminal defaults
fn load_config(path: Option<&str>) -> Result<ClientConfig> {
    let path = match path {
        Some(path) => Some(expand_path(path)),
        None => dirs::config_dir()
            .map(|dir| dir.join("floorboard").join("config.toml"))
            .filter(|path| path.exists()),
    };
    match path {
        Some(path) => ClientConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => terminal_config(),
    }
}

fn init_logging(level: &str, log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    FloorboardSubscriberBuilder::new()
        .with_config(LogConfig::terminal(log_dir.map(expand_path)))
        .with_level(level)
        .init()
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_level, cli.log_dir.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Session {
            email,
            password,
            name,
            passcode,
            rows,
        } => cmd_session(config, &email, &password, &name, passcode.as_deref(), rows).await,
        Commands::Demo { fast } => {
            let pace = if fast {
                Duration::ZERO
            } else {
                Duration::from_millis(600)
            };
            demo::run(config, pace).await
        }
        Commands::Floors => {
            print_floor_directory(Floor::new(1));
            Ok(())
        }
    }
}

async fn cmd_session(
    config: ClientConfig,
    email: &str,
    password: &str,
    name: &str,
    passcode: Option<&str>,
    rows: usize,
) -> Result<()> {
    print_banner();

    let backend = Arc::new(MemoryBackend::new());
    backend.add_resident(email, password, Some(name), true);
    seed_neighbors(&backend);
    backend.set_building_passcode(passcode);

    let mut shell = Shell::new(backend, config, rows.max(1));
    if passcode.is_some() {
        shell = shell.with_passcode_gate();
        print_info("Unlock the building with /unlock <passcode>");
    }
    print_info(&format!("Sign in with: /login {} {}", email, password));
    print_interactive_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&shell.location());
        io::stdout().flush()?;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if shell.handle(input).await? == Flow::Quit {
                    break;
                }
            }
            transition = shell.next_transition() => {
                if transition != Transition::Ignored {
                    println!();
                    shell.on_transition(transition);
                }
            }
        }
    }

    println!("{}", "Session ended.".dimmed());
    Ok(())
}

/// A few neighbors and some history so the board isn't empty
fn seed_neighbors(backend: &MemoryBackend) {
    let ana = backend.add_resident("ana@tower.example", "ana-secret", Some("Ana"), true);
    let bo = backend.add_resident("bo@tower.example", "bo-secret", None, true);
    let now = Utc::now();

    let history: [(&Principal, u32, &str, i64); 5] = [
        (&ana, 12, "Package room is full again, grab yours when you can.", 50),
        (&bo, 12, "Thanks for the heads up!", 49),
        (&ana, Floor::GENERAL.number(), "Rooftop BBQ this Saturday at 5.", 30),
        (&bo, 5, "Found a blue umbrella by the elevator.", 26),
        (&ana, 12, "Quiet hours start at 10 tonight, movers coming early.", 2),
    ];
    for (index, (author, floor, text, hours_ago)) in history.into_iter().enumerate() {
        backend.seed_message(Message {
            id: MessageId::new(format!("seed-{}", index + 1)),
            floor: Floor::new(floor),
            text: text.to_string(),
            author_id: author.id.clone(),
            author_label: author.author_label(),
            created_at: now - ChronoDuration::hours(hours_ago),
        });
    }
}
