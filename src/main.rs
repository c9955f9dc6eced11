//! Almanac CLI
//!
//! Command-line interface for Almanac operations:
//! - Serve the HTTP API
//! - Rebuild the index from OpenAgenda or a local export
//! - Ask questions, or inspect intent and context without generation
//! - Generate a default config file

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use almanac::api::dto::{AskResponse, IntentDto};
use almanac::api::{self, AppState};
use almanac::catalog::FileSource;
use almanac::config::{generate_default_config, Config};
use almanac::logging::init_tracing;
use almanac::rag::Services;
use almanac::retrieval::{extract_intent, IntentWindow};
use almanac::time::{Clock, Timestamp};

#[derive(Parser)]
#[command(name = "almanac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ask questions about upcoming cultural events")]
#[command(long_about = "Almanac indexes an OpenAgenda catalog and answers questions grounded on it.\nDates in the question (\"demain\", \"ce week-end\", \"en juillet\") restrict the answer to that period.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serve a synthetic event instead of calling OpenAgenda
    #[arg(long, global = true)]
    pub mock: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Rebuild at startup when no persisted index is usable
        #[arg(long)]
        rebuild: bool,
    },

    /// Refetch the catalog and rebuild the index
    Rebuild {
        /// Read events from a JSON export instead of the configured source
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Answer a question
    Ask {
        /// The question, in French or English
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Show the context that would be sent to the language model
    Context {
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Show the period a question refers to
    Intent {
        #[arg(required = true)]
        question: Vec<String>,
        /// Reference instant (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default(),
    };
    if cli.mock {
        config.source.mock = true;
    }

    init_tracing(&config.logging);
    let json = cli.format == "json";

    match cli.command {
        Commands::Serve { rebuild } => {
            let services = Services::from_config(&config)?;

            if !services.rebuilder.load_persisted().await && rebuild {
                match services.rebuilder.rebuild().await {
                    Ok(report) => tracing::info!(events = report.events, "Initial rebuild done"),
                    Err(e) => tracing::warn!("Initial rebuild failed: {}", e),
                }
            }

            let state = AppState::new(services, config.api.clone());
            api::serve(state, &config.api).await?;
        }

        Commands::Rebuild { from_file } => {
            let services = match from_file {
                Some(path) => {
                    Services::with_source(&config, Box::new(FileSource::new(path)))?
                }
                None => Services::from_config(&config)?,
            };

            let report = services.rebuilder.rebuild().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Index rebuilt in {} ms", report.duration_ms);
                println!("  Fetched: {}", report.fetched);
                println!("  Retained: {}", report.retained);
                println!("  Events: {}", report.events);
                println!("  Chunks: {}", report.chunks);
                println!("  Data directory: {:?}", services.store.data_dir());
            }
        }

        Commands::Ask { question } => {
            let services = ready_services(&config).await?;
            let answer = services.assistant.ask(&question.join(" ")).await?;

            if json {
                let body = AskResponse::from(answer);
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", answer.answer);
                if !answer.sources.is_empty() {
                    println!();
                    println!("Sources ({}):", answer.intent.display);
                    for source in &answer.sources {
                        println!(
                            "  [{:.3}] {} {}",
                            source.score,
                            source.title,
                            source.url.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
        }

        Commands::Context { question } => {
            let services = ready_services(&config).await?;
            let question = question.join(" ");
            let retrieval = services
                .assistant
                .retrieve(&question, services.clock.now())
                .await?;

            if json {
                let body = serde_json::json!({
                    "intent": IntentDto::from(&retrieval.intent),
                    "documents": retrieval.context.documents,
                    "context": retrieval.context.text,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_intent(&retrieval.intent, services.clock);
                println!("Documents: {}", retrieval.context.documents.len());
                println!("{}", "-".repeat(60));
                println!("{}", retrieval.context.text);
            }
        }

        Commands::Intent { question, at } => {
            let clock = config.clock()?;
            let now = match at {
                Some(raw) => parse_instant(&raw, clock)?,
                None => clock.now(),
            };
            let intent = extract_intent(&question.join(" "), now);

            if json {
                println!("{}", serde_json::to_string_pretty(&IntentDto::from(&intent))?);
            } else {
                print_intent(&intent, clock);
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Services with the persisted index loaded
async fn ready_services(config: &Config) -> anyhow::Result<Services> {
    let services = Services::from_config(config)?;
    if !services.rebuilder.load_persisted().await {
        eprintln!("No usable index yet, greetings only. Build one with:");
        eprintln!("  almanac rebuild");
    }
    Ok(services)
}

fn parse_instant(raw: &str, clock: Clock) -> anyhow::Result<DateTime<FixedOffset>> {
    let instant = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid RFC 3339 instant: {}", raw))?;
    Ok(instant.with_timezone(&clock.offset()))
}

fn format_bound(ts: Timestamp, clock: Clock) -> String {
    clock
        .local(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn print_intent(intent: &IntentWindow, clock: Clock) {
    println!("Intent: {} ({})", intent.kind, intent.display);
    match intent.bounds {
        Some(window) if window.is_open_ended() => {
            println!("Window: from {}", format_bound(window.start, clock));
        }
        Some(window) => {
            println!(
                "Window: {} -> {}",
                format_bound(window.start, clock),
                format_bound(window.end, clock)
            );
        }
        None => println!("Window: none"),
    }
}
