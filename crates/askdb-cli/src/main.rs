//! `askdb`: ask a question from the terminal, or start the HTTP service.
use anyhow::{Context, Result};
use askdb_api::{build_runner, build_state, telemetry, ApiError};
use askdb_core::{AppConfig, ExecutionContext, QueryResponse, StateUpdate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "askdb", version, about = "Answer natural-language questions over a PostgreSQL database")]
struct Cli {
    /// YAML configuration file; environment variables override it
    #[arg(long, global = true, env = "ASKDB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and print each step
    Ask {
        question: String,

        /// Print only the final response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP service
    Serve {
        /// Listen address (overrides config and ASKDB_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Ask { question, json } => ask(&config, &question, json).await,
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            let state = build_state(&config).await.context("starting pipeline")?;
            askdb_api::run(&config.server.addr, state)
                .await
                .context("serving HTTP")
        }
    }
}

async fn ask(config: &AppConfig, question: &str, json: bool) -> Result<()> {
    let runner = build_runner(config).await.context("starting pipeline")?;
    let ctx = ExecutionContext::new();

    let outcome = runner
        .run_with(question, &ctx, |stage, update| {
            if !json {
                println!("{}", format_update(stage, update));
            }
        })
        .await;

    // Same wording as the HTTP service's error details.
    let (final_state, _) = outcome.map_err(|e| anyhow::anyhow!(ApiError::from(e).detail()))?;

    if json {
        let response = QueryResponse::from(final_state);
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

fn format_update(stage: &str, update: &StateUpdate) -> String {
    format!("[{stage}] {}: {}", update.field(), update.value())
}
