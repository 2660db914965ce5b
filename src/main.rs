// src/main.rs — liftloop entry point

use std::sync::Arc;

use clap::Parser;

use liftloop::api::{self, ApiState};
use liftloop::cli::{Cli, Commands};
use liftloop::core::orchestrator::Orchestrator;
use liftloop::infra::config::Config;
use liftloop::infra::{logger, paths};
use liftloop::oracle::ExerciseCatalog;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    let mut config = config.with_env_overrides()?;

    match cli.command {
        Commands::Plan {
            profile,
            max_revisions,
            output,
            quiet,
        } => {
            liftloop::cli::plan::run_plan(
                &config,
                profile.as_deref(),
                max_revisions,
                output.as_deref(),
                quiet,
            )
            .await
        }
        Commands::Verify {
            plan,
            profile,
            fast_only,
            semantic_only,
        } => {
            liftloop::cli::verify::run_verify(
                &config,
                &plan,
                profile.as_deref(),
                fast_only,
                semantic_only,
            )
            .await
        }
        Commands::Edit {
            plan,
            edits,
            output,
        } => liftloop::cli::edit::run_edit(&plan, &edits, output.as_deref()),
        Commands::Exercises { query, pattern, k } => {
            liftloop::cli::exercises::run_exercises(&config, &query, pattern.as_deref(), k)
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.api.port = port;
            }
            let orchestrator = Orchestrator::from_config(&config, config.orchestration())?;
            let catalog = ExerciseCatalog::load_or_empty(&paths::resolve_data_file(
                &config.data.exercises,
            ))?;
            let state = ApiState::new(orchestrator).with_catalog(Arc::new(catalog));
            api::start_server(&config.api, state).await
        }
    }
}
