// src/cli/mod.rs — CLI definition (clap derive)

pub mod edit;
pub mod exercises;
pub mod plan;
pub mod progress;
pub mod verify;

use std::io::Read;
use std::path::Path;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "liftloop",
    about = "Generate, verify and refine weekly workout plans",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a plan for a profile and refine it until it verifies
    Plan {
        /// Profile JSON file ("-" for stdin). Missing fields use defaults.
        #[arg(short, long)]
        profile: Option<String>,
        /// Revision passes after the first (overrides config)
        #[arg(long)]
        max_revisions: Option<u32>,
        /// Write the envelope here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Suppress progress output (only emit the envelope)
        #[arg(long)]
        quiet: bool,
    },
    /// Verify an existing plan against a profile
    Verify {
        /// Plan JSON file ("-" for stdin)
        #[arg(long)]
        plan: String,
        /// Profile JSON file. Missing fields use defaults.
        #[arg(short, long)]
        profile: Option<String>,
        /// Run the deterministic checks only (no model call)
        #[arg(long, conflicts_with = "semantic_only")]
        fast_only: bool,
        /// Skip the deterministic checks
        #[arg(long)]
        semantic_only: bool,
    },
    /// Apply a JSON list of edits to a plan
    Edit {
        /// Plan JSON file
        #[arg(long)]
        plan: String,
        /// Edits JSON file: a list of {type, reason, loc, payload}
        #[arg(long)]
        edits: String,
        /// Write the edited plan here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Search the local exercise catalog
    Exercises {
        /// Words to look for in names, muscles and equipment
        #[arg(default_value = "")]
        query: String,
        /// Only this movement pattern (squat, hinge, push, pull)
        #[arg(long)]
        pattern: Option<String>,
        /// Maximum number of results
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to bind on 127.0.0.1 (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Read a JSON document from `path`, or stdin when `path` is "-".
pub fn read_json(path: &str) -> anyhow::Result<serde_json::Value> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(Path::new(path))
            .map_err(|e| anyhow::anyhow!("cannot read '{path}': {e}"))?
    };
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("'{path}' is not valid JSON: {e}"))
}

/// Pretty-print `value` to `output`, or stdout when `None`.
pub fn write_json<T: serde::Serialize>(value: &T, output: Option<&str>) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))?;
            eprintln!("Wrote {path}");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
