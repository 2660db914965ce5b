// src/cli/plan.rs — `liftloop plan`: generate and refine a plan for a profile

use crate::core::orchestrator::Orchestrator;
use crate::infra::config::Config;
use crate::plan::{followup_questions, ProfilePatch, UserProfile};

use super::progress::terminal_progress;

/// Build the profile for a run: the file (if any) overlaid on defaults.
/// Returns the clarifying questions a caller may want to surface.
pub fn load_profile(path: Option<&str>) -> anyhow::Result<(UserProfile, Vec<String>)> {
    let patch = match path {
        Some(path) => {
            let value = super::read_json(path)?;
            serde_json::from_value::<ProfilePatch>(value)
                .map_err(|e| anyhow::anyhow!("invalid profile in '{path}': {e}"))?
        }
        None => ProfilePatch::default(),
    };
    let profile = patch.resolve()?;
    let questions = followup_questions(&profile, &patch);
    Ok((profile, questions))
}

pub async fn run_plan(
    config: &Config,
    profile_path: Option<&str>,
    max_revisions: Option<u32>,
    output: Option<&str>,
    quiet: bool,
) -> anyhow::Result<()> {
    let (profile, questions) = load_profile(profile_path)?;
    if !quiet {
        for q in &questions {
            eprintln!("[assume] {q}");
        }
    }

    let mut orchestration = config.orchestration();
    if let Some(n) = max_revisions {
        orchestration.max_revisions = n;
    }

    let mut orchestrator = Orchestrator::from_config(config, orchestration)?;
    if !quiet {
        orchestrator = orchestrator.with_progress(terminal_progress());
    }

    let envelope = orchestrator.run(&profile).await;
    if let Some(reason) = envelope.stopped_reason() {
        tracing::info!(%reason, "plan returned without passing verification");
    }
    super::write_json(&envelope, output)
}
