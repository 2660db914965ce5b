// src/cli/verify.rs — `liftloop verify`: check an existing plan

use crate::core::orchestrator::Oracles;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::oracle::GuidelineTable;
use crate::plan::parser::coerce_plan;
use crate::plan::{UserProfile, WorkoutPlan};
use crate::verifier::{
    fast_verify, mechanical_edits_from_fast_check, ProgressionReport, VerificationReport, Verifier,
};

const FAST_ONLY_NOTE: &str = "Semantic checks not run (--fast-only)";

/// Deterministic checks only, with their mechanical edits.
pub fn fast_report(
    profile: &UserProfile,
    plan: &WorkoutPlan,
    guidelines: &GuidelineTable,
) -> VerificationReport {
    let fast = fast_verify(profile, plan, guidelines);
    let edits = mechanical_edits_from_fast_check(plan, &fast);
    VerificationReport::from_parts(fast, ProgressionReport::passing(FAST_ONLY_NOTE), edits)
}

pub async fn run_verify(
    config: &Config,
    plan_path: &str,
    profile_path: Option<&str>,
    fast_only: bool,
    semantic_only: bool,
) -> anyhow::Result<()> {
    let plan = coerce_plan(&super::read_json(plan_path)?)?;
    let (profile, _) = super::plan::load_profile(profile_path)?;

    let report = if fast_only {
        let guidelines =
            GuidelineTable::load_or_empty(&paths::resolve_data_file(&config.data.guidelines))?;
        fast_report(&profile, &plan, &guidelines)
    } else {
        let oracles = Oracles::from_config(config)?;
        let verifier = Verifier::new(oracles.semantic, oracles.resolver);
        verifier.verify_plan(&profile, &plan, semantic_only).await
    };

    tracing::info!(
        ok = report.ok,
        edits = report.suggested_edits.len(),
        "verification finished"
    );
    super::write_json(&report, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{WorkoutBlock, WorkoutDay, WorkoutExercise};

    #[test]
    fn test_fast_report_flags_missing_patterns() {
        let plan = WorkoutPlan::new(vec![WorkoutDay::new(
            "Upper",
            None,
            vec![WorkoutBlock::new(
                "Main",
                vec![
                    WorkoutExercise::new("Bench Press", 3, "5"),
                    WorkoutExercise::new("Pull Up", 3, "8"),
                ],
            )],
        )]);
        let report = fast_report(&UserProfile::default(), &plan, &GuidelineTable::empty());

        assert!(!report.ok);
        assert!(report.fast_check_failed);
        assert_eq!(report.progression.notes, FAST_ONLY_NOTE);
        assert_eq!(report.suggested_edits.len(), 2);
        assert!(report
            .suggested_edits
            .iter()
            .all(|e| e.type_name() == "add_note"));
    }
}
