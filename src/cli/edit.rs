// src/cli/edit.rs — `liftloop edit`: apply wire-format edits to a plan

use crate::edits::{apply_raw_edits, RawEdit};
use crate::plan::parser::coerce_plan;
use crate::plan::WorkoutPlan;

/// Parse `edits` (a JSON list) and apply them to `plan` in order.
pub fn edit_plan(plan: &WorkoutPlan, edits: serde_json::Value) -> anyhow::Result<WorkoutPlan> {
    let raw: Vec<RawEdit> = serde_json::from_value(edits)
        .map_err(|e| anyhow::anyhow!("edits must be a list of edit objects: {e}"))?;
    Ok(apply_raw_edits(plan, &raw))
}

pub fn run_edit(plan_path: &str, edits_path: &str, output: Option<&str>) -> anyhow::Result<()> {
    let plan = coerce_plan(&super::read_json(plan_path)?)?;
    let edited = edit_plan(&plan, super::read_json(edits_path)?)?;

    if let Some(err) = edited.metadata.get_str("edit_error") {
        eprintln!("[edit] stopped early: {err}");
    }
    super::write_json(&edited, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{WorkoutBlock, WorkoutDay, WorkoutExercise};
    use serde_json::json;

    fn plan() -> WorkoutPlan {
        WorkoutPlan::new(vec![WorkoutDay::new(
            "Lower",
            None,
            vec![WorkoutBlock::new(
                "Main",
                vec![WorkoutExercise::new("Back Squat", 5, "5")],
            )],
        )])
    }

    #[test]
    fn test_edit_plan_applies_tune_sets() {
        let edits = json!([{
            "type": "tune_sets",
            "reason": "too much volume",
            "loc": {"day_idx": 0, "block_idx": 0, "ex_idx": 0},
            "payload": {"sets": 3}
        }]);
        let edited = edit_plan(&plan(), edits).unwrap();
        assert_eq!(edited.exercise(0, 0, 0).unwrap().sets, 3);
        assert!(edited.metadata.get_str("edit_error").is_none());
    }

    #[test]
    fn test_edit_plan_rejects_non_list() {
        assert!(edit_plan(&plan(), json!({"type": "tune_sets"})).is_err());
    }
}
