// src/edits/engine.rs — Deterministic edit application
//
// Every function returns a new plan; inputs are never mutated. A failing
// edit is checked against the plan before anything is written, so the
// working copy is untouched on error.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use super::types::{Edit, EditKind, ExerciseLoc, RawEdit};
use crate::infra::errors::EditError;
use crate::plan::types::NOTE_SEPARATOR;
use crate::plan::WorkoutPlan;

/// One substitution chosen for an exercise that matched an avoid term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionSuggestion {
    #[serde(default)]
    pub day_idx: Option<usize>,
    #[serde(default)]
    pub block_idx: Option<usize>,
    #[serde(default)]
    pub ex_idx: Option<usize>,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub best: String,
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub rationale: String,
}

pub fn is_mechanical_edit(edit: &Edit) -> bool {
    edit.kind.is_mechanical()
}

/// Partition into (mechanical, semantic), preserving relative order.
pub fn split_edits(edits: &[Edit]) -> (Vec<Edit>, Vec<Edit>) {
    edits.iter().cloned().partition(is_mechanical_edit)
}

fn out_of_bounds(at: impl std::fmt::Display) -> EditError {
    EditError::OutOfBounds {
        location: at.to_string(),
    }
}

fn exercise_slot(
    plan: &mut WorkoutPlan,
    at: ExerciseLoc,
) -> Result<&mut crate::plan::WorkoutExercise, EditError> {
    plan.exercise_mut(at.day_idx, at.block_idx, at.ex_idx)
        .ok_or_else(|| out_of_bounds(at))
}

fn apply_in_place(plan: &mut WorkoutPlan, edit: &Edit) -> Result<(), EditError> {
    match &edit.kind {
        EditKind::ReplaceExercise { at, new_name } => {
            exercise_slot(plan, *at)?.name = new_name.clone();
        }
        EditKind::TuneSets { at, sets } => {
            // Validated at parse time, but hand-built edits reach here too.
            if *sets == 0 {
                return Err(EditError::InvalidField {
                    edit_type: edit.type_name().into(),
                    field: "payload.sets".into(),
                    value: "0".into(),
                });
            }
            exercise_slot(plan, *at)?.sets = *sets;
        }
        EditKind::TuneReps { at, reps } => {
            exercise_slot(plan, *at)?.reps = reps.clone();
        }
        EditKind::AddRest { at, rest_seconds } => {
            exercise_slot(plan, *at)?.rest_seconds = Some(*rest_seconds);
        }
        EditKind::RemoveExercise { at } => {
            plan.exercise(at.day_idx, at.block_idx, at.ex_idx)
                .ok_or_else(|| out_of_bounds(at))?;
            if let Some(block) = plan.block_mut(at.day_idx, at.block_idx) {
                block.exercises.remove(at.ex_idx);
            }
        }
        EditKind::AddExercise { at, exercise } => {
            plan.block_mut(at.day_idx, at.block_idx)
                .ok_or_else(|| out_of_bounds(at))?
                .exercises
                .push(exercise.clone());
        }
        EditKind::AddNote { day_idx, note } => match day_idx {
            Some(d) => {
                let day = plan
                    .day_mut(*d)
                    .ok_or_else(|| out_of_bounds(format!("day {d}")))?;
                day.focus = Some(match day.focus.take().filter(|f| !f.is_empty()) {
                    Some(focus) => format!("{focus}{NOTE_SEPARATOR}{note}"),
                    None => note.clone(),
                });
            }
            None => plan.metadata.append_note("notes", note),
        },
        EditKind::ReorderDays { .. } => {
            return Err(EditError::NotMechanical(edit.type_name().into()));
        }
    }
    Ok(())
}

/// Apply one edit, returning the edited copy.
pub fn apply_edit(plan: &WorkoutPlan, edit: &Edit) -> Result<WorkoutPlan, EditError> {
    let mut next = plan.clone();
    apply_in_place(&mut next, edit)?;
    Ok(next)
}

fn apply_sequence<E, I>(plan: &WorkoutPlan, edits: I) -> WorkoutPlan
where
    E: Borrow<Edit>,
    I: IntoIterator<Item = Result<E, EditError>>,
{
    let mut current = plan.clone();
    let mut applied: u64 = 0;

    for (i, edit) in edits.into_iter().enumerate() {
        let outcome = edit.and_then(|e| apply_in_place(&mut current, e.borrow()));
        if let Err(e) = outcome {
            tracing::warn!(index = i, applied, "Edit sequence stopped: {}", e);
            current
                .metadata
                .append_note("edit_error", &format!("Failed at edit {i}: {e}"));
            current.metadata.add("edits_applied", applied);
            break;
        }
        applied += 1;
    }

    current
}

/// Apply edits in order. The first failure stops the run and is recorded
/// under `edit_error` / `edits_applied`; earlier edits are kept. Counts from
/// earlier failed batches on the same plan accumulate.
pub fn apply_edits(plan: &WorkoutPlan, edits: &[Edit]) -> WorkoutPlan {
    apply_sequence(plan, edits.iter().map(Ok::<&Edit, EditError>))
}

/// Like [`apply_edits`] for unvalidated wire edits: a malformed entry counts
/// as the failing edit at its index.
pub fn apply_raw_edits(plan: &WorkoutPlan, edits: &[RawEdit]) -> WorkoutPlan {
    apply_sequence(plan, edits.iter().cloned().map(Edit::try_from))
}

/// Rename exercises per `subs`. Entries with a missing index, an empty
/// `best`, or an unresolvable location are skipped.
pub fn apply_substitutions(plan: &WorkoutPlan, subs: &[SubstitutionSuggestion]) -> WorkoutPlan {
    let mut next = plan.clone();
    for sub in subs {
        let (Some(d), Some(b), Some(e)) = (sub.day_idx, sub.block_idx, sub.ex_idx) else {
            continue;
        };
        if sub.best.trim().is_empty() {
            continue;
        }
        if let Some(ex) = next.exercise_mut(d, b, e) {
            ex.name = sub.best.clone();
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edits::types::BlockLoc;
    use crate::plan::{WorkoutBlock, WorkoutDay, WorkoutExercise};

    fn plan() -> WorkoutPlan {
        WorkoutPlan::new(vec![
            WorkoutDay::new(
                "Day 1",
                Some("squat"),
                vec![WorkoutBlock::new(
                    "Main",
                    vec![
                        WorkoutExercise::new("Back Squat", 5, "5"),
                        WorkoutExercise::new("Romanian Deadlift", 3, "8"),
                    ],
                )],
            ),
            WorkoutDay::new(
                "Day 2",
                None,
                vec![WorkoutBlock::new(
                    "Main",
                    vec![WorkoutExercise::new("Bench Press", 4, "6")],
                )],
            ),
        ])
    }

    fn loc(d: usize, b: usize, e: usize) -> ExerciseLoc {
        ExerciseLoc::new(d, b, e)
    }

    #[test]
    fn test_replace_exercise() {
        let p = plan();
        let out = apply_edit(&p, &Edit::replace_exercise(loc(0, 0, 0), "Box Squat", "")).unwrap();
        assert_eq!(out.exercise(0, 0, 0).unwrap().name, "Box Squat");
        assert_eq!(p.exercise(0, 0, 0).unwrap().name, "Back Squat");
    }

    #[test]
    fn test_tune_reps_and_rest() {
        let p = plan();
        let out = apply_edit(
            &p,
            &Edit::new(
                EditKind::TuneReps {
                    at: loc(1, 0, 0),
                    reps: "8-10".into(),
                },
                "",
            ),
        )
        .unwrap();
        let out = apply_edit(
            &out,
            &Edit::new(
                EditKind::AddRest {
                    at: loc(1, 0, 0),
                    rest_seconds: 120,
                },
                "",
            ),
        )
        .unwrap();
        let ex = out.exercise(1, 0, 0).unwrap();
        assert_eq!(ex.reps, "8-10");
        assert_eq!(ex.rest_seconds, Some(120));
    }

    #[test]
    fn test_remove_exercise() {
        let out = apply_edit(
            &plan(),
            &Edit::new(EditKind::RemoveExercise { at: loc(0, 0, 0) }, ""),
        )
        .unwrap();
        assert_eq!(out.days[0].blocks[0].exercises.len(), 1);
        assert_eq!(out.exercise(0, 0, 0).unwrap().name, "Romanian Deadlift");
    }

    #[test]
    fn test_remove_exercise_out_of_bounds() {
        let err = apply_edit(
            &plan(),
            &Edit::new(EditKind::RemoveExercise { at: loc(0, 0, 7) }, ""),
        )
        .unwrap_err();
        assert!(matches!(err, EditError::OutOfBounds { .. }));
    }

    #[test]
    fn test_add_exercise_appends() {
        let out = apply_edit(
            &plan(),
            &Edit::new(
                EditKind::AddExercise {
                    at: BlockLoc {
                        day_idx: 1,
                        block_idx: 0,
                    },
                    exercise: WorkoutExercise::new("Chin-up", 3, "AMRAP"),
                },
                "",
            ),
        )
        .unwrap();
        let exs = &out.days[1].blocks[0].exercises;
        assert_eq!(exs.len(), 2);
        assert_eq!(exs[1].name, "Chin-up");
    }

    #[test]
    fn test_add_note_to_day_focus() {
        let p = plan();
        let note = |d| {
            Edit::new(
                EditKind::AddNote {
                    day_idx: Some(d),
                    note: "keep RPE ≤ 8".into(),
                },
                "",
            )
        };
        let out = apply_edit(&p, &note(0)).unwrap();
        assert_eq!(out.days[0].focus.as_deref(), Some("squat | keep RPE ≤ 8"));
        let out = apply_edit(&out, &note(1)).unwrap();
        assert_eq!(out.days[1].focus.as_deref(), Some("keep RPE ≤ 8"));
        assert!(apply_edit(&out, &note(5)).is_err());
    }

    #[test]
    fn test_add_note_to_metadata() {
        let out = apply_edit(&plan(), &Edit::plan_note("first", "")).unwrap();
        let out = apply_edit(&out, &Edit::plan_note("second", "")).unwrap();
        assert_eq!(out.metadata.get_str("notes"), Some("first | second"));
    }

    #[test]
    fn test_reorder_days_not_applied() {
        let err = apply_edit(&plan(), &Edit::reorder_days(Some(vec![1, 0]), "")).unwrap_err();
        assert_eq!(err, EditError::NotMechanical("reorder_days".into()));
    }

    #[test]
    fn test_hand_built_zero_sets_rejected() {
        let err = apply_edit(&plan(), &Edit::tune_sets(loc(0, 0, 0), 0, "")).unwrap_err();
        assert!(matches!(err, EditError::InvalidField { .. }));
    }

    #[test]
    fn test_apply_edits_records_first_failure() {
        let p = plan();
        let edits = vec![
            Edit::tune_sets(loc(0, 0, 0), 4, ""),
            Edit::tune_sets(loc(3, 0, 0), 4, ""),
            Edit::tune_sets(loc(1, 0, 0), 2, ""),
        ];
        let out = apply_edits(&p, &edits);
        assert_eq!(out.exercise(0, 0, 0).unwrap().sets, 4);
        assert_eq!(out.exercise(1, 0, 0).unwrap().sets, 4);
        assert_eq!(out.metadata.get_u64("edits_applied"), Some(1));
        assert!(out
            .metadata
            .get_str("edit_error")
            .unwrap()
            .starts_with("Failed at edit 1:"));
    }

    #[test]
    fn test_second_failed_batch_keeps_first_count() {
        let first = apply_edits(
            &plan(),
            &[
                Edit::tune_sets(loc(0, 0, 0), 4, ""),
                Edit::tune_sets(loc(0, 0, 1), 2, ""),
                Edit::tune_sets(loc(9, 0, 0), 2, ""),
            ],
        );
        assert_eq!(first.metadata.get_u64("edits_applied"), Some(2));

        let second = apply_edits(
            &first,
            &[
                Edit::tune_sets(loc(1, 0, 0), 3, ""),
                Edit::tune_sets(loc(0, 7, 0), 2, ""),
            ],
        );
        assert_eq!(second.metadata.get_u64("edits_applied"), Some(3));
        let errors = second.metadata.get_str("edit_error").unwrap();
        assert!(errors.starts_with("Failed at edit 2:"));
        assert!(errors.contains(" | Failed at edit 1:"));
    }

    #[test]
    fn test_apply_edits_all_valid_leaves_metadata_clean() {
        let out = apply_edits(&plan(), &[Edit::tune_sets(loc(0, 0, 1), 4, "")]);
        assert!(out.metadata.get("edit_error").is_none());
        assert!(out.metadata.get("edits_applied").is_none());
    }

    #[test]
    fn test_apply_raw_edits_counts_malformed_entry() {
        let raws: Vec<RawEdit> = serde_json::from_value(serde_json::json!([
            {"type": "tune_reps", "loc": {"day_idx": 0, "block_idx": 0, "ex_idx": 0}, "payload": {"reps": "3"}},
            {"type": "tune_sets", "loc": {"day_idx": 0, "block_idx": 0, "ex_idx": 0}},
        ]))
        .unwrap();
        let out = apply_raw_edits(&plan(), &raws);
        assert_eq!(out.exercise(0, 0, 0).unwrap().reps, "3");
        assert_eq!(out.metadata.get_u64("edits_applied"), Some(1));
        assert!(out.metadata.get_str("edit_error").unwrap().contains("payload.sets"));
    }

    #[test]
    fn test_split_edits_order_preserved() {
        let a = Edit::tune_sets(loc(0, 0, 0), 4, "a");
        let b = Edit::reorder_days(None, "b");
        let c = Edit::plan_note("n", "c");
        let d = Edit::reorder_days(None, "d");
        let (mech, sem) = split_edits(&[a.clone(), b.clone(), c.clone(), d.clone()]);
        assert_eq!(mech, vec![a, c]);
        assert_eq!(sem, vec![b, d]);
    }

    #[test]
    fn test_apply_substitutions_skips_bad_entries() {
        let subs = vec![
            SubstitutionSuggestion {
                day_idx: Some(0),
                block_idx: Some(0),
                ex_idx: Some(0),
                original: "Back Squat".into(),
                best: "Leg Press".into(),
                ..Default::default()
            },
            SubstitutionSuggestion {
                day_idx: Some(9),
                block_idx: Some(0),
                ex_idx: Some(0),
                best: "Nope".into(),
                ..Default::default()
            },
            SubstitutionSuggestion {
                day_idx: Some(1),
                block_idx: None,
                ex_idx: Some(0),
                best: "Nope".into(),
                ..Default::default()
            },
            SubstitutionSuggestion {
                day_idx: Some(1),
                block_idx: Some(0),
                ex_idx: Some(0),
                best: "  ".into(),
                ..Default::default()
            },
        ];
        let p = plan();
        let out = apply_substitutions(&p, &subs);
        assert_eq!(out.exercise(0, 0, 0).unwrap().name, "Leg Press");
        assert_eq!(out.exercise(1, 0, 0).unwrap().name, "Bench Press");
        assert!(out.shares_day_with(&p, 1));
    }
}
