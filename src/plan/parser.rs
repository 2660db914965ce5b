// src/plan/parser.rs — Lenient coercion of model JSON into plan values
//
// Model output is loosely typed: numbers arrive as strings, fields go missing.
// Everything here degrades to defaults instead of failing.

use serde_json::Value;

use super::types::{PlanMetadata, WorkoutBlock, WorkoutDay, WorkoutExercise, WorkoutPlan};
use crate::infra::errors::LiftError;
use crate::util::extract_json_object;

pub const DEFAULT_EXERCISE_NAME: &str = "Exercise";
pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: &str = "5-8";
pub const DEFAULT_BLOCK_NAME: &str = "Block";
pub const DEFAULT_DAY_NAME: &str = "Day";

/// Non-negative integer from a JSON number, integral float, or numeric string.
pub fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Non-empty string from a JSON string or number.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or(obj: &Value, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(coerce_string)
        .unwrap_or_else(|| default.to_string())
}

fn optional_string(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(coerce_string)
}

fn array<'a>(obj: &'a Value, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Build an exercise from a loosely-typed object, filling defaults.
/// `default_reps` differs between generated plans and appended exercises.
pub fn coerce_exercise(obj: &Value, default_reps: &str) -> WorkoutExercise {
    let sets = obj
        .get("sets")
        .and_then(coerce_u64)
        .map(|s| s.clamp(1, u32::MAX as u64) as u32)
        .unwrap_or(DEFAULT_SETS);
    WorkoutExercise {
        name: string_or(obj, "name", DEFAULT_EXERCISE_NAME),
        sets,
        reps: string_or(obj, "reps", default_reps),
        intensity: optional_string(obj, "intensity"),
        rest_seconds: obj
            .get("rest_seconds")
            .and_then(coerce_u64)
            .map(|r| r.min(u32::MAX as u64) as u32),
        notes: optional_string(obj, "notes"),
    }
}

fn coerce_block(obj: &Value) -> WorkoutBlock {
    WorkoutBlock::new(
        string_or(obj, "name", DEFAULT_BLOCK_NAME),
        array(obj, "exercises")
            .iter()
            .map(|ex| coerce_exercise(ex, DEFAULT_REPS))
            .collect(),
    )
}

fn coerce_day(obj: &Value) -> WorkoutDay {
    let blocks = array(obj, "blocks").iter().map(coerce_block).collect();
    let focus = optional_string(obj, "focus");
    WorkoutDay::new(string_or(obj, "name", DEFAULT_DAY_NAME), focus.as_deref(), blocks)
}

/// Coerce a JSON value into a plan. Fails only when the value is not an object.
pub fn coerce_plan(value: &Value) -> Result<WorkoutPlan, LiftError> {
    if !value.is_object() {
        return Err(LiftError::Parse("plan is not a JSON object".into()));
    }
    let mut plan = WorkoutPlan::new(array(value, "days").iter().map(coerce_day).collect());
    plan.metadata = match value.get("metadata") {
        Some(Value::Object(map)) => PlanMetadata::from(map.clone()),
        Some(Value::String(note)) => {
            let mut meta = PlanMetadata::new();
            meta.append_note("notes", note);
            meta
        }
        _ => PlanMetadata::new(),
    };
    Ok(plan)
}

/// Extract and coerce a plan from a raw model reply.
pub fn parse_plan_reply(reply: &str) -> Result<WorkoutPlan, LiftError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| LiftError::Parse("no JSON object in reply".into()))?;
    let value: Value = serde_json::from_str(json)?;
    coerce_plan(&value)
}
