// src/plan/types.rs — Weekly plan data model
//
// Days and blocks sit behind `Arc`. Cloning a plan copies only the spine;
// mutation goes through `Arc::make_mut`, so an edit duplicates just the
// day and block it touches while every other day stays shared.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub name: String,
    pub sets: u32,
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutExercise {
    pub fn new(name: impl Into<String>, sets: u32, reps: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets,
            reps: reps.into(),
            intensity: None,
            rest_seconds: None,
            notes: None,
        }
    }

    pub fn with_rest(mut self, rest_seconds: u32) -> Self {
        self.rest_seconds = Some(rest_seconds);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutBlock {
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

impl WorkoutBlock {
    pub fn new(name: impl Into<String>, exercises: Vec<WorkoutExercise>) -> Self {
        Self {
            name: name.into(),
            exercises,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub name: String,
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Arc<WorkoutBlock>>,
}

impl WorkoutDay {
    pub fn new(
        name: impl Into<String>,
        focus: Option<&str>,
        blocks: Vec<WorkoutBlock>,
    ) -> Self {
        Self {
            name: name.into(),
            focus: focus.map(str::to_string),
            blocks: blocks.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn exercises(&self) -> impl Iterator<Item = &WorkoutExercise> {
        self.blocks.iter().flat_map(|b| b.exercises.iter())
    }
}

/// Free-form provenance, flags and counters attached to a plan.
///
/// Merge-only: notes are appended with `" | "`, nothing is removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanMetadata(BTreeMap<String, Value>);

pub const NOTE_SEPARATOR: &str = " | ";

/// Metadata keys written only by the pipeline (generation, revision and the
/// edit engine). Plans coming back from a model cannot reset them.
pub const PIPELINE_KEYS: &[&str] = &[
    "revision_count",
    "revision_failed",
    "edits_applied",
    "edit_error",
    "generated_at",
];

impl PlanMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// True when `key` holds boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Append `note` to the string under `key`, creating it if absent.
    pub fn append_note(&mut self, key: &str, note: &str) {
        let joined = match self.0.get(key) {
            None | Some(Value::Null) => note.to_string(),
            Some(Value::String(existing)) if existing.is_empty() => note.to_string(),
            Some(Value::String(existing)) => format!("{existing}{NOTE_SEPARATOR}{note}"),
            Some(other) => format!("{other}{NOTE_SEPARATOR}{note}"),
        };
        self.0.insert(key.to_string(), Value::String(joined));
    }

    /// Increment a numeric counter, returning the new value.
    pub fn increment(&mut self, key: &str) -> u64 {
        self.add(key, 1)
    }

    /// Add `n` to a numeric counter, returning the new value.
    pub fn add(&mut self, key: &str, n: u64) -> u64 {
        let next = self.get_u64(key).unwrap_or(0) + n;
        self.0.insert(key.to_string(), Value::from(next));
        next
    }

    /// Fold `other` into `self` without losing anything already recorded.
    ///
    /// Keys in [`PIPELINE_KEYS`] are owned by this crate and never taken from
    /// `other`. On any other collision strings are joined, numbers keep the
    /// larger value, flags stay set once set, and anything else keeps the
    /// existing value.
    pub fn merge(&mut self, other: PlanMetadata) {
        for (key, incoming) in other.0 {
            if PIPELINE_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "ignoring incoming pipeline metadata");
                continue;
            }
            let Some(existing) = self.0.get(&key) else {
                self.0.insert(key, incoming);
                continue;
            };
            match (existing, &incoming) {
                (Value::String(mine), Value::String(theirs)) if mine == theirs => {}
                (Value::String(_), Value::String(theirs)) => {
                    let theirs = theirs.clone();
                    self.append_note(&key, &theirs);
                }
                (Value::Number(mine), Value::Number(theirs)) => {
                    if let (Some(a), Some(b)) = (mine.as_f64(), theirs.as_f64()) {
                        if b > a {
                            self.0.insert(key, incoming);
                        }
                    }
                }
                (Value::Bool(mine), Value::Bool(theirs)) => {
                    let set = *mine || *theirs;
                    self.0.insert(key, Value::Bool(set));
                }
                _ => {
                    tracing::debug!(key = %key, "keeping existing metadata value");
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<serde_json::Map<String, Value>> for PlanMetadata {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

/// A weekly plan: ordered days plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    #[serde(default)]
    pub days: Vec<Arc<WorkoutDay>>,
    #[serde(default)]
    pub metadata: PlanMetadata,
}

impl WorkoutPlan {
    pub fn new(days: Vec<WorkoutDay>) -> Self {
        Self {
            days: days.into_iter().map(Arc::new).collect(),
            metadata: PlanMetadata::new(),
        }
    }

    /// A plan with no days, carrying a note explaining why.
    pub fn empty_with_note(note: &str) -> Self {
        let mut plan = Self::default();
        plan.metadata.append_note("notes", note);
        plan
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn exercise_count(&self) -> usize {
        self.days.iter().map(|d| d.exercises().count()).sum()
    }

    /// Every exercise with its `(day_idx, block_idx, ex_idx)` location.
    pub fn indexed_exercises(
        &self,
    ) -> impl Iterator<Item = ((usize, usize, usize), &WorkoutExercise)> {
        self.days.iter().enumerate().flat_map(|(d, day)| {
            day.blocks.iter().enumerate().flat_map(move |(b, block)| {
                block
                    .exercises
                    .iter()
                    .enumerate()
                    .map(move |(e, ex)| ((d, b, e), ex))
            })
        })
    }

    pub fn exercise(&self, day: usize, block: usize, ex: usize) -> Option<&WorkoutExercise> {
        self.days.get(day)?.blocks.get(block)?.exercises.get(ex)
    }

    pub fn has_block(&self, day: usize, block: usize) -> bool {
        self.days
            .get(day)
            .is_some_and(|d| d.blocks.get(block).is_some())
    }

    /// Mutable access to one day, cloning it first if it is shared.
    pub fn day_mut(&mut self, day: usize) -> Option<&mut WorkoutDay> {
        self.days.get_mut(day).map(Arc::make_mut)
    }

    /// Mutable access to one block. Bounds are checked before anything is
    /// cloned, so a miss leaves sharing intact.
    pub fn block_mut(&mut self, day: usize, block: usize) -> Option<&mut WorkoutBlock> {
        if !self.has_block(day, block) {
            return None;
        }
        let day = Arc::make_mut(&mut self.days[day]);
        Some(Arc::make_mut(&mut day.blocks[block]))
    }

    pub fn exercise_mut(
        &mut self,
        day: usize,
        block: usize,
        ex: usize,
    ) -> Option<&mut WorkoutExercise> {
        self.exercise(day, block, ex)?;
        self.block_mut(day, block)?.exercises.get_mut(ex)
    }

    /// True when day `idx` is the same allocation in both plans.
    pub fn shares_day_with(&self, other: &WorkoutPlan, idx: usize) -> bool {
        match (self.days.get(idx), other.days.get(idx)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
