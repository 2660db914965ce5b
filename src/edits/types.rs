// src/edits/types.rs — Edit taxonomy: strict in-memory form and wire form
//
// Oracles speak `{type, reason, loc, payload}` JSON. That wire form is
// validated once, here, into a tagged `EditKind`; the engine never sees an
// edit with a missing or mistyped field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::infra::errors::EditError;
use crate::plan::parser::{coerce_exercise, coerce_string, coerce_u64};
use crate::plan::WorkoutExercise;

/// Reps used when an appended exercise omits them.
pub const ADD_EXERCISE_DEFAULT_REPS: &str = "8-12";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseLoc {
    pub day_idx: usize,
    pub block_idx: usize,
    pub ex_idx: usize,
}

impl ExerciseLoc {
    pub fn new(day_idx: usize, block_idx: usize, ex_idx: usize) -> Self {
        Self {
            day_idx,
            block_idx,
            ex_idx,
        }
    }
}

impl std::fmt::Display for ExerciseLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "day {} / block {} / exercise {}",
            self.day_idx, self.block_idx, self.ex_idx
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLoc {
    pub day_idx: usize,
    pub block_idx: usize,
}

impl std::fmt::Display for BlockLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {} / block {}", self.day_idx, self.block_idx)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditKind {
    ReplaceExercise { at: ExerciseLoc, new_name: String },
    TuneSets { at: ExerciseLoc, sets: u32 },
    TuneReps { at: ExerciseLoc, reps: String },
    AddRest { at: ExerciseLoc, rest_seconds: u32 },
    RemoveExercise { at: ExerciseLoc },
    AddExercise { at: BlockLoc, exercise: WorkoutExercise },
    /// `day_idx = None` targets plan metadata.
    AddNote { day_idx: Option<usize>, note: String },
    /// Permutation of day indices. Never applied mechanically.
    ReorderDays { order: Option<Vec<usize>> },
}

impl EditKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EditKind::ReplaceExercise { .. } => "replace_exercise",
            EditKind::TuneSets { .. } => "tune_sets",
            EditKind::TuneReps { .. } => "tune_reps",
            EditKind::AddRest { .. } => "add_rest",
            EditKind::RemoveExercise { .. } => "remove_exercise",
            EditKind::AddExercise { .. } => "add_exercise",
            EditKind::AddNote { .. } => "add_note",
            EditKind::ReorderDays { .. } => "reorder_days",
        }
    }

    pub fn is_mechanical(&self) -> bool {
        !matches!(self, EditKind::ReorderDays { .. })
    }
}

/// A validated plan edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEdit", into = "RawEdit")]
pub struct Edit {
    pub kind: EditKind,
    pub reason: String,
}

impl Edit {
    pub fn new(kind: EditKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn tune_sets(at: ExerciseLoc, sets: u32, reason: impl Into<String>) -> Self {
        Self::new(EditKind::TuneSets { at, sets }, reason)
    }

    pub fn replace_exercise(
        at: ExerciseLoc,
        new_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            EditKind::ReplaceExercise {
                at,
                new_name: new_name.into(),
            },
            reason,
        )
    }

    pub fn plan_note(note: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            EditKind::AddNote {
                day_idx: None,
                note: note.into(),
            },
            reason,
        )
    }

    pub fn reorder_days(order: Option<Vec<usize>>, reason: impl Into<String>) -> Self {
        Self::new(EditKind::ReorderDays { order }, reason)
    }
}

// ─── Wire form ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_idx: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_idx: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ex_idx: Option<Value>,
}

/// An edit as oracles emit it. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEdit {
    #[serde(rename = "type", default)]
    pub edit_type: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub loc: Option<RawLocation>,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

struct Fields<'a> {
    edit_type: &'a str,
    loc: Option<&'a RawLocation>,
    payload: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn missing(&self, field: &str) -> EditError {
        EditError::MissingField {
            edit_type: self.edit_type.to_string(),
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, value: &Value) -> EditError {
        EditError::InvalidField {
            edit_type: self.edit_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    fn index(&self, field: &str) -> Result<Option<usize>, EditError> {
        let raw = self.loc.and_then(|loc| match field {
            "day_idx" => loc.day_idx.as_ref(),
            "block_idx" => loc.block_idx.as_ref(),
            _ => loc.ex_idx.as_ref(),
        });
        match raw {
            None | Some(Value::Null) => Ok(None),
            Some(v) => coerce_u64(v)
                .map(|i| Some(i as usize))
                .ok_or_else(|| self.invalid(&format!("loc.{field}"), v)),
        }
    }

    fn required_index(&self, field: &str) -> Result<usize, EditError> {
        self.index(field)?
            .ok_or_else(|| self.missing(&format!("loc.{field}")))
    }

    fn exercise_loc(&self) -> Result<ExerciseLoc, EditError> {
        Ok(ExerciseLoc {
            day_idx: self.required_index("day_idx")?,
            block_idx: self.required_index("block_idx")?,
            ex_idx: self.required_index("ex_idx")?,
        })
    }

    fn block_loc(&self) -> Result<BlockLoc, EditError> {
        Ok(BlockLoc {
            day_idx: self.required_index("day_idx")?,
            block_idx: self.required_index("block_idx")?,
        })
    }

    fn payload_value(&self, field: &str) -> Option<&'a Value> {
        self.payload
            .and_then(|p| p.get(field))
            .filter(|v| !v.is_null())
    }

    fn payload_string(&self, field: &str) -> Result<String, EditError> {
        let v = self
            .payload_value(field)
            .ok_or_else(|| self.missing(&format!("payload.{field}")))?;
        coerce_string(v).ok_or_else(|| self.invalid(&format!("payload.{field}"), v))
    }

    fn payload_u32(&self, field: &str, min: u64) -> Result<u32, EditError> {
        let v = self
            .payload_value(field)
            .ok_or_else(|| self.missing(&format!("payload.{field}")))?;
        coerce_u64(v)
            .filter(|n| *n >= min && *n <= u32::MAX as u64)
            .map(|n| n as u32)
            .ok_or_else(|| self.invalid(&format!("payload.{field}"), v))
    }
}

impl TryFrom<RawEdit> for Edit {
    type Error = EditError;

    fn try_from(raw: RawEdit) -> Result<Self, Self::Error> {
        let f = Fields {
            edit_type: raw.edit_type.trim(),
            loc: raw.loc.as_ref(),
            payload: raw.payload.as_ref(),
        };

        let kind = match f.edit_type {
            "replace_exercise" => EditKind::ReplaceExercise {
                at: f.exercise_loc()?,
                new_name: f.payload_string("new_name")?,
            },
            "tune_sets" => EditKind::TuneSets {
                at: f.exercise_loc()?,
                sets: f.payload_u32("sets", 1)?,
            },
            "tune_reps" => EditKind::TuneReps {
                at: f.exercise_loc()?,
                reps: f.payload_string("reps")?,
            },
            "add_rest" => EditKind::AddRest {
                at: f.exercise_loc()?,
                rest_seconds: f.payload_u32("rest_seconds", 0)?,
            },
            "remove_exercise" => EditKind::RemoveExercise {
                at: f.exercise_loc()?,
            },
            "add_exercise" => {
                let at = f.block_loc()?;
                let obj = f
                    .payload_value("exercise")
                    .ok_or_else(|| f.missing("payload.exercise"))?;
                match obj.as_object() {
                    Some(map) if !map.is_empty() => EditKind::AddExercise {
                        at,
                        exercise: coerce_exercise(obj, ADD_EXERCISE_DEFAULT_REPS),
                    },
                    _ => return Err(f.invalid("payload.exercise", obj)),
                }
            }
            "add_note" => EditKind::AddNote {
                day_idx: f.index("day_idx")?,
                note: f.payload_string("note")?,
            },
            "reorder_days" => EditKind::ReorderDays {
                order: parse_order(&f)?,
            },
            other => return Err(EditError::UnsupportedType(other.to_string())),
        };

        Ok(Edit {
            kind,
            reason: raw.reason,
        })
    }
}

fn parse_order(f: &Fields<'_>) -> Result<Option<Vec<usize>>, EditError> {
    let Some(v) = f.payload_value("order") else {
        return Ok(None);
    };
    let items = v
        .as_array()
        .ok_or_else(|| f.invalid("payload.order", v))?;
    let order: Vec<usize> = items
        .iter()
        .map(|i| coerce_u64(i).map(|n| n as usize))
        .collect::<Option<_>>()
        .ok_or_else(|| f.invalid("payload.order", v))?;

    let mut seen = vec![false; order.len()];
    for &i in &order {
        match seen.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(f.invalid("payload.order", v)),
        }
    }
    Ok(Some(order))
}

fn loc_value(i: usize) -> Option<Value> {
    Some(Value::from(i as u64))
}

impl From<Edit> for RawEdit {
    fn from(edit: Edit) -> Self {
        let edit_type = edit.type_name().to_string();
        let mut payload = Map::new();
        let loc = match edit.kind {
            EditKind::ReplaceExercise { at, new_name } => {
                payload.insert("new_name".into(), Value::String(new_name));
                exercise_raw_loc(at)
            }
            EditKind::TuneSets { at, sets } => {
                payload.insert("sets".into(), Value::from(sets));
                exercise_raw_loc(at)
            }
            EditKind::TuneReps { at, reps } => {
                payload.insert("reps".into(), Value::String(reps));
                exercise_raw_loc(at)
            }
            EditKind::AddRest { at, rest_seconds } => {
                payload.insert("rest_seconds".into(), Value::from(rest_seconds));
                exercise_raw_loc(at)
            }
            EditKind::RemoveExercise { at } => exercise_raw_loc(at),
            EditKind::AddExercise { at, exercise } => {
                payload.insert(
                    "exercise".into(),
                    serde_json::to_value(exercise).unwrap_or(Value::Null),
                );
                RawLocation {
                    day_idx: loc_value(at.day_idx),
                    block_idx: loc_value(at.block_idx),
                    ex_idx: None,
                }
            }
            EditKind::AddNote { day_idx, note } => {
                payload.insert("note".into(), Value::String(note));
                RawLocation {
                    day_idx: day_idx.and_then(loc_value),
                    ..Default::default()
                }
            }
            EditKind::ReorderDays { order } => {
                if let Some(order) = order {
                    payload.insert(
                        "order".into(),
                        Value::Array(order.into_iter().map(|i| Value::from(i as u64)).collect()),
                    );
                }
                RawLocation::default()
            }
        };
        RawEdit {
            edit_type,
            reason: edit.reason,
            loc: Some(loc),
            payload: Some(payload),
        }
    }
}

fn exercise_raw_loc(at: ExerciseLoc) -> RawLocation {
    RawLocation {
        day_idx: loc_value(at.day_idx),
        block_idx: loc_value(at.block_idx),
        ex_idx: loc_value(at.ex_idx),
    }
}

/// Validate a batch of loosely-typed edits, dropping (and logging) the bad ones.
pub fn parse_edits_lenient(values: &[Value]) -> Vec<Edit> {
    values
        .iter()
        .filter_map(|v| {
            let raw: RawEdit = match serde_json::from_value(v.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Dropping malformed edit {}: {}", v, e);
                    return None;
                }
            };
            match Edit::try_from(raw) {
                Ok(edit) => Some(edit),
                Err(e) => {
                    tracing::warn!("Dropping invalid edit: {}", e);
                    None
                }
            }
        })
        .collect()
}
