// src/edits/mod.rs — Edit taxonomy and the deterministic edit engine

pub mod engine;
pub mod types;

pub use engine::{
    apply_edit, apply_edits, apply_raw_edits, apply_substitutions, is_mechanical_edit,
    split_edits, SubstitutionSuggestion,
};
pub use types::{parse_edits_lenient, BlockLoc, Edit, EditKind, ExerciseLoc, RawEdit};
