// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::edits::RawEdit;
use crate::oracle::CatalogExercise;
use crate::plan::{ProfilePatch, UserProfile};

/// Request body for verifying an existing plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Lenient plan JSON, same shape the generator accepts.
    pub plan: serde_json::Value,
    #[serde(default)]
    pub profile: ProfilePatch,
    #[serde(default)]
    pub semantic_only: bool,
}

/// Request body for applying edits to a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    pub plan: serde_json::Value,
    #[serde(default)]
    pub edits: Vec<RawEdit>,
}

/// Profile merged over defaults, plus what is still worth asking.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub followup_questions: Vec<String>,
}

fn default_k() -> usize {
    5
}

/// Query string for exercise search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExerciseSearchResponse {
    pub results: Vec<CatalogExercise>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
