// src/oracle/mod.rs — Collaborator traits consumed by the refinement loop
//
// Every model-backed collaborator returns `Result`; the orchestrator decides
// how each failure degrades. The guideline lookup is local and infallible.

pub mod catalog;
pub mod guidelines;
pub mod model;
pub mod substitution;
pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::edits::{Edit, SubstitutionSuggestion};
use crate::infra::errors::LiftError;
use crate::plan::{UserProfile, WorkoutPlan};
use crate::verifier::report::ProgressionReport;

pub use catalog::{CatalogExercise, CatalogFilter, ExerciseCatalog};
pub use guidelines::{Guideline, GuidelineTable};
pub use model::ModelPlanner;
pub use substitution::ModelSubstituter;
pub use templates::{PlanTemplate, TemplateLibrary};

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, profile: &UserProfile) -> Result<WorkoutPlan, LiftError>;
}

#[async_trait]
pub trait PlanReviser: Send + Sync {
    /// Returns `plan` unchanged when `issues` is empty.
    async fn revise(
        &self,
        plan: &WorkoutPlan,
        profile: &UserProfile,
        issues: &[String],
    ) -> Result<WorkoutPlan, LiftError>;
}

/// Judgment from the semantic verifier: progression quality plus edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticVerdict {
    #[serde(default)]
    pub progression: ProgressionReport,
    #[serde(default)]
    pub suggested_edits: Vec<Edit>,
}

#[async_trait]
pub trait SemanticVerifier: Send + Sync {
    async fn verify(
        &self,
        profile: &UserProfile,
        plan: &WorkoutPlan,
    ) -> Result<SemanticVerdict, LiftError>;
}

#[async_trait]
pub trait SubstitutionOracle: Send + Sync {
    /// Must return an empty list when the profile has no avoid terms.
    async fn suggest(
        &self,
        plan: &WorkoutPlan,
        profile: &UserProfile,
    ) -> Result<Vec<SubstitutionSuggestion>, LiftError>;
}

/// Broadens raw avoid terms into the concrete names to screen for.
pub trait ConstraintResolver: Send + Sync {
    fn lookup(&self, term: &str) -> Option<&Guideline>;

    /// Each term (lowercased) followed by its clarify options, deduplicated in
    /// order. Unknown terms pass through.
    fn expand_terms(&self, terms: &[String]) -> Vec<String> {
        let mut expanded: Vec<String> = Vec::new();
        let mut push = |term: String| {
            if !term.is_empty() && !expanded.contains(&term) {
                expanded.push(term);
            }
        };
        for raw in terms {
            let term = raw.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            let options: Vec<String> = self
                .lookup(&term)
                .map(|g| {
                    g.clarify_options
                        .iter()
                        .map(|o| o.trim().to_lowercase())
                        .collect()
                })
                .unwrap_or_default();
            push(term);
            for option in options {
                push(option);
            }
        }
        expanded
    }
}
