// src/oracle/substitution.rs — Substitution suggestions for avoided exercises
//
// Candidates come from the local catalog; the model only ranks them. When
// the model is unavailable the first candidate wins, and when there are no
// candidates the original name is kept.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ExerciseCatalog, SubstitutionOracle};
use crate::edits::SubstitutionSuggestion;
use crate::infra::errors::LiftError;
use crate::plan::{UserProfile, WorkoutPlan};
use crate::provider::{ChatRequest, Message, ModelProvider};
use crate::util::extract_json_object;
use crate::verifier::fast::MovementPattern;

pub const DEFAULT_TOP_K: usize = 15;

const PICKER_SYSTEM: &str = "You are an expert fitness coach selecting a substitution for a target exercise. Prefer biomechanically similar movements and common gym availability. Choose only from the provided candidates when any are given.";

pub struct ModelSubstituter {
    provider: Option<Arc<dyn ModelProvider>>,
    model: String,
    catalog: Arc<ExerciseCatalog>,
    top_k: usize,
}

impl ModelSubstituter {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: impl Into<String>,
        catalog: Arc<ExerciseCatalog>,
    ) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
            catalog,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Catalog-only substituter: always takes the first candidate.
    pub fn catalog_only(catalog: Arc<ExerciseCatalog>) -> Self {
        Self {
            provider: None,
            model: String::new(),
            catalog,
            top_k: DEFAULT_TOP_K,
        }
    }

    async fn ask_once(
        &self,
        provider: &dyn ModelProvider,
        original: &str,
        pattern: Option<MovementPattern>,
        avoid_terms: &[String],
        candidates: &[String],
    ) -> Result<Option<String>, LiftError> {
        let payload = json!({
            "target_exercise": original,
            "pattern": pattern,
            "avoid_terms": avoid_terms,
            "candidates": candidates,
        });
        let prompt = format!(
            "Pick the best substitution.\n{payload}\nReturn STRICT JSON ONLY in this schema: {{\"best\":{{\"name\":string}}, \"candidates\":[{{\"name\":string}}]}}"
        );
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            system: Some(PICKER_SYSTEM.to_string()),
            json_mode: true,
            ..Default::default()
        };
        let reply = provider.chat(request).await?;
        parse_pick(&reply.content, original)
    }

    /// Model pick with a single retry. `None` when the model declines or fails.
    async fn pick(
        &self,
        original: &str,
        pattern: Option<MovementPattern>,
        avoid_terms: &[String],
        candidates: &[String],
    ) -> Option<String> {
        let provider = self.provider.as_deref()?;
        let first = self
            .ask_once(provider, original, pattern, avoid_terms, candidates)
            .await;
        let outcome = match first {
            Ok(pick) => Ok(pick),
            Err(e) => {
                tracing::debug!(exercise = original, "substitution pick failed, retrying: {e}");
                self.ask_once(provider, original, pattern, avoid_terms, candidates)
                    .await
            }
        };
        match outcome {
            Ok(Some(name)) if !matches_any(&name, avoid_terms) => Some(name),
            Ok(Some(name)) => {
                tracing::debug!(exercise = original, pick = %name, "model picked an avoided exercise");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(exercise = original, "substitution pick unavailable: {e}");
                None
            }
        }
    }
}

fn matches_any(name: &str, terms: &[String]) -> bool {
    let lower = name.to_lowercase();
    terms.iter().any(|t| lower.contains(t.as_str()))
}

fn name_of(value: &Value) -> Option<String> {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read `{"best": {"name"}, "candidates": [{"name"}]}`. An empty best falls
/// back to the first listed candidate; echoing the original counts as no pick.
pub fn parse_pick(reply: &str, original: &str) -> Result<Option<String>, LiftError> {
    let body = extract_json_object(reply)
        .ok_or_else(|| LiftError::Parse("substitution reply has no JSON object".into()))?;
    let value: Value = serde_json::from_str(body)?;
    let best = value
        .get("best")
        .filter(|b| b.is_object())
        .ok_or_else(|| LiftError::Parse("missing or invalid 'best' object".into()))?;

    let name = name_of(best).or_else(|| {
        value
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(name_of)
    });

    Ok(name.filter(|n| !n.eq_ignore_ascii_case(original.trim())))
}

#[async_trait]
impl SubstitutionOracle for ModelSubstituter {
    async fn suggest(
        &self,
        plan: &WorkoutPlan,
        profile: &UserProfile,
    ) -> Result<Vec<SubstitutionSuggestion>, LiftError> {
        let avoids = profile.normalized_avoid_terms();
        if avoids.is_empty() {
            return Ok(Vec::new());
        }
        let equipment: Vec<String> = profile.equipment_available.iter().cloned().collect();

        let mut suggestions = Vec::new();
        for ((day_idx, block_idx, ex_idx), ex) in plan.indexed_exercises() {
            if !matches_any(&ex.name, &avoids) {
                continue;
            }
            let pattern = plan.days[day_idx]
                .focus
                .as_deref()
                .and_then(MovementPattern::from_focus);

            let candidates = self.catalog.substitution_candidates(
                &ex.name,
                pattern,
                &avoids,
                &equipment,
                self.top_k,
            );
            let picked = self.pick(&ex.name, pattern, &avoids, &candidates).await;
            let model_picked = picked.is_some();
            let best = picked
                .or_else(|| candidates.first().cloned())
                .unwrap_or_else(|| ex.name.clone());

            suggestions.push(SubstitutionSuggestion {
                day_idx: Some(day_idx),
                block_idx: Some(block_idx),
                ex_idx: Some(ex_idx),
                original: ex.name.clone(),
                best,
                candidates,
                rationale: format!(
                    "Avoid term matched; pattern={}; LLM {}",
                    pattern.map(|p| p.as_str()).unwrap_or("n/a"),
                    if model_picked { "picked" } else { "not available" }
                ),
            });
        }

        tracing::debug!(count = suggestions.len(), "substitution suggestions");
        Ok(suggestions)
    }
}
