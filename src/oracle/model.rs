// src/oracle/model.rs — Model-backed plan generator, reviser and semantic verifier

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ConstraintResolver, PlanGenerator, PlanReviser, SemanticVerdict, SemanticVerifier};
use crate::edits::parse_edits_lenient;
use crate::infra::config::ModelConfig;
use crate::infra::errors::LiftError;
use crate::plan::parser::coerce_plan;
use crate::plan::{UserProfile, WorkoutPlan};
use crate::provider::{ChatRequest, Message, ModelProvider};
use crate::util::{extract_json_object, truncate_str};
use crate::verifier::report::ProgressionReport;

pub const MIN_DAYS: u32 = 2;
pub const MAX_DAYS: u32 = 6;
pub const PARSE_FAILED_NOTE: &str = "LLM-generated plan (parse failed)";

const PLAN_SCHEMA: &str = "{days:[{name, focus, blocks:[{name, exercises:[{name, sets:int, reps:str, intensity?:str, rest_seconds?:int}]}]}], metadata:{notes:str}}";

const GENERATOR_SYSTEM: &str = "You are a seasoned strength coach. Create a weekly workout plan that fits the user's constraints. Use realistic, commonly known exercise names. Never include exercises matching the avoid list.";

const REVISER_SYSTEM: &str = "You are a seasoned strength coach revising an existing weekly workout plan. Fix every listed issue while keeping everything else as close to the original as possible. Keep the same number of days.";

const VERIFIER_SYSTEM: &str = "Given a user profile and workout plan that passed basic checks, evaluate: \
(1) progression quality: is volume progression logical across weeks/sessions? \
(2) exercise appropriateness: do exercises match the user's goal and experience level? \
(3) programming wisdom: any red flags in exercise selection, order, or volume distribution? \
Return STRICT JSON with keys: ok:bool, progression:{ok:bool, issues:list[str], notes:str}, \
suggested_edits:[{type:str, reason:str, loc:{day_idx?:int, block_idx?:int, ex_idx?:int}, payload:object}]. \
Edit types: replace_exercise (payload new_name), tune_sets (payload sets), tune_reps (payload reps), \
add_rest (payload rest_seconds), remove_exercise, add_exercise (payload exercise), \
reorder_days (payload order: permutation of day indices), add_note (payload note). \
Only suggest edits for actual issues, not theoretical improvements.";

/// Log-friendly prefix of a reply.
const REPLY_PREVIEW_BYTES: usize = 200;

/// Generator, reviser and semantic verifier over one chat model.
pub struct ModelPlanner {
    provider: Arc<dyn ModelProvider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    resolver: Option<Arc<dyn ConstraintResolver>>,
}

impl ModelPlanner {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            resolver: None,
        }
    }

    pub fn from_config(provider: Arc<dyn ModelProvider>, config: &ModelConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            resolver: None,
        }
    }

    /// Expand avoid terms before they go into the generation prompt.
    pub fn with_resolver(mut self, resolver: Arc<dyn ConstraintResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    async fn ask(&self, system: &str, prompt: String) -> Result<String, LiftError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: Some(system.to_string()),
            json_mode: true,
        };
        let response = self.provider.chat(request).await?;
        Ok(response.content)
    }

    fn avoid_terms(&self, profile: &UserProfile) -> Vec<String> {
        match &self.resolver {
            Some(resolver) => resolver.expand_terms(&profile.avoid_exercises),
            None => profile.normalized_avoid_terms(),
        }
    }
}

fn parse_object(reply: &str) -> Result<Value, LiftError> {
    let body = extract_json_object(reply).ok_or_else(|| {
        LiftError::Parse(format!(
            "no JSON object in reply: {}",
            truncate_str(reply, REPLY_PREVIEW_BYTES)
        ))
    })?;
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LiftError::Parse(format!("invalid JSON in reply: {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(LiftError::Parse("reply is not a JSON object".into()))
    }
}

fn parse_plan(reply: &str) -> Result<WorkoutPlan, LiftError> {
    coerce_plan(&parse_object(reply)?)
}

/// Read `{progression, suggested_edits}` from a verifier reply. Edits that
/// fail validation are dropped.
pub fn parse_verdict(reply: &str) -> Result<SemanticVerdict, LiftError> {
    let value = parse_object(reply)?;

    let progression = match value.get("progression") {
        Some(p) if p.is_object() => serde_json::from_value::<ProgressionReport>(p.clone())
            .unwrap_or_else(|e| ProgressionReport::passing(format!("Unreadable progression: {e}"))),
        _ => ProgressionReport::passing(""),
    };

    let suggested_edits = value
        .get("suggested_edits")
        .and_then(Value::as_array)
        .map(|raw| parse_edits_lenient(raw))
        .unwrap_or_default();

    Ok(SemanticVerdict {
        progression,
        suggested_edits,
    })
}

#[async_trait]
impl PlanGenerator for ModelPlanner {
    async fn generate(&self, profile: &UserProfile) -> Result<WorkoutPlan, LiftError> {
        let days = profile.days_per_week.clamp(MIN_DAYS, MAX_DAYS);
        let request = json!({
            "days_per_week": days,
            "minutes_per_day": profile.minutes_per_day,
            "goal": profile.goal,
            "equipment_available": profile.equipment_available,
            "avoid_exercises": self.avoid_terms(profile),
            "training_history": profile.training_history,
        });
        let prompt = format!(
            "Generate a weekly plan that meets these constraints.\n{request}\nReturn STRICT JSON only with schema: {PLAN_SCHEMA}"
        );

        tracing::info!(model = %self.model, days, "generating plan");
        let reply = self.ask(GENERATOR_SYSTEM, prompt).await?;

        let mut plan = match parse_plan(&reply) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("generated plan unreadable: {e}");
                WorkoutPlan::empty_with_note(PARSE_FAILED_NOTE)
            }
        };
        plan.metadata.set("generated_at", chrono::Utc::now().to_rfc3339());
        plan.metadata.set("model", self.model.clone());
        Ok(plan)
    }
}

#[async_trait]
impl PlanReviser for ModelPlanner {
    async fn revise(
        &self,
        plan: &WorkoutPlan,
        profile: &UserProfile,
        issues: &[String],
    ) -> Result<WorkoutPlan, LiftError> {
        if issues.is_empty() {
            return Ok(plan.clone());
        }

        let payload = json!({
            "profile": profile,
            "plan": plan,
            "issues": issues,
        });
        let prompt = format!(
            "Revise this plan to resolve the listed issues.\n{payload}\nReturn STRICT JSON only with schema: {PLAN_SCHEMA}"
        );

        tracing::info!(model = %self.model, issues = issues.len(), "requesting revision");
        let reply = self.ask(REVISER_SYSTEM, prompt).await?;

        match parse_plan(&reply) {
            Ok(mut revised) => {
                let mut metadata = plan.metadata.clone();
                metadata.merge(std::mem::take(&mut revised.metadata));
                revised.metadata = metadata;
                let count = revised.metadata.increment("revision_count");
                tracing::debug!(revision_count = count, "revision applied");
                Ok(revised)
            }
            Err(e) => {
                tracing::warn!("revised plan unreadable: {e}");
                let mut kept = plan.clone();
                kept.metadata.set("revision_failed", true);
                Ok(kept)
            }
        }
    }
}

#[async_trait]
impl SemanticVerifier for ModelPlanner {
    async fn verify(
        &self,
        profile: &UserProfile,
        plan: &WorkoutPlan,
    ) -> Result<SemanticVerdict, LiftError> {
        let payload = json!({
            "profile": profile,
            "plan": plan,
            "goal": profile.goal,
        });
        let prompt = format!(
            "Evaluate this plan for progression quality and programming wisdom. Return strict JSON with a suggested_edits array.\n{payload}"
        );

        tracing::info!(model = %self.model, days = plan.day_count(), "semantic verification");
        let reply = self.ask(VERIFIER_SYSTEM, prompt).await?;
        parse_verdict(&reply)
    }
}
