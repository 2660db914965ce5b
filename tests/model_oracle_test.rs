// tests/model_oracle_test.rs — Integration test: model-backed oracles with a mock provider

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use liftloop::core::orchestrator::{Oracles, Orchestrator};
use liftloop::core::types::OrchestrationConfig;
use liftloop::infra::errors::LiftError;
use liftloop::oracle::model::PARSE_FAILED_NOTE;
use liftloop::oracle::{
    CatalogExercise, ExerciseCatalog, Guideline, GuidelineTable, ModelPlanner, ModelSubstituter,
    PlanGenerator, PlanReviser,
};
use liftloop::plan::{UserProfile, WorkoutPlan};
use liftloop::provider::*;

/// A mock provider that answers by role (picked from the system prompt)
/// without making any network calls.
#[derive(Default)]
struct ScriptedProvider {
    generator_reply: String,
    reviser_reply: String,
    picker_reply: String,
    verdicts: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn requests_for(&self, system_prefix: &str) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.system.as_deref().unwrap_or("").starts_with(system_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LiftError> {
        let system = request.system.clone().unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let content = if system.contains("Create a weekly workout plan") {
            self.generator_reply.clone()
        } else if system.contains("revising an existing") {
            self.reviser_reply.clone()
        } else if system.contains("selecting a substitution") {
            self.picker_reply.clone()
        } else {
            self.verdicts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| passing_verdict().to_string())
        };

        Ok(ChatResponse {
            content,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        })
    }
}

fn passing_verdict() -> serde_json::Value {
    json!({"ok": true, "progression": {"ok": true, "issues": [], "notes": "sound"}, "suggested_edits": []})
}

fn exercise(name: &str) -> serde_json::Value {
    json!({"name": name, "sets": 3, "reps": "8", "rest_seconds": 90})
}

fn plan_json(day_one: &[&str], day_two: &[&str]) -> serde_json::Value {
    json!({
        "days": [
            {"name": "Lower", "focus": "Lower - hinge", "blocks": [
                {"name": "Main", "exercises": day_one.iter().map(|n| exercise(n)).collect::<Vec<_>>()}
            ]},
            {"name": "Upper", "focus": "Upper - push", "blocks": [
                {"name": "Main", "exercises": day_two.iter().map(|n| exercise(n)).collect::<Vec<_>>()}
            ]}
        ],
        "metadata": {"notes": "two-day split"}
    })
}

fn guidelines() -> Arc<GuidelineTable> {
    Arc::new(GuidelineTable::from_entries(vec![Guideline {
        term_or_constraint: "deadlift".into(),
        clarify_options: vec!["romanian deadlift".into(), "sumo deadlift".into()],
        recommended_alternatives: vec!["hip thrust".into()],
    }]))
}

fn catalog() -> Arc<ExerciseCatalog> {
    let ex = |name: &str, equipment: &str| CatalogExercise {
        id: name.replace(' ', "_"),
        name: name.into(),
        level: Some("beginner".into()),
        equipment: Some(equipment.into()),
        category: Some("strength".into()),
        primary_muscles: vec!["glutes".into()],
    };
    Arc::new(ExerciseCatalog::from_exercises(vec![
        ex("Barbell Hip Thrust", "barbell"),
        ex("Glute Bridge", "body only"),
        ex("Conventional Deadlift", "barbell"),
    ]))
}

fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
    let planner =
        Arc::new(ModelPlanner::new(provider.clone(), "mock-model").with_resolver(guidelines()));
    let oracles = Oracles {
        generator: planner.clone(),
        reviser: planner.clone(),
        semantic: planner,
        substitution: Arc::new(ModelSubstituter::new(provider, "mock-model", catalog())),
        resolver: guidelines(),
    };
    Orchestrator::new(oracles, OrchestrationConfig::default())
}

fn profile() -> UserProfile {
    UserProfile {
        days_per_week: 2,
        minutes_per_day: 60,
        avoid_exercises: vec!["Deadlift".into()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_pipeline_substitutes_and_verifies() {
    let provider = Arc::new(ScriptedProvider {
        generator_reply: format!(
            "Here is your plan:\n```json\n{}\n```",
            plan_json(
                &["Back Squat", "Romanian Deadlift"],
                &["Bench Press", "Barbell Row"]
            )
        ),
        picker_reply: json!({"best": {"name": "Barbell Hip Thrust"}, "candidates": []}).to_string(),
        ..Default::default()
    });
    let envelope = orchestrator(provider.clone()).run(&profile()).await;

    assert!(envelope.verification.ok, "{:?}", envelope.verification);
    assert_eq!(envelope.iterations, 1);

    let sub = &envelope.substitution_suggestions[0];
    assert_eq!(sub.original, "Romanian Deadlift");
    assert_eq!(sub.best, "Barbell Hip Thrust");
    assert_eq!(sub.rationale, "Avoid term matched; pattern=hinge_like; LLM picked");
    assert_eq!(
        envelope.plan.exercise(0, 0, 1).unwrap().name,
        "Barbell Hip Thrust"
    );
    assert_eq!(envelope.plan.metadata.get_str("model"), Some("mock-model"));
    assert!(envelope.plan.metadata.get_str("generated_at").is_some());

    // Expanded avoid terms reach the generator prompt.
    let generate = provider.requests_for("You are a seasoned strength coach. Create");
    assert_eq!(generate.len(), 1);
    assert!(generate[0].messages[0].content.contains("sumo deadlift"));
    assert!(generate[0].json_mode);
}

#[tokio::test]
async fn test_semantic_issue_triggers_revision() {
    let verdict = json!({
        "ok": false,
        "progression": {"ok": false, "issues": ["Pressing outpaces pulling"], "notes": ""},
        "suggested_edits": [
            {"type": "tune_sets", "reason": "Trim pressing", "loc": {"day_idx": 1, "block_idx": 0, "ex_idx": 0}, "payload": {"sets": 2}},
            {"type": "reorder_days", "reason": "Lead with the upper day", "payload": {"order": [1, 0]}},
            {"type": "teleport", "reason": "nonsense"}
        ]
    });
    let provider = Arc::new(ScriptedProvider {
        generator_reply: plan_json(&["Back Squat", "Hip Thrust"], &["Bench Press", "Barbell Row"])
            .to_string(),
        reviser_reply: plan_json(
            &["Back Squat", "Hip Thrust"],
            &["Bench Press", "Barbell Row", "Face Pull"],
        )
        .to_string(),
        verdicts: Mutex::new(VecDeque::from([verdict.to_string()])),
        ..Default::default()
    });
    let profile = UserProfile {
        avoid_exercises: vec![],
        ..profile()
    };
    let envelope = orchestrator(provider.clone()).run(&profile).await;

    assert!(envelope.verification.ok);
    assert_eq!(envelope.iterations, 2);
    assert_eq!(envelope.plan.metadata.get_u64("revision_count"), Some(1));
    assert_eq!(envelope.plan.exercise(1, 0, 2).unwrap().name, "Face Pull");

    let revise = provider.requests_for("You are a seasoned strength coach revising");
    assert_eq!(revise.len(), 1);
    let prompt = &revise[0].messages[0].content;
    assert!(prompt.contains("Lead with the upper day (reorder days as: 2, 1)"));
    assert!(prompt.contains("Pressing outpaces pulling"));
    // The mechanical edit was applied before the reviser saw the plan.
    assert!(prompt.contains("\"sets\":2"));
}

#[tokio::test]
async fn test_unreadable_generation_becomes_empty_plan() {
    let provider = Arc::new(ScriptedProvider {
        generator_reply: "Sorry, I can't produce JSON today.".into(),
        ..Default::default()
    });
    let planner = ModelPlanner::new(provider, "mock-model");
    let plan = planner.generate(&UserProfile::default()).await.unwrap();

    assert_eq!(plan.day_count(), 0);
    assert_eq!(plan.metadata.get_str("notes"), Some(PARSE_FAILED_NOTE));
    assert!(plan.metadata.get_str("generated_at").is_some());
}

#[tokio::test]
async fn test_reviser_with_no_issues_skips_model() {
    let provider = Arc::new(ScriptedProvider::default());
    let planner = ModelPlanner::new(provider.clone(), "mock-model");
    let plan = WorkoutPlan::default();

    let revised = planner
        .revise(&plan, &UserProfile::default(), &[])
        .await
        .unwrap();
    assert_eq!(revised, plan);
    assert!(provider.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_revision_flags_plan() {
    let provider = Arc::new(ScriptedProvider {
        reviser_reply: "no json".into(),
        ..Default::default()
    });
    let planner = ModelPlanner::new(provider, "mock-model");
    let plan = WorkoutPlan::default();

    let revised = planner
        .revise(&plan, &UserProfile::default(), &["Add a deload".to_string()])
        .await
        .unwrap();
    assert!(revised.metadata.flag("revision_failed"));
    assert_eq!(revised.days, plan.days);
}

#[tokio::test]
async fn test_revision_cannot_reset_pipeline_counters() {
    let mut reply = plan_json(&["Back Squat"], &["Bench Press"]);
    reply["metadata"] = json!({"revision_count": 0, "revision_failed": false, "notes": "tidied"});
    let provider = Arc::new(ScriptedProvider {
        reviser_reply: reply.to_string(),
        ..Default::default()
    });
    let planner = ModelPlanner::new(provider, "mock-model");

    let mut plan = WorkoutPlan::default();
    plan.metadata.set("revision_count", 5);
    plan.metadata.set("revision_failed", true);
    plan.metadata.set("notes", "generated");

    let revised = planner
        .revise(&plan, &UserProfile::default(), &["Add a deload".to_string()])
        .await
        .unwrap();
    assert_eq!(revised.metadata.get_u64("revision_count"), Some(6));
    assert!(revised.metadata.flag("revision_failed"));
    assert_eq!(revised.metadata.get_str("notes"), Some("generated | tidied"));
    assert_eq!(revised.day_count(), 2);
}
