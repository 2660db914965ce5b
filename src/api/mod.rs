// src/api/mod.rs — HTTP API exposing the plan pipeline

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::core::orchestrator::Orchestrator;
use crate::infra::config::ApiConfig;
use crate::oracle::ExerciseCatalog;

/// Shared state for API handlers. Runs share the orchestrator; it keeps no
/// per-run state.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub catalog: Arc<ExerciseCatalog>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            catalog: Arc::new(ExerciseCatalog::empty()),
        }
    }

    /// Catalog served by the exercise search route.
    pub fn with_catalog(mut self, catalog: Arc<ExerciseCatalog>) -> Self {
        self.catalog = catalog;
        self
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            axum::http::HeaderValue::from_static("http://localhost:3000"),
            axum::http::HeaderValue::from_static("http://localhost:5173"),
            axum::http::HeaderValue::from_static("http://127.0.0.1:3000"),
            axum::http::HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/plan", post(handlers::create_plan))
        .route("/api/v1/verify", post(handlers::verify_plan))
        .route("/api/v1/edits", post(handlers::apply_edits))
        .route("/api/v1/profile", post(handlers::merge_profile))
        .route("/api/v1/exercises", get(handlers::search_exercises))
        .route("/api/v1/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given port (blocking).
pub async fn start_server(config: &ApiConfig, state: ApiState) -> anyhow::Result<()> {
    let port = config.port;
    let addr = format!("127.0.0.1:{port}");

    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down API server");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::Oracles;
    use crate::core::types::{OrchestrationConfig, PlanEnvelope};
    use crate::edits::SubstitutionSuggestion;
    use crate::infra::errors::LiftError;
    use crate::oracle::{
        GuidelineTable, PlanGenerator, PlanReviser, SemanticVerdict, SemanticVerifier,
        SubstitutionOracle,
    };
    use crate::plan::{UserProfile, WorkoutBlock, WorkoutDay, WorkoutExercise, WorkoutPlan};
    use crate::verifier::{ProgressionReport, VerificationReport};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Canned;

    fn full_body_day(name: &str) -> WorkoutDay {
        WorkoutDay::new(
            name,
            None,
            vec![WorkoutBlock::new(
                "Main",
                vec![
                    WorkoutExercise::new("Goblet Squat", 3, "10"),
                    WorkoutExercise::new("Romanian Deadlift", 3, "10"),
                    WorkoutExercise::new("Push Up", 3, "10"),
                    WorkoutExercise::new("Dumbbell Row", 3, "10"),
                ],
            )],
        )
    }

    #[async_trait]
    impl PlanGenerator for Canned {
        async fn generate(&self, profile: &UserProfile) -> Result<WorkoutPlan, LiftError> {
            Ok(WorkoutPlan::new(
                (0..profile.days_per_week)
                    .map(|i| full_body_day(&format!("Day {}", i + 1)))
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl PlanReviser for Canned {
        async fn revise(
            &self,
            plan: &WorkoutPlan,
            _profile: &UserProfile,
            _issues: &[String],
        ) -> Result<WorkoutPlan, LiftError> {
            Ok(plan.clone())
        }
    }

    #[async_trait]
    impl SemanticVerifier for Canned {
        async fn verify(
            &self,
            _profile: &UserProfile,
            _plan: &WorkoutPlan,
        ) -> Result<SemanticVerdict, LiftError> {
            Ok(SemanticVerdict {
                progression: ProgressionReport::passing("looks fine"),
                suggested_edits: vec![],
            })
        }
    }

    #[async_trait]
    impl SubstitutionOracle for Canned {
        async fn suggest(
            &self,
            _plan: &WorkoutPlan,
            _profile: &UserProfile,
        ) -> Result<Vec<SubstitutionSuggestion>, LiftError> {
            Ok(vec![])
        }
    }

    fn test_state() -> ApiState {
        let canned = Arc::new(Canned);
        let oracles = Oracles {
            generator: canned.clone(),
            reviser: canned.clone(),
            semantic: canned.clone(),
            substitution: canned,
            resolver: Arc::new(GuidelineTable::empty()),
        };
        let catalog = ExerciseCatalog::from_json(
            r#"[
                {"name": "Barbell Back Squat", "equipment": "barbell", "primaryMuscles": ["quadriceps"]},
                {"name": "Romanian Deadlift", "equipment": "barbell", "primaryMuscles": ["hamstrings"]},
                {"name": "Goblet Squat", "equipment": "kettlebells", "primaryMuscles": ["quadriceps"]},
                {"name": "Push Up", "equipment": "body only", "primaryMuscles": ["chest"]}
            ]"#,
        )
        .unwrap();
        ApiState::new(Orchestrator::new(oracles, OrchestrationConfig::default()))
            .with_catalog(Arc::new(catalog))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_plan_endpoint_returns_envelope() {
        let app = build_router(test_state());
        let req = post_json(
            "/api/v1/plan",
            serde_json::json!({"days_per_week": 3, "minutes_per_day": 45}),
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let envelope: PlanEnvelope = body_json(resp).await;
        assert!(envelope.verification.ok);
        assert_eq!(envelope.iterations, 1);
        assert_eq!(envelope.plan.day_count(), 3);
        assert_eq!(envelope.assumptions.minutes_per_day, 45);
    }

    #[tokio::test]
    async fn test_plan_endpoint_rejects_zero_days() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/v1/plan", serde_json::json!({"days_per_week": 0})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: types::ErrorResponse = body_json(resp).await;
        assert!(body.error.contains("days_per_week"));
    }

    #[tokio::test]
    async fn test_verify_endpoint_fast_failure() {
        let app = build_router(test_state());
        let plan = serde_json::json!({
            "days": [{"name": "Push", "blocks": [{"name": "Main", "exercises": [
                {"name": "Bench Press", "sets": 3, "reps": "5"}
            ]}]}]
        });
        let resp = app
            .oneshot(post_json("/api/v1/verify", serde_json::json!({"plan": plan})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let report: VerificationReport = body_json(resp).await;
        assert!(!report.ok);
        assert!(report.fast_check_failed);
        assert!(!report.balance.ok);
    }

    #[tokio::test]
    async fn test_verify_endpoint_rejects_non_object_plan() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/v1/verify", serde_json::json!({"plan": [1, 2]})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_edits_endpoint_records_failure() {
        let app = build_router(test_state());
        let body = serde_json::json!({
            "plan": {"days": [{"name": "A", "blocks": [{"name": "Main", "exercises": [
                {"name": "Back Squat", "sets": 5, "reps": "5"}
            ]}]}]},
            "edits": [
                {"type": "tune_sets", "loc": {"day_idx": 0, "block_idx": 0, "ex_idx": 0}, "payload": {"sets": 3}},
                {"type": "tune_sets", "loc": {"day_idx": 4, "block_idx": 0, "ex_idx": 0}, "payload": {"sets": 3}}
            ]
        });
        let resp = app.oneshot(post_json("/api/v1/edits", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let plan: WorkoutPlan = body_json(resp).await;
        assert_eq!(plan.exercise(0, 0, 0).unwrap().sets, 3);
        assert_eq!(plan.metadata.get_u64("edits_applied"), Some(1));
        assert!(plan.metadata.get_str("edit_error").is_some());
    }

    #[tokio::test]
    async fn test_profile_endpoint_lists_questions() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json(
                "/api/v1/profile",
                serde_json::json!({"days_per_week": 5, "equipment_available": ["barbell"]}),
            ))
            .await
            .unwrap();
        let body: types::ProfileResponse = body_json(resp).await;
        assert_eq!(body.profile.days_per_week, 5);
        assert_eq!(body.followup_questions.len(), 2);
    }

    #[tokio::test]
    async fn test_exercise_search_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/exercises?q=squat&pattern=squat_like&k=1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: types::ExerciseSearchResponse = body_json(resp).await;
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].name, "Barbell Back Squat");
    }

    #[tokio::test]
    async fn test_exercise_search_rejects_unknown_pattern() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/exercises?q=squat&pattern=carry")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
