// src/api/handlers.rs

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::{types::*, ApiState};
use crate::cli::exercises::search_catalog;
use crate::core::types::PlanEnvelope;
use crate::edits::apply_raw_edits;
use crate::plan::parser::coerce_plan;
use crate::plan::{followup_questions, ProfilePatch, UserProfile, WorkoutPlan};
use crate::verifier::VerificationReport;

type ApiError = (StatusCode, Json<ErrorResponse>);

const MAX_SEARCH_RESULTS: usize = 50;

fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn profile_from(patch: &ProfilePatch) -> Result<UserProfile, ApiError> {
    patch.resolve().map_err(|e| bad_request(e.to_string()))
}

fn plan_from(value: &serde_json::Value) -> Result<WorkoutPlan, ApiError> {
    coerce_plan(value).map_err(|e| bad_request(format!("Invalid plan: {e}")))
}

/// POST /api/v1/plan — Generate and refine a plan. Same envelope as the CLI.
pub async fn create_plan(
    State(state): State<ApiState>,
    Json(body): Json<ProfilePatch>,
) -> Result<Json<PlanEnvelope>, ApiError> {
    let profile = profile_from(&body)?;
    let envelope = state.orchestrator.run(&profile).await;
    Ok(Json(envelope))
}

/// POST /api/v1/verify — Verify an existing plan against a profile.
pub async fn verify_plan(
    State(state): State<ApiState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerificationReport>, ApiError> {
    let profile = profile_from(&body.profile)?;
    let plan = plan_from(&body.plan)?;
    let report = state
        .orchestrator
        .verifier()
        .verify_plan(&profile, &plan, body.semantic_only)
        .await;
    Ok(Json(report))
}

/// POST /api/v1/edits — Apply wire-format edits in order.
pub async fn apply_edits(Json(body): Json<EditRequest>) -> Result<Json<WorkoutPlan>, ApiError> {
    let plan = plan_from(&body.plan)?;
    Ok(Json(apply_raw_edits(&plan, &body.edits)))
}

/// POST /api/v1/profile — Merge a partial profile and list follow-up questions.
pub async fn merge_profile(Json(body): Json<ProfilePatch>) -> Json<ProfileResponse> {
    let profile = body.merge_into(&UserProfile::default());
    let followup_questions = followup_questions(&profile, &body);
    Json(ProfileResponse {
        profile,
        followup_questions,
    })
}

/// GET /api/v1/exercises — Search the local exercise catalog.
pub async fn search_exercises(
    State(state): State<ApiState>,
    Query(query): Query<ExerciseQuery>,
) -> Result<Json<ExerciseSearchResponse>, ApiError> {
    let k = query.k.clamp(1, MAX_SEARCH_RESULTS);
    let results = search_catalog(&state.catalog, &query.q, query.pattern.as_deref(), k)
        .map_err(|e| bad_request(e.to_string()))?;
    Ok(Json(ExerciseSearchResponse { results }))
}

/// GET /api/v1/health — Simple health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
