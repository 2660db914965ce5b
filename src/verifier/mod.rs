// src/verifier/mod.rs — Two-phase plan verification
//
// Fast deterministic checks run first. Only a plan that passes them (or
// whose fast phase is skipped) is sent to the semantic verifier.

pub mod fast;
pub mod fingerprint;
pub mod report;

use std::sync::Arc;

use crate::oracle::{ConstraintResolver, SemanticVerifier};
use crate::plan::{UserProfile, WorkoutPlan};

pub use fast::{fast_verify, mechanical_edits_from_fast_check, MovementPattern};
pub use fingerprint::IssueFingerprint;
pub use report::{FastReport, ProgressionReport, VerificationReport};

pub const FAST_FAILED_NOTE: &str = "Fast checks failed, skipped semantic validation";

pub struct Verifier {
    semantic: Arc<dyn SemanticVerifier>,
    resolver: Arc<dyn ConstraintResolver>,
}

impl Verifier {
    pub fn new(semantic: Arc<dyn SemanticVerifier>, resolver: Arc<dyn ConstraintResolver>) -> Self {
        Self { semantic, resolver }
    }

    /// Fast checks, then the semantic verifier. `semantic_only` substitutes a
    /// passing fast report. Semantic failures fail open with a diagnostic note.
    pub async fn verify_plan(
        &self,
        profile: &UserProfile,
        plan: &WorkoutPlan,
        semantic_only: bool,
    ) -> VerificationReport {
        let (fast, mechanical) = if semantic_only {
            (FastReport::skipped(profile.minutes_per_day), Vec::new())
        } else {
            let fast = fast_verify(profile, plan, self.resolver.as_ref());
            let mechanical = mechanical_edits_from_fast_check(plan, &fast);
            (fast, mechanical)
        };

        if !fast.ok {
            tracing::debug!(
                time_ok = fast.time_fit.ok,
                balance_ok = fast.balance.ok,
                avoidance_ok = fast.avoidance.ok,
                edits = mechanical.len(),
                "fast checks failed"
            );
            return VerificationReport::from_parts(
                fast,
                ProgressionReport::passing(FAST_FAILED_NOTE),
                mechanical,
            );
        }

        match self.semantic.verify(profile, plan).await {
            Ok(verdict) => {
                let mut edits = mechanical;
                edits.extend(verdict.suggested_edits);
                VerificationReport::from_parts(fast, verdict.progression, edits)
            }
            Err(e) => {
                tracing::warn!("semantic verification failed: {e}");
                VerificationReport::from_parts(
                    fast,
                    ProgressionReport::passing(format!("Semantic check failed: {e}")),
                    mechanical,
                )
            }
        }
    }
}
