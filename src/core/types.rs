// src/core/types.rs — Refinement loop domain types

use serde::{Deserialize, Serialize};

use crate::edits::SubstitutionSuggestion;
use crate::plan::{UserProfile, WorkoutPlan};
use crate::verifier::report::VerificationReport;

pub const DEFAULT_MAX_REVISIONS: u32 = 2;

/// Loop settings fixed for the lifetime of one orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Revision passes after the first; total passes = max_revisions + 1.
    pub max_revisions: u32,
    /// Try a local plan template before asking the generator.
    #[serde(default)]
    pub template_bootstrap: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_revisions: DEFAULT_MAX_REVISIONS,
            template_bootstrap: false,
        }
    }
}

/// Why the loop ended without a passing plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Stagnation,
    Regression,
    MaxIterations,
    NoEditsSuggested,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Stagnation => "stagnation",
            StopReason::Regression => "regression",
            StopReason::MaxIterations => "max_iterations",
            StopReason::NoEditsSuggested => "no_edits_suggested",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationLogEntry {
    pub iteration: u32,
    pub ok: bool,
    pub issue_count: usize,
    /// Fingerprint tokens for the pass, sorted.
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub days: u32,
    pub minutes_per_day: u32,
    pub goal: String,
}

impl From<&UserProfile> for Assumptions {
    fn from(profile: &UserProfile) -> Self {
        Self {
            days: profile.days_per_week,
            minutes_per_day: profile.minutes_per_day,
            goal: profile.goal.clone(),
        }
    }
}

/// Result of one orchestration run. Same shape for library, CLI and HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEnvelope {
    pub profile: UserProfile,
    pub plan: WorkoutPlan,
    pub verification: VerificationReport,
    pub substitution_suggestions: Vec<SubstitutionSuggestion>,
    pub iterations: usize,
    pub iterations_log: Vec<IterationLogEntry>,
    pub assumptions: Assumptions,
}

impl PlanEnvelope {
    pub fn stopped_reason(&self) -> Option<StopReason> {
        self.verification.stopped_reason
    }
}

/// Lifecycle events emitted by the orchestrator for live feedback.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    TemplateSelected {
        title: String,
    },
    PlanGenerated {
        days: usize,
        exercises: usize,
    },
    SubstitutionsApplied {
        count: usize,
    },
    PassStart {
        iteration: u32,
        max_revisions: u32,
        fast_checks_skipped: bool,
    },
    PassEnd {
        iteration: u32,
        ok: bool,
        issue_count: usize,
    },
    EditsApplied {
        iteration: u32,
        count: usize,
    },
    RevisionRequested {
        iteration: u32,
        issues: usize,
    },
    Stopped {
        iteration: u32,
        reason: StopReason,
    },
    Complete {
        iterations: usize,
        ok: bool,
    },
}
