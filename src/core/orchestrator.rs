// src/core/orchestrator.rs — Generate, substitute, then verify and revise until convergence

use std::sync::Arc;

use tracing::Instrument;

use super::types::*;
use crate::edits::{apply_edits, apply_substitutions, split_edits, Edit, EditKind, SubstitutionSuggestion};
use crate::infra::config::Config;
use crate::infra::errors::LiftError;
use crate::infra::paths;
use crate::oracle::{
    ConstraintResolver, ExerciseCatalog, GuidelineTable, ModelPlanner, ModelSubstituter,
    PlanGenerator, PlanReviser, SemanticVerifier, SubstitutionOracle, TemplateLibrary,
};
use crate::plan::{UserProfile, WorkoutPlan};
use crate::provider::resolver::build_provider;
use crate::verifier::{
    FastReport, IssueFingerprint, ProgressionReport, VerificationReport, Verifier,
};

/// The collaborators one run depends on.
#[derive(Clone)]
pub struct Oracles {
    pub generator: Arc<dyn PlanGenerator>,
    pub reviser: Arc<dyn PlanReviser>,
    pub semantic: Arc<dyn SemanticVerifier>,
    pub substitution: Arc<dyn SubstitutionOracle>,
    pub resolver: Arc<dyn ConstraintResolver>,
}

impl Oracles {
    /// Wire the model-backed collaborators described by `config`. Data files
    /// that are absent load as empty tables.
    pub fn from_config(config: &Config) -> Result<Self, LiftError> {
        let provider = build_provider(&config.model)?;
        let guidelines = Arc::new(GuidelineTable::load_or_empty(&paths::resolve_data_file(
            &config.data.guidelines,
        ))?);
        let catalog = Arc::new(ExerciseCatalog::load_or_empty(&paths::resolve_data_file(
            &config.data.exercises,
        ))?);

        let planner = Arc::new(
            ModelPlanner::from_config(provider.clone(), &config.model)
                .with_resolver(guidelines.clone()),
        );
        let substitution = Arc::new(ModelSubstituter::new(
            provider,
            config.model.model.clone(),
            catalog,
        ));

        Ok(Self {
            generator: planner.clone(),
            reviser: planner.clone(),
            semantic: planner,
            substitution,
            resolver: guidelines,
        })
    }
}

pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Drives one plan from generation to a passing (or terminal) verification.
///
/// Runs are independent: the orchestrator holds no per-run state, so one
/// instance can serve concurrent requests.
pub struct Orchestrator {
    generator: Arc<dyn PlanGenerator>,
    reviser: Arc<dyn PlanReviser>,
    substitution: Arc<dyn SubstitutionOracle>,
    verifier: Verifier,
    templates: Option<Arc<TemplateLibrary>>,
    config: OrchestrationConfig,
    on_progress: Option<ProgressCallback>,
}

/// Outcome of the verify/revise loop over an already generated plan.
struct Refinement {
    plan: WorkoutPlan,
    verification: VerificationReport,
    log: Vec<IterationLogEntry>,
}

impl Orchestrator {
    pub fn new(oracles: Oracles, config: OrchestrationConfig) -> Self {
        Self {
            generator: oracles.generator,
            reviser: oracles.reviser,
            substitution: oracles.substitution,
            verifier: Verifier::new(oracles.semantic, oracles.resolver),
            templates: None,
            config,
            on_progress: None,
        }
    }

    /// Model-backed orchestrator for `config`. The template library is loaded
    /// only when bootstrapping is enabled.
    pub fn from_config(
        config: &Config,
        orchestration: OrchestrationConfig,
    ) -> Result<Self, LiftError> {
        let mut orchestrator = Self::new(Oracles::from_config(config)?, orchestration);
        if orchestration.template_bootstrap {
            let templates =
                TemplateLibrary::load_or_empty(&paths::resolve_data_file(&config.data.templates))?;
            orchestrator = orchestrator.with_templates(Arc::new(templates));
        }
        Ok(orchestrator)
    }

    /// Templates consulted before the generator when `template_bootstrap` is set.
    pub fn with_templates(mut self, templates: Arc<TemplateLibrary>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run the full pipeline for `profile`. Never fails: every collaborator
    /// error degrades to a documented default and non-convergence is reported
    /// through `verification.stopped_reason`.
    pub async fn run(&self, profile: &UserProfile) -> PlanEnvelope {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("orchestrate", run_id = %run_id);
        self.run_inner(profile).instrument(span).await
    }

    async fn run_inner(&self, profile: &UserProfile) -> PlanEnvelope {
        tracing::info!(
            days = profile.days_per_week,
            minutes = profile.minutes_per_day,
            max_revisions = self.config.max_revisions,
            "starting run"
        );

        let plan = match self.bootstrap_plan(profile) {
            Some(plan) => plan,
            None => match self.generator.generate(profile).await {
                Ok(plan) => plan,
                Err(e) => {
                    tracing::warn!("plan generation failed: {e}");
                    WorkoutPlan::empty_with_note(&format!("Plan generation failed: {e}"))
                }
            },
        };
        self.emit(ProgressEvent::PlanGenerated {
            days: plan.day_count(),
            exercises: plan.exercise_count(),
        });

        let suggestions = self.substitution_suggestions(&plan, profile).await;
        let plan = apply_substitutions(&plan, &suggestions);
        self.emit(ProgressEvent::SubstitutionsApplied {
            count: suggestions.len(),
        });

        let outcome = self.refine(profile, plan).await;

        let envelope = PlanEnvelope {
            profile: profile.clone(),
            plan: outcome.plan,
            verification: outcome.verification,
            substitution_suggestions: suggestions,
            iterations: outcome.log.len(),
            iterations_log: outcome.log,
            assumptions: Assumptions::from(profile),
        };

        tracing::info!(
            ok = envelope.verification.ok,
            iterations = envelope.iterations,
            stopped_reason = ?envelope.verification.stopped_reason,
            "run complete"
        );
        self.emit(ProgressEvent::Complete {
            iterations: envelope.iterations,
            ok: envelope.verification.ok,
        });
        envelope
    }

    /// A plan mapped from the best matching template, if bootstrapping is on
    /// and a template yields at least one day.
    fn bootstrap_plan(&self, profile: &UserProfile) -> Option<WorkoutPlan> {
        if !self.config.template_bootstrap {
            return None;
        }
        let template = self.templates.as_ref()?.best_for(profile)?;
        let plan = template.to_plan(profile);
        if plan.day_count() == 0 {
            tracing::debug!(title = %template.title, "template has no training days, generating instead");
            return None;
        }
        tracing::info!(title = %template.title, days = plan.day_count(), "bootstrapped plan from template");
        self.emit(ProgressEvent::TemplateSelected {
            title: template.title.clone(),
        });
        Some(plan)
    }

    /// Substitution suggestions with one retry, then none.
    async fn substitution_suggestions(
        &self,
        plan: &WorkoutPlan,
        profile: &UserProfile,
    ) -> Vec<SubstitutionSuggestion> {
        match self.substitution.suggest(plan, profile).await {
            Ok(suggestions) => suggestions,
            Err(first) => {
                tracing::debug!("substitution failed, retrying once: {first}");
                match self.substitution.suggest(plan, profile).await {
                    Ok(suggestions) => suggestions,
                    Err(e) => {
                        tracing::warn!("substitution unavailable: {e}");
                        Vec::new()
                    }
                }
            }
        }
    }

    async fn refine(&self, profile: &UserProfile, mut plan: WorkoutPlan) -> Refinement {
        let max_revisions = self.config.max_revisions;
        let mut history: Vec<IssueFingerprint> = Vec::new();
        let mut log: Vec<IterationLogEntry> = Vec::new();
        let mut last_report: Option<VerificationReport> = None;

        for iteration in 0..=max_revisions {
            let semantic_only = iteration > 0 && history.last().is_some_and(IssueFingerprint::is_empty);
            self.emit(ProgressEvent::PassStart {
                iteration,
                max_revisions,
                fast_checks_skipped: semantic_only,
            });

            let mut report = self.verifier.verify_plan(profile, &plan, semantic_only).await;
            let fingerprint = IssueFingerprint::from_report(&report);

            log.push(IterationLogEntry {
                iteration,
                ok: report.ok,
                issue_count: fingerprint.len(),
                issues: fingerprint.to_vec(),
            });
            tracing::info!(
                iteration,
                ok = report.ok,
                issues = fingerprint.len(),
                edits = report.suggested_edits.len(),
                semantic_only,
                "pass complete"
            );
            self.emit(ProgressEvent::PassEnd {
                iteration,
                ok: report.ok,
                issue_count: fingerprint.len(),
            });

            if report.ok {
                last_report = Some(report);
                break;
            }

            let stop = convergence_stop(iteration, &fingerprint, &history)
                .or_else(|| (iteration == max_revisions).then_some(StopReason::MaxIterations))
                .or_else(|| {
                    report
                        .suggested_edits
                        .is_empty()
                        .then_some(StopReason::NoEditsSuggested)
                });
            history.push(fingerprint);

            if let Some(reason) = stop {
                tracing::info!(iteration, %reason, "stopping without a passing plan");
                self.emit(ProgressEvent::Stopped { iteration, reason });
                report.stopped_reason = Some(reason);
                last_report = Some(report);
                break;
            }

            let (mechanical, semantic) = split_edits(&report.suggested_edits);
            if !mechanical.is_empty() {
                plan = apply_edits(&plan, &mechanical);
                self.emit(ProgressEvent::EditsApplied {
                    iteration,
                    count: mechanical.len(),
                });
            }

            let issues = revision_issues(&semantic, &report.progression);
            if !issues.is_empty() {
                self.emit(ProgressEvent::RevisionRequested {
                    iteration,
                    issues: issues.len(),
                });
                plan = match self.reviser.revise(&plan, profile, &issues).await {
                    Ok(revised) => revised,
                    Err(e) => {
                        tracing::warn!(iteration, "revision failed: {e}");
                        let mut kept = plan;
                        kept.metadata.set("revision_failed", true);
                        kept
                    }
                };
            }

            last_report = Some(report);
        }

        let verification = last_report.unwrap_or_else(|| {
            VerificationReport::from_parts(
                FastReport::skipped(profile.minutes_per_day),
                ProgressionReport::passing(""),
                Vec::new(),
            )
        });

        Refinement {
            plan,
            verification,
            log,
        }
    }
}

/// Stagnation against the previous pass, regression against the first.
/// Neither applies on the first pass.
fn convergence_stop(
    iteration: u32,
    current: &IssueFingerprint,
    history: &[IssueFingerprint],
) -> Option<StopReason> {
    if iteration == 0 {
        return None;
    }
    if history.last().is_some_and(|prev| current.is_stagnant(prev)) {
        return Some(StopReason::Stagnation);
    }
    if history.first().is_some_and(|first| current.regressed_from(first)) {
        return Some(StopReason::Regression);
    }
    None
}

/// Flat issue list for the reviser: semantic edit reasons, then progression issues.
pub fn revision_issues(semantic: &[Edit], progression: &ProgressionReport) -> Vec<String> {
    let mut issues: Vec<String> = semantic.iter().map(render_semantic_edit).collect();
    issues.extend(
        progression
            .issues
            .iter()
            .filter(|i| !i.trim().is_empty())
            .cloned(),
    );
    issues
}

fn render_semantic_edit(edit: &Edit) -> String {
    let reason = edit.reason.trim();
    let base = if reason.is_empty() {
        format!("{} suggested", edit.type_name())
    } else {
        reason.to_string()
    };
    match &edit.kind {
        EditKind::ReorderDays { order: Some(order) } => {
            let order: Vec<String> = order.iter().map(|i| (i + 1).to_string()).collect();
            format!("{base} (reorder days as: {})", order.join(", "))
        }
        _ => base,
    }
}
