// src/cli/progress.rs — Terminal progress renderer for real-time run feedback

use crate::core::types::ProgressEvent;

/// One progress line for `event`.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::TemplateSelected { title } => format!("[plan] from template: {}", title),
        ProgressEvent::PlanGenerated { days, exercises } => {
            format!("[plan] {} day(s), {} exercise(s)", days, exercises)
        }
        ProgressEvent::SubstitutionsApplied { count } => {
            format!("[subs] {} substitution(s) suggested", count)
        }
        ProgressEvent::PassStart {
            iteration,
            max_revisions,
            fast_checks_skipped,
        } => {
            let mode = if *fast_checks_skipped {
                "semantic only"
            } else {
                "verifying"
            };
            format!("[pass {}/{}] {}...", iteration, max_revisions, mode)
        }
        ProgressEvent::PassEnd {
            iteration,
            ok,
            issue_count,
        } => format!(
            "[pass {}] {} issues={}",
            iteration,
            if *ok { "ok" } else { "failed" },
            issue_count,
        ),
        ProgressEvent::EditsApplied { iteration, count } => {
            format!("[pass {}]   applied {} edit(s)", iteration, count)
        }
        ProgressEvent::RevisionRequested { iteration, issues } => {
            format!("[pass {}]   revising for {} issue(s)", iteration, issues)
        }
        ProgressEvent::Stopped { iteration, reason } => {
            format!("[pass {}] stopped: {}", iteration, reason)
        }
        ProgressEvent::Complete { iterations, ok } => format!(
            "[done] {} iterations={}",
            if *ok { "verified" } else { "unverified" },
            iterations,
        ),
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for the
/// envelope JSON. Returns a closure suitable for `Orchestrator::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}
