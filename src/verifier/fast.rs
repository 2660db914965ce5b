// src/verifier/fast.rs — Deterministic plan checks (no model calls)
//
// Time budget, weekly movement balance and avoid-term screening. These
// never fail: unreadable rep strings fall back to a default estimate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::report::{AvoidanceReport, BalanceReport, FastReport, TimeFitReport};
use crate::edits::{Edit, ExerciseLoc};
use crate::oracle::ConstraintResolver;
use crate::plan::{UserProfile, WorkoutDay, WorkoutPlan};

/// A day may run this far over `minutes_per_day` before it fails.
pub const TIME_TOLERANCE: f64 = 1.15;
pub const DEFAULT_REST_SECONDS: u32 = 90;
const SECONDS_PER_REP: f64 = 3.0;
const OPEN_ENDED_REPS: f64 = 15.0;
const FALLBACK_REPS: f64 = 10.0;
/// Sets are only trimmed from exercises above this count.
const MIN_SETS_TO_TRIM: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    SquatLike,
    HingeLike,
    PushLike,
    PullLike,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 4] = [
        MovementPattern::SquatLike,
        MovementPattern::HingeLike,
        MovementPattern::PushLike,
        MovementPattern::PullLike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementPattern::SquatLike => "squat_like",
            MovementPattern::HingeLike => "hinge_like",
            MovementPattern::PushLike => "push_like",
            MovementPattern::PullLike => "pull_like",
        }
    }

    /// Substrings (lowercase) that mark an exercise name as this pattern.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            MovementPattern::SquatLike => &["squat", "lunge", "split squat", "leg press", "step up"],
            MovementPattern::HingeLike => {
                &["deadlift", "rdl", "good morning", "hip thrust", "glute bridge"]
            }
            MovementPattern::PushLike => &["press", "push", "dip", "fly"],
            MovementPattern::PullLike => &["pull", "row", "chin", "curl", "raise"],
        }
    }

    pub fn matches(&self, name_lower: &str) -> bool {
        self.keywords().iter().any(|kw| name_lower.contains(kw))
    }

    /// Parse a pattern name: "squat_like", "squat-like" or just "squat".
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace('-', "_");
        let key = key.strip_suffix("_like").unwrap_or(&key);
        match key {
            "squat" => Some(MovementPattern::SquatLike),
            "hinge" => Some(MovementPattern::HingeLike),
            "push" => Some(MovementPattern::PushLike),
            "pull" => Some(MovementPattern::PullLike),
            _ => None,
        }
    }

    /// Best-effort pattern from a day focus label like "Lower - hinge".
    pub fn from_focus(focus: &str) -> Option<Self> {
        let f = focus.to_lowercase();
        if f.contains("squat") {
            Some(MovementPattern::SquatLike)
        } else if f.contains("hinge") || f.contains("deadlift") {
            Some(MovementPattern::HingeLike)
        } else if f.contains("push") || f.contains("press") {
            Some(MovementPattern::PushLike)
        } else if f.contains("pull") || f.contains("row") {
            Some(MovementPattern::PullLike)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn embedded_integers(s: &str) -> Vec<f64> {
    s.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<f64>().ok())
        .collect()
}

/// Estimated minutes for one exercise: 3 s per rep plus rest between sets.
pub fn estimate_exercise_time(sets: u32, reps: &str, rest_seconds: Option<u32>) -> f64 {
    let rest = rest_seconds.unwrap_or(DEFAULT_REST_SECONDS) as f64;
    let lowered = reps.to_lowercase();
    let avg_reps = if lowered.contains("amrap") || lowered.contains("max") {
        OPEN_ENDED_REPS
    } else {
        let numbers = embedded_integers(reps);
        if numbers.is_empty() {
            FALLBACK_REPS
        } else {
            numbers.iter().sum::<f64>() / numbers.len() as f64
        }
    };
    let work = sets as f64 * avg_reps * SECONDS_PER_REP;
    let recovery = sets.saturating_sub(1) as f64 * rest;
    (work + recovery) / 60.0
}

pub fn estimate_day_minutes(day: &WorkoutDay) -> f64 {
    day.exercises()
        .map(|ex| estimate_exercise_time(ex.sets, &ex.reps, ex.rest_seconds))
        .sum()
}

fn over_budget(minutes: f64, limit: u32) -> bool {
    minutes > limit as f64 * TIME_TOLERANCE
}

pub fn check_time_fit(profile: &UserProfile, plan: &WorkoutPlan) -> TimeFitReport {
    let limit = profile.minutes_per_day;
    let per_day_minutes: Vec<f64> = plan.days.iter().map(|d| estimate_day_minutes(d)).collect();
    TimeFitReport {
        ok: !per_day_minutes.iter().any(|m| over_budget(*m, limit)),
        per_day_minutes,
        limit,
    }
}

/// Count the days on which each movement pattern appears at least once.
pub fn check_balance(plan: &WorkoutPlan) -> BalanceReport {
    let mut presence: BTreeMap<MovementPattern, u32> =
        MovementPattern::ALL.iter().map(|p| (*p, 0)).collect();

    for day in &plan.days {
        let mut seen = BTreeSet::new();
        for ex in day.exercises() {
            let name = ex.name.to_lowercase();
            seen.extend(MovementPattern::ALL.iter().filter(|p| p.matches(&name)));
        }
        for pattern in seen {
            *presence.entry(pattern).or_insert(0) += 1;
        }
    }

    BalanceReport {
        ok: presence.values().all(|count| *count >= 1),
        weekly_presence_days: presence,
    }
}

/// Flag exercises whose name contains an expanded avoid term. At most one
/// violation per exercise, naming the first matching term.
pub fn check_avoidance(
    profile: &UserProfile,
    plan: &WorkoutPlan,
    resolver: &dyn ConstraintResolver,
) -> AvoidanceReport {
    let expanded_terms = resolver.expand_terms(&profile.avoid_exercises);
    let needles: Vec<String> = expanded_terms.iter().map(|t| t.to_lowercase()).collect();

    let violations: Vec<String> = plan
        .indexed_exercises()
        .filter_map(|(_, ex)| {
            let name = ex.name.to_lowercase();
            needles
                .iter()
                .find(|term| name.contains(term.as_str()))
                .map(|term| format!("{} (contains '{}')", ex.name, term))
        })
        .collect();

    AvoidanceReport {
        ok: violations.is_empty(),
        violations,
        expanded_terms,
    }
}

pub fn fast_verify(
    profile: &UserProfile,
    plan: &WorkoutPlan,
    resolver: &dyn ConstraintResolver,
) -> FastReport {
    let time_fit = check_time_fit(profile, plan);
    let balance = check_balance(plan);
    let avoidance = check_avoidance(profile, plan, resolver);
    FastReport {
        ok: time_fit.ok && balance.ok && avoidance.ok,
        time_fit,
        balance,
        avoidance,
        skipped: false,
    }
}

/// Edits that can be derived from fast-check failures without judgment.
///
/// Over-budget days lose one set from their first exercise above three
/// sets. Avoidance hits and missing patterns become plan-level review notes.
pub fn mechanical_edits_from_fast_check(plan: &WorkoutPlan, report: &FastReport) -> Vec<Edit> {
    let mut edits = Vec::new();

    let time_fit = &report.time_fit;
    if !time_fit.ok {
        for (day_idx, minutes) in time_fit.per_day_minutes.iter().enumerate() {
            if !over_budget(*minutes, time_fit.limit) {
                continue;
            }
            let Some(day) = plan.days.get(day_idx) else {
                continue;
            };
            let target = day.blocks.iter().enumerate().find_map(|(block_idx, block)| {
                block
                    .exercises
                    .iter()
                    .position(|ex| ex.sets > MIN_SETS_TO_TRIM)
                    .map(|ex_idx| (block_idx, ex_idx, block.exercises[ex_idx].sets))
            });
            if let Some((block_idx, ex_idx, sets)) = target {
                edits.push(Edit::tune_sets(
                    ExerciseLoc::new(day_idx, block_idx, ex_idx),
                    sets - 1,
                    format!(
                        "Day {} exceeds time limit ({:.1}min > {}min)",
                        day_idx + 1,
                        minutes,
                        time_fit.limit
                    ),
                ));
            }
        }
    }

    if !report.avoidance.ok {
        for violation in &report.avoidance.violations {
            edits.push(Edit::plan_note(
                format!("Review: {violation}"),
                format!("Avoidance violation: {violation}"),
            ));
        }
    }

    if !report.balance.ok {
        for (pattern, count) in &report.balance.weekly_presence_days {
            if *count < 1 {
                edits.push(Edit::plan_note(
                    format!("Review: no {pattern} movement this week"),
                    format!("Balance: {pattern} missing"),
                ));
            }
        }
    }

    edits
}
